//! BindingRecord: one row in a keyconfig context

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::action::ActionRef;
use super::types::Trigger;

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity assigned when a record is created
///
/// Unique for the lifetime of the process; clones of a record made by
/// table cloning receive a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    pub fn next() -> Self {
        BindingId(NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single binding of a trigger to an action
#[derive(Debug, Clone, PartialEq)]
pub struct BindingRecord {
    pub id: BindingId,
    pub action: ActionRef,
    pub trigger: Trigger,
    /// Inactive records are kept until pruned but never fire
    pub active: bool,
}

impl BindingRecord {
    /// Create a new active record with a fresh identity
    pub fn new(action: ActionRef, trigger: Trigger) -> Self {
        Self {
            id: BindingId::next(),
            action: action.normalized(),
            trigger,
            active: true,
        }
    }

    /// Create an inactive record (builder pattern)
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Copy this record's values under a fresh identity
    pub fn clone_fresh(&self) -> Self {
        Self {
            id: BindingId::next(),
            action: self.action.clone(),
            trigger: self.trigger.clone(),
            active: self.active,
        }
    }

    /// Same (action, trigger, active) values, ignoring identity
    pub fn same_values(&self, other: &BindingRecord) -> bool {
        self.action == other.action && self.trigger == other.trigger && self.active == other.active
    }
}

impl fmt::Display for BindingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.trigger, self.action)?;
        if !self.active {
            write!(f, " (inactive)")?;
        }
        Ok(())
    }
}
