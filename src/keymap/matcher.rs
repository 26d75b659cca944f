//! Record matching against (action pattern, trigger pattern) queries
//!
//! Action patterns have two granularities: wildcard patterns select whole
//! families of bindings, exact patterns with parameters select one binding.
//! Trigger patterns compare every structural field; a record without a
//! chord key accepts any queried chord key.

use super::action::{ActionPattern, ActionRef};
use super::binding::BindingRecord;
use super::types::Trigger;

/// Does `action` satisfy `pattern`?
///
/// In a modal context the action id is the modal property value and
/// parameters never take part in the comparison.
pub fn action_matches(action: &ActionRef, pattern: &ActionPattern, is_modal: bool) -> bool {
    match pattern {
        ActionPattern::Any => true,
        ActionPattern::Contains(fragment) => action.id.contains(fragment.as_str()),
        ActionPattern::Exact(expected) => {
            if action.id != expected.id {
                return false;
            }
            if is_modal {
                return true;
            }
            match expected.params {
                None => true,
                Some(ref wanted) => params_equal(action, wanted),
            }
        }
    }
}

fn params_equal(action: &ActionRef, wanted: &super::action::Params) -> bool {
    if wanted.is_empty() && !action.has_params() {
        return true;
    }
    let Some(ref actual) = action.params else {
        return false;
    };
    actual.len() == wanted.len()
        && wanted.iter().all(|(name, value)| {
            actual
                .get(name)
                .is_some_and(|current| current.loosely_eq(value))
        })
}

/// Does the record's trigger satisfy the trigger pattern?
///
/// Repeat is not part of the comparison.
pub fn trigger_matches(record: &Trigger, pattern: &Trigger) -> bool {
    record.key == pattern.key
        && record.modifiers == pattern.modifiers
        && (record.key_modifier.is_none() || record.key_modifier == pattern.key_modifier)
        && record.value == pattern.value
}

/// Full query: action pattern plus optional trigger pattern
pub fn record_matches(
    record: &BindingRecord,
    action: &ActionPattern,
    trigger: Option<&Trigger>,
    is_modal: bool,
) -> bool {
    action_matches(&record.action, action, is_modal)
        && trigger.map_or(true, |t| trigger_matches(&record.trigger, t))
}
