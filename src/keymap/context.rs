//! Named input contexts ("keymaps") and their ordered binding lists

use super::action::{ActionPattern, ActionRef};
use super::binding::{BindingId, BindingRecord};
use super::matcher::record_matches;
use super::types::Trigger;

/// Host context names that are bound to a specific editor space
const CONTEXT_SPACES: &[(&str, &str)] = &[
    ("3D View", "VIEW_3D"),
    ("Image", "IMAGE_EDITOR"),
    ("Node Editor", "NODE_EDITOR"),
    ("SequencerCommon", "SEQUENCE_EDITOR"),
    ("Clip", "CLIP_EDITOR"),
    ("Dopesheet", "DOPESHEET_EDITOR"),
    ("Graph Editor", "GRAPH_EDITOR"),
    ("NLA Editor", "NLA_EDITOR"),
    ("Text", "TEXT_EDITOR"),
    ("Console", "CONSOLE"),
    ("Info", "INFO"),
    ("Outliner", "OUTLINER"),
    ("File Browser", "FILE_BROWSER"),
];

/// Space category for a context name; unknown names are global (`EMPTY`)
pub fn space_type_for(name: &str) -> &'static str {
    CONTEXT_SPACES
        .iter()
        .find(|(context, _)| *context == name)
        .map_or("EMPTY", |(_, space)| space)
}

/// A named input scope holding its own binding list
///
/// Records are kept in insertion order; the first match wins.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyContext {
    pub name: String,
    pub space_type: String,
    pub region_type: String,
    /// Modal contexts bind triggers to modal property values, not commands
    pub is_modal: bool,
    pub items: Vec<BindingRecord>,
}

impl KeyContext {
    /// Create an empty context bound to the space its name implies
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let space_type = space_type_for(&name).to_string();
        Self {
            name,
            space_type,
            region_type: "WINDOW".to_string(),
            is_modal: false,
            items: Vec::new(),
        }
    }

    /// Mark this context as modal (builder pattern)
    pub fn modal(mut self) -> Self {
        self.is_modal = true;
        self
    }

    /// Append a new active record and return its identity
    pub fn insert(&mut self, action: ActionRef, trigger: Trigger) -> BindingId {
        let record = BindingRecord::new(action, trigger);
        let id = record.id;
        self.items.push(record);
        id
    }

    /// Append an existing record as-is
    pub fn push(&mut self, record: BindingRecord) {
        self.items.push(record);
    }

    pub fn find_first(&self, action: &ActionPattern, trigger: Option<&Trigger>) -> Option<&BindingRecord> {
        self.items
            .iter()
            .find(|r| record_matches(r, action, trigger, self.is_modal))
    }

    /// First active record matching; replace and edit targets never
    /// resolve to a binding that is already switched off
    pub fn find_active_mut(
        &mut self,
        action: &ActionPattern,
        trigger: Option<&Trigger>,
    ) -> Option<&mut BindingRecord> {
        let is_modal = self.is_modal;
        self.items
            .iter_mut()
            .find(|r| r.active && record_matches(r, action, trigger, is_modal))
    }

    pub fn get(&self, id: BindingId) -> Option<&BindingRecord> {
        self.items.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: BindingId) -> Option<&mut BindingRecord> {
        self.items.iter_mut().find(|r| r.id == id)
    }

    /// Set a record's active flag; false if the id is not in this context
    pub fn set_active(&mut self, id: BindingId, active: bool) -> bool {
        match self.get_mut(id) {
            Some(record) => {
                record.active = active;
                true
            }
            None => false,
        }
    }

    /// Deactivate every matching record, returning how many changed
    pub fn disable_matching(&mut self, action: &ActionPattern, trigger: Option<&Trigger>) -> usize {
        let is_modal = self.is_modal;
        let mut count = 0;
        for record in &mut self.items {
            if record.active && record_matches(record, action, trigger, is_modal) {
                record.active = false;
                count += 1;
            }
        }
        count
    }

    pub fn remove(&mut self, id: BindingId) -> Option<BindingRecord> {
        let index = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(index))
    }

    /// Physically remove inactive records
    pub fn prune_inactive(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|r| r.active);
        before - self.items.len()
    }

    /// Deactivate every active record, returning their identities so the
    /// caller can re-enable exactly these later
    pub fn disable_active_items(&mut self) -> Vec<BindingId> {
        self.items
            .iter_mut()
            .filter(|r| r.active)
            .map(|r| {
                r.active = false;
                r.id
            })
            .collect()
    }

    /// Re-enable records by identity and clear the list
    ///
    /// Ids no longer present (pruned or removed) are skipped.
    pub fn enable_items(&mut self, ids: &mut Vec<BindingId>) -> usize {
        let count = ids.iter().filter(|&&id| self.set_active(id, true)).count();
        ids.clear();
        count
    }

    /// Remove every active record
    pub fn remove_active_items(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|r| !r.active);
        before - self.items.len()
    }

    /// Reset this context's records to a copy of `factory` (fresh identities)
    pub fn restore(&mut self, factory: &KeyContext) {
        self.items = factory.items.iter().map(BindingRecord::clone_fresh).collect();
    }

    /// Copy of this context with fresh identities for every record
    pub fn clone_fresh(&self) -> KeyContext {
        KeyContext {
            name: self.name.clone(),
            space_type: self.space_type.clone(),
            region_type: self.region_type.clone(),
            is_modal: self.is_modal,
            items: self.items.iter().map(BindingRecord::clone_fresh).collect(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.items.iter().filter(|r| r.active).count()
    }
}
