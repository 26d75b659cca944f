//! KeyconfigStore: every keyconfig table known to the process

use std::fmt;

use super::keyconfig::{Keyconfig, KeyconfigKind};

pub const USER_KEYCONFIG_NAME: &str = "Blender user";
pub const ADDON_KEYCONFIG_NAME: &str = "Blender addon";

/// Address of a table in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRef {
    Default,
    User,
    Addon,
    /// A build table by name
    Named(String),
    /// Whichever build table is currently active
    Active,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRef::Default => f.write_str("default"),
            TableRef::User => f.write_str("user"),
            TableRef::Addon => f.write_str("addon"),
            TableRef::Named(name) => write!(f, "'{}'", name),
            TableRef::Active => f.write_str("active"),
        }
    }
}

/// Holds the default table (plus its factory snapshot), the live user
/// table, the add-on overlay and any number of named build tables
#[derive(Debug, Clone)]
pub struct KeyconfigStore {
    default: Keyconfig,
    factory: Keyconfig,
    user: Keyconfig,
    addon: Keyconfig,
    builds: Vec<Keyconfig>,
    active: Option<String>,
}

impl KeyconfigStore {
    /// Seed the store from a base snapshot; the user table starts as a copy
    pub fn from_default(default: Keyconfig) -> Self {
        let mut default = default;
        default.kind = KeyconfigKind::Default;

        let mut user = Keyconfig::new(USER_KEYCONFIG_NAME, KeyconfigKind::User);
        user.clone_contexts_from(&default);

        Self {
            factory: default.clone(),
            default,
            user,
            addon: Keyconfig::new(ADDON_KEYCONFIG_NAME, KeyconfigKind::Addon),
            builds: Vec::new(),
            active: None,
        }
    }

    /// Undo any drift in the default table by restoring every context
    /// from the factory snapshot
    pub fn restore_default_keymaps(&mut self) {
        for context in &mut self.default.contexts {
            if let Some(factory) = self.factory.context(&context.name) {
                context.restore(factory);
            }
        }
    }

    /// Remove a build table; clears the active marker if it pointed there
    pub fn remove_keyconfig(&mut self, name: &str) -> bool {
        let before = self.builds.len();
        self.builds.retain(|k| k.name != name);
        let removed = self.builds.len() != before;
        if removed && self.active.as_deref() == Some(name) {
            self.active = None;
        }
        removed
    }

    /// Create a build table cloned from the default table and mark it active,
    /// replacing any build table of the same name
    pub fn new_build_keyconfig(&mut self, name: &str) -> &mut Keyconfig {
        if self.remove_keyconfig(name) {
            tracing::info!("Replacing existing keyconfig '{}'", name);
        }
        let mut build = Keyconfig::new(name, KeyconfigKind::Build);
        build.clone_contexts_from(&self.default);
        self.active = Some(name.to_string());
        self.builds.push(build);
        let index = self.builds.len() - 1;
        &mut self.builds[index]
    }

    pub fn get(&self, table: &TableRef) -> Option<&Keyconfig> {
        match table {
            TableRef::Default => Some(&self.default),
            TableRef::User => Some(&self.user),
            TableRef::Addon => Some(&self.addon),
            TableRef::Named(name) => self.builds.iter().find(|k| &k.name == name),
            TableRef::Active => {
                let name = self.active.as_deref()?;
                self.builds.iter().find(|k| k.name == name)
            }
        }
    }

    pub fn get_mut(&mut self, table: &TableRef) -> Option<&mut Keyconfig> {
        match table {
            TableRef::Default => Some(&mut self.default),
            TableRef::User => Some(&mut self.user),
            TableRef::Addon => Some(&mut self.addon),
            TableRef::Named(name) => self.builds.iter_mut().find(|k| &k.name == name),
            TableRef::Active => {
                let name = self.active.as_deref()?;
                self.builds.iter_mut().find(|k| k.name == name)
            }
        }
    }

    pub fn default_keyconfig(&self) -> &Keyconfig {
        &self.default
    }

    pub fn user(&self) -> &Keyconfig {
        &self.user
    }

    pub fn user_mut(&mut self) -> &mut Keyconfig {
        &mut self.user
    }

    pub fn addon(&self) -> &Keyconfig {
        &self.addon
    }

    pub fn addon_mut(&mut self) -> &mut Keyconfig {
        &mut self.addon
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn build_names(&self) -> impl Iterator<Item = &str> {
        self.builds.iter().map(|k| k.name.as_str())
    }
}
