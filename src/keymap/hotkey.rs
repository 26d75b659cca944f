//! Hotkey descriptor parsing
//!
//! Converts compact descriptors like `"D ctrl alt DOUBLE_CLICK repeat"` into
//! a [`Trigger`]. The first token is always the primary key; the remaining
//! tokens may appear in any order.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::config::KeymapError;
use super::types::{InputValue, Modifiers, Trigger};

/// A hotkey as written in a rule file
///
/// - `"A shift ctrl CLICK"` (descriptor string)
/// - `{TAB: [shift, ctrl]}` (structured: key mapped to its tokens)
/// - `false` (no descriptor)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HotkeySpec {
    Flag(bool),
    Text(String),
    Structured(BTreeMap<String, Vec<String>>),
}

impl HotkeySpec {
    /// Resolve into a trigger; `Ok(None)` means "no descriptor"
    pub fn resolve(&self) -> Result<Option<Trigger>, KeymapError> {
        match self {
            HotkeySpec::Flag(false) => Ok(None),
            HotkeySpec::Flag(true) => Err(KeymapError::InvalidHotkey(
                "`true` is not a hotkey descriptor".to_string(),
            )),
            HotkeySpec::Text(text) => parse_hotkey(text).map(Some),
            HotkeySpec::Structured(map) => {
                let mut entries = map.iter();
                let (Some((key, tokens)), None) = (entries.next(), entries.next()) else {
                    return Err(KeymapError::InvalidHotkey(format!(
                        "structured hotkey must have exactly one key, got {}",
                        map.len()
                    )));
                };
                let mut descriptor = key.clone();
                for token in tokens {
                    descriptor.push(' ');
                    descriptor.push_str(token);
                }
                parse_hotkey(&descriptor).map(Some)
            }
        }
    }
}

impl From<&str> for HotkeySpec {
    fn from(text: &str) -> Self {
        HotkeySpec::Text(text.to_string())
    }
}

/// Parse a hotkey descriptor into a Trigger
pub fn parse_hotkey(descriptor: &str) -> Result<Trigger, KeymapError> {
    let mut tokens = descriptor.split_whitespace();

    let key = tokens
        .next()
        .ok_or_else(|| KeymapError::InvalidHotkey("empty hotkey".to_string()))?;
    if Modifiers::from_token(key).is_some() || key == "repeat" {
        return Err(KeymapError::InvalidHotkey(format!(
            "hotkey must start with a key, not a modifier: {}",
            descriptor
        )));
    }

    let mut trigger = Trigger::new(key);
    let mut value = None;

    for token in tokens {
        if let Some(modifier) = Modifiers::from_token(token) {
            trigger.modifiers = trigger.modifiers | modifier;
        } else if token == "repeat" {
            trigger.repeat = true;
        } else if let Some(phase) = InputValue::from_token(token) {
            if value.replace(phase).is_some() {
                return Err(KeymapError::InvalidHotkey(format!(
                    "more than one input phase in: {}",
                    descriptor
                )));
            }
        } else if is_key_token(token) {
            // Chord key, e.g. the X in "LEFTMOUSE X"
            if trigger.key_modifier.is_some() {
                return Err(KeymapError::InvalidHotkey(format!(
                    "more than one chord key in: {}",
                    descriptor
                )));
            }
            trigger.key_modifier = Some(token.to_string());
        } else {
            return Err(KeymapError::InvalidHotkey(format!(
                "unknown token `{}` in: {}",
                token, descriptor
            )));
        }
    }

    if trigger.modifiers.is_conflicting() {
        return Err(KeymapError::InvalidHotkey(format!(
            "`any` cannot be combined with explicit modifiers: {}",
            descriptor
        )));
    }

    trigger.value = value.unwrap_or_default();
    Ok(trigger)
}

/// Key names in the host vocabulary are upper-case identifiers
fn is_key_token(token: &str) -> bool {
    token
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
