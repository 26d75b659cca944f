//! Core types for the keymap system: Modifiers, InputValue, Trigger

use std::fmt;

use serde::{Deserialize, Serialize};

/// Modifier flags as a bitfield for cheap storage and comparison
///
/// `ANY` means "regardless of modifier state" and never coexists with the
/// four explicit modifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(0b00001);
    pub const CTRL: Modifiers = Modifiers(0b00010);
    pub const ALT: Modifiers = Modifiers(0b00100);
    pub const OSKEY: Modifiers = Modifiers(0b01000); // cmd on macOS, win elsewhere
    pub const ANY: Modifiers = Modifiers(0b10000);

    const EXPLICIT: u8 = 0b01111;

    /// Create modifiers from individual flags
    pub const fn new(shift: bool, ctrl: bool, alt: bool, oskey: bool) -> Self {
        let mut bits = 0u8;
        if shift {
            bits |= 0b00001;
        }
        if ctrl {
            bits |= 0b00010;
        }
        if alt {
            bits |= 0b00100;
        }
        if oskey {
            bits |= 0b01000;
        }
        Modifiers(bits)
    }

    #[inline]
    pub const fn shift(self) -> bool {
        self.0 & 0b00001 != 0
    }

    #[inline]
    pub const fn ctrl(self) -> bool {
        self.0 & 0b00010 != 0
    }

    #[inline]
    pub const fn alt(self) -> bool {
        self.0 & 0b00100 != 0
    }

    #[inline]
    pub const fn oskey(self) -> bool {
        self.0 & 0b01000 != 0
    }

    #[inline]
    pub const fn any(self) -> bool {
        self.0 & 0b10000 != 0
    }

    /// True when none of the explicit modifiers are set
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 & Self::EXPLICIT == 0
    }

    /// Combine two modifier sets
    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// Check if this contains all modifiers in other
    #[inline]
    pub const fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    /// True if `any` is combined with at least one explicit modifier
    #[inline]
    pub const fn is_conflicting(self) -> bool {
        self.any() && !self.is_empty()
    }

    /// Look up a single modifier by its descriptor token
    pub fn from_token(token: &str) -> Option<Modifiers> {
        match token {
            "shift" => Some(Modifiers::SHIFT),
            "ctrl" | "control" => Some(Modifiers::CTRL),
            "alt" | "option" => Some(Modifiers::ALT),
            "cmd" | "oskey" | "meta" => Some(Modifiers::OSKEY),
            "any" => Some(Modifiers::ANY),
            _ => None,
        }
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.shift() {
            parts.push("shift");
        }
        if self.ctrl() {
            parts.push("ctrl");
        }
        if self.alt() {
            parts.push("alt");
        }
        if self.oskey() {
            parts.push("cmd");
        }
        if self.any() {
            parts.push("any");
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// The input phase ("value") that fires a binding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputValue {
    Any,
    #[default]
    Press,
    Release,
    Click,
    DoubleClick,
    ClickDrag,
    Nothing,
}

impl InputValue {
    /// Parse a phase token (`PRESS`, `DOUBLE_CLICK`, ...)
    pub fn from_token(token: &str) -> Option<InputValue> {
        match token {
            "ANY" => Some(InputValue::Any),
            "PRESS" => Some(InputValue::Press),
            "RELEASE" => Some(InputValue::Release),
            "CLICK" => Some(InputValue::Click),
            "DOUBLE_CLICK" => Some(InputValue::DoubleClick),
            "CLICK_DRAG" => Some(InputValue::ClickDrag),
            "NOTHING" => Some(InputValue::Nothing),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            InputValue::Any => "ANY",
            InputValue::Press => "PRESS",
            InputValue::Release => "RELEASE",
            InputValue::Click => "CLICK",
            InputValue::DoubleClick => "DOUBLE_CLICK",
            InputValue::ClickDrag => "CLICK_DRAG",
            InputValue::Nothing => "NOTHING",
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host event types that are not user input and never take part in sweeps
const NON_INPUT_EVENTS: &[&str] = &[
    "TIMER",
    "TEXTINPUT",
    "WINDOW_DEACTIVATE",
    "ACTIONZONE_AREA",
    "ACTIONZONE_REGION",
    "ACTIONZONE_FULLSCREEN",
    "XR_ACTION",
];

/// What input event activates a binding
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Trigger {
    /// Primary key or button in the host vocabulary (`A`, `LEFTMOUSE`, `NDOF_BUTTON_FIT`)
    pub key: String,
    pub modifiers: Modifiers,
    /// Secondary co-pressed key for chords; `None` means no chord key
    pub key_modifier: Option<String>,
    pub value: InputValue,
    /// Whether held-key auto-repeat re-fires the action
    pub repeat: bool,
}

impl Trigger {
    /// A plain key press with no modifiers
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::NONE,
            key_modifier: None,
            value: InputValue::Press,
            repeat: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_value(mut self, value: InputValue) -> Self {
        self.value = value;
        self
    }

    pub fn with_key_modifier(mut self, key: impl Into<String>) -> Self {
        self.key_modifier = Some(key.into());
        self
    }

    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    /// False for host pseudo-events such as timers and text input
    pub fn is_input_event(&self) -> bool {
        !NON_INPUT_EVENTS
            .iter()
            .any(|event| self.key.starts_with(event))
    }
}

impl fmt::Display for Trigger {
    /// Canonical descriptor form, parseable by [`super::parse_hotkey`]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if self.modifiers != Modifiers::NONE {
            write!(f, " {}", self.modifiers)?;
        }
        if let Some(ref chord) = self.key_modifier {
            write!(f, " {}", chord)?;
        }
        if self.value != InputValue::Press {
            write!(f, " {}", self.value)?;
        }
        if self.repeat {
            write!(f, " repeat")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_empty() {
        let mods = Modifiers::NONE;
        assert!(mods.is_empty());
        assert!(!mods.shift());
        assert!(!mods.ctrl());
        assert!(!mods.alt());
        assert!(!mods.oskey());
        assert!(!mods.any());
    }

    #[test]
    fn test_modifiers_combined() {
        let mods = Modifiers::CTRL | Modifiers::SHIFT;
        assert!(mods.ctrl());
        assert!(mods.shift());
        assert!(!mods.alt());
        assert!(mods.contains(Modifiers::CTRL));
        assert!(!mods.contains(Modifiers::ALT));
    }

    #[test]
    fn test_any_is_not_an_explicit_modifier() {
        assert!(Modifiers::ANY.is_empty());
        assert!(!Modifiers::ANY.is_conflicting());
        assert!((Modifiers::ANY | Modifiers::SHIFT).is_conflicting());
    }

    #[test]
    fn test_trigger_display_canonical_order() {
        let trigger = Trigger::new("D")
            .with_modifiers(Modifiers::ALT | Modifiers::CTRL)
            .with_value(InputValue::DoubleClick)
            .with_repeat(true);
        assert_eq!(trigger.to_string(), "D ctrl alt DOUBLE_CLICK repeat");
    }

    #[test]
    fn test_trigger_display_press_is_implicit() {
        let trigger = Trigger::new("LEFTMOUSE").with_key_modifier("X");
        assert_eq!(trigger.to_string(), "LEFTMOUSE X");
    }

    #[test]
    fn test_input_event_filter() {
        assert!(Trigger::new("NUMPAD_4").is_input_event());
        assert!(Trigger::new("NDOF_BUTTON_FIT").is_input_event());
        assert!(!Trigger::new("TIMER_REPORT").is_input_event());
        assert!(!Trigger::new("TEXTINPUT").is_input_event());
    }
}
