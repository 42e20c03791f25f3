//! Keyboard input and the activation hotkey.

use serde::{Deserialize, Serialize};

use crate::selection::state::PointerEvent;

/// A key press as reported by the page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// Logical key value, e.g. `"0"`, `"a"`, `"Escape"`.
    pub key: String,
    /// Physical key code, e.g. `"Digit0"`, `"Numpad0"`.
    pub code: String,
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyEvent {
    #[cfg(test)]
    pub fn new(key: &str, code: &str) -> Self {
        Self {
            key: key.to_string(),
            code: code.to_string(),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn escape() -> Self {
        Self::new("Escape", "Escape")
    }

    #[cfg(test)]
    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    #[cfg(test)]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn is_escape(&self) -> bool {
        self.key == "Escape"
    }
}

/// Everything the session runner reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Key(KeyEvent),
    Pointer(PointerEvent),
}

/// Key combination that starts a selection session.
///
/// Written as `"Alt+0"`, `"Ctrl+Shift+O"` and so on. Only the modifiers
/// listed are required; extra modifiers held down do not prevent a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hotkey {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
    /// The main key, as typed (`"0"`, `"o"`, `"F2"`).
    pub key: String,
}

impl Default for Hotkey {
    fn default() -> Self {
        Self {
            alt: true,
            ctrl: false,
            shift: false,
            meta: false,
            key: "0".to_string(),
        }
    }
}

impl Hotkey {
    pub fn parse(s: &str) -> Result<Self, String> {
        let mut hotkey = Hotkey {
            alt: false,
            ctrl: false,
            shift: false,
            meta: false,
            key: String::new(),
        };

        for part in s.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "alt" | "option" => hotkey.alt = true,
                "ctrl" | "control" => hotkey.ctrl = true,
                "shift" => hotkey.shift = true,
                "meta" | "cmd" | "super" => hotkey.meta = true,
                "" => return Err(format!("empty key in hotkey '{}'", s)),
                _ if !hotkey.key.is_empty() => {
                    return Err(format!("hotkey '{}' names more than one key", s));
                }
                _ => hotkey.key = part.to_string(),
            }
        }

        if hotkey.key.is_empty() {
            return Err(format!("hotkey '{}' has no key", s));
        }
        Ok(hotkey)
    }

    /// True if `event` triggers this hotkey.
    ///
    /// Digits also match on their physical codes so the top-row and numpad
    /// keys both work regardless of keyboard layout.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if (self.alt && !event.alt)
            || (self.ctrl && !event.ctrl)
            || (self.shift && !event.shift)
            || (self.meta && !event.meta)
        {
            return false;
        }

        if event.key.eq_ignore_ascii_case(&self.key) {
            return true;
        }

        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(d), None) if d.is_ascii_digit() => {
                event.code == format!("Digit{}", d) || event.code == format!("Numpad{}", d)
            }
            (Some(c), None) if c.is_ascii_alphabetic() => {
                event.code == format!("Key{}", c.to_ascii_uppercase())
            }
            _ => false,
        }
    }

    /// The key event a user pressing this combination produces.
    pub fn press(&self) -> KeyEvent {
        KeyEvent {
            key: self.key.clone(),
            code: String::new(),
            alt: self.alt,
            ctrl: self.ctrl,
            shift: self.shift,
            meta: self.meta,
        }
    }
}

impl std::fmt::Display for Hotkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        if self.meta {
            write!(f, "Meta+")?;
        }
        write!(f, "{}", self.key)
    }
}

impl TryFrom<String> for Hotkey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Hotkey::parse(&value)
    }
}

impl From<Hotkey> for String {
    fn from(hotkey: Hotkey) -> Self {
        hotkey.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_alt_zero() {
        let hotkey = Hotkey::default();
        assert_eq!(hotkey.to_string(), "Alt+0");
        assert_eq!(Hotkey::parse("Alt+0").unwrap(), hotkey);
    }

    #[test]
    fn test_digit_matches_key_and_codes() {
        let hotkey = Hotkey::default();
        assert!(hotkey.matches(&KeyEvent::new("0", "Digit0").with_alt()));
        assert!(hotkey.matches(&KeyEvent::new("Insert", "Numpad0").with_alt()));
        // Some layouts report a different key value for Alt+digit.
        assert!(hotkey.matches(&KeyEvent::new("º", "Digit0").with_alt()));
        assert!(!hotkey.matches(&KeyEvent::new("0", "Digit0")));
        assert!(!hotkey.matches(&KeyEvent::new("1", "Digit1").with_alt()));
    }

    #[test]
    fn test_letter_hotkey_is_case_insensitive() {
        let hotkey = Hotkey::parse("ctrl + shift + o").unwrap();
        let mut event = KeyEvent::new("O", "KeyO").with_ctrl();
        assert!(!hotkey.matches(&event));
        event.shift = true;
        assert!(hotkey.matches(&event));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Hotkey::parse("Alt+").is_err());
        assert!(Hotkey::parse("Alt+Shift").is_err());
        assert!(Hotkey::parse("Alt+1+2").is_err());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let hotkey: Hotkey = serde_json::from_str(r#""Ctrl+Alt+9""#).unwrap();
        assert!(hotkey.ctrl && hotkey.alt);
        assert_eq!(serde_json::to_string(&hotkey).unwrap(), r#""Ctrl+Alt+9""#);
        assert!(serde_json::from_str::<Hotkey>(r#""Alt+""#).is_err());
    }

    #[test]
    fn test_press_matches_itself() {
        for s in ["Alt+0", "Ctrl+Shift+O", "Meta+F2"] {
            let hotkey = Hotkey::parse(s).unwrap();
            assert!(hotkey.matches(&hotkey.press()), "{}", s);
        }
    }
}
