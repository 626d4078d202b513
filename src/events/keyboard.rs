use crate::mappings::KeyNames;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Код клавиши (evdev коды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    /// Пустая ячейка раскладки (KEY_RESERVED)
    pub const UNKNOWN: KeyCode = KeyCode(0);

    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }

    /// Разобрать имя клавиши ("a", "space") или числовой код ("30")
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(code) = KeyNames::code(name) {
            return Some(Self(code));
        }
        name.trim().parse::<u16>().ok().map(Self)
    }

    pub fn label(&self) -> String {
        match KeyNames::name(self.0) {
            Some(name) => name.to_string(),
            None if self.is_unknown() => String::new(),
            None => format!("#{}", self.0),
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match KeyNames::name(self.0) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "KEY_{}", self.0),
        }
    }
}

/// Нажатие клавиши, зафиксированное источником
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key_code: KeyCode,
    pub timestamp: Instant,
}

impl KeyPress {
    pub fn new(key_code: KeyCode) -> Self {
        Self::at(key_code, Instant::now())
    }

    pub fn at(key_code: KeyCode, timestamp: Instant) -> Self {
        Self {
            key_code,
            timestamp,
        }
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}ms ago)",
            self.key_code,
            self.timestamp.elapsed().as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_code_parse() {
        assert_eq!(KeyCode::parse("a"), Some(KeyCode(30)));
        assert_eq!(KeyCode::parse("SPACE"), Some(KeyCode(57)));
        assert_eq!(KeyCode::parse("183"), Some(KeyCode(183)));
        assert_eq!(KeyCode::parse("not-a-key"), None);
    }

    #[test]
    fn test_key_code_display() {
        assert_eq!(KeyCode(30).to_string(), "a");
        assert_eq!(KeyCode(183).to_string(), "KEY_183");
        assert_eq!(KeyCode(183).label(), "#183");
        assert_eq!(KeyCode::UNKNOWN.label(), "");
    }
}
