use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Таблица имён клавиш и кодов evdev (linux/input-event-codes.h)
const KEY_TABLE: &[(&str, u16)] = &[
    ("esc", 1),
    ("1", 2),
    ("2", 3),
    ("3", 4),
    ("4", 5),
    ("5", 6),
    ("6", 7),
    ("7", 8),
    ("8", 9),
    ("9", 10),
    ("0", 11),
    ("-", 12),
    ("=", 13),
    ("backspace", 14),
    ("tab", 15),
    ("q", 16),
    ("w", 17),
    ("e", 18),
    ("r", 19),
    ("t", 20),
    ("y", 21),
    ("u", 22),
    ("i", 23),
    ("o", 24),
    ("p", 25),
    ("[", 26),
    ("]", 27),
    ("enter", 28),
    ("lctrl", 29),
    ("a", 30),
    ("s", 31),
    ("d", 32),
    ("f", 33),
    ("g", 34),
    ("h", 35),
    ("j", 36),
    ("k", 37),
    ("l", 38),
    (";", 39),
    ("'", 40),
    ("`", 41),
    ("lshift", 42),
    ("\\", 43),
    ("z", 44),
    ("x", 45),
    ("c", 46),
    ("v", 47),
    ("b", 48),
    ("n", 49),
    ("m", 50),
    (",", 51),
    (".", 52),
    ("/", 53),
    ("rshift", 54),
    ("kp*", 55),
    ("lalt", 56),
    ("space", 57),
    ("capslock", 58),
    ("f1", 59),
    ("f2", 60),
    ("f3", 61),
    ("f4", 62),
    ("f5", 63),
    ("f6", 64),
    ("f7", 65),
    ("f8", 66),
    ("f9", 67),
    ("f10", 68),
    ("numlock", 69),
    ("scrolllock", 70),
    ("kp7", 71),
    ("kp8", 72),
    ("kp9", 73),
    ("kp-", 74),
    ("kp4", 75),
    ("kp5", 76),
    ("kp6", 77),
    ("kp+", 78),
    ("kp1", 79),
    ("kp2", 80),
    ("kp3", 81),
    ("kp0", 82),
    ("kp.", 83),
    ("102nd", 86),
    ("f11", 87),
    ("f12", 88),
    ("kpenter", 96),
    ("rctrl", 97),
    ("kp/", 98),
    ("sysrq", 99),
    ("ralt", 100),
    ("home", 102),
    ("up", 103),
    ("pageup", 104),
    ("left", 105),
    ("right", 106),
    ("end", 107),
    ("down", 108),
    ("pagedown", 109),
    ("insert", 110),
    ("delete", 111),
    ("pause", 119),
    ("lmeta", 125),
    ("rmeta", 126),
    ("compose", 127),
];

static NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> =
    Lazy::new(|| KEY_TABLE.iter().copied().collect());

static CODE_TO_NAME: Lazy<HashMap<u16, &'static str>> =
    Lazy::new(|| KEY_TABLE.iter().map(|&(name, code)| (code, name)).collect());

/// Преобразование между кодами evdev и короткими именами клавиш
pub struct KeyNames;

impl KeyNames {
    /// Код клавиши по имени (регистронезависимо)
    pub fn code(name: &str) -> Option<u16> {
        let normalized = name.trim().to_lowercase();
        NAME_TO_CODE.get(normalized.as_str()).copied()
    }

    pub fn name(code: u16) -> Option<&'static str> {
        CODE_TO_NAME.get(&code).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_key_mapping() {
        assert_eq!(KeyNames::code("a"), Some(30));
        assert_eq!(KeyNames::code("space"), Some(57));
        assert_eq!(KeyNames::code("lctrl"), Some(29));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(KeyNames::code("A"), Some(30));
        assert_eq!(KeyNames::code(" Enter "), Some(28));
    }

    #[test]
    fn test_reverse_mapping() {
        assert_eq!(KeyNames::name(30), Some("a"));
        assert_eq!(KeyNames::name(57), Some("space"));
        assert_eq!(KeyNames::name(0), None);
    }

    #[test]
    fn test_table_has_no_duplicates() {
        assert_eq!(NAME_TO_CODE.len(), KEY_TABLE.len());
        assert_eq!(CODE_TO_NAME.len(), KEY_TABLE.len());
    }
}
