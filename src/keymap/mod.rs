//! Раскладки клавиатуры, на которые накладывается тепловая карта.

use crate::error::{KeyheatError, Result};
use crate::events::KeyCode;
use crate::keyheat_error;
use serde::{Deserialize, Serialize};

/// Один слой раскладки: строки клавиш, `KeyCode::UNKNOWN` обозначает пустую ячейку
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLayer {
    pub name: String,
    pub rows: Vec<Vec<KeyCode>>,
}

impl KeyLayer {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<KeyCode>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Слой из строк с именами клавиш; неизвестные имена становятся пустыми ячейками
    pub fn from_names(name: impl Into<String>, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|key| KeyCode::parse(key).unwrap_or(KeyCode::UNKNOWN))
                    .collect()
            })
            .collect();
        Self::new(name, rows)
    }

    /// Пустой слой той же геометрии
    pub fn blank_like(&self, name: impl Into<String>) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| vec![KeyCode::UNKNOWN; row.len()])
            .collect();
        Self::new(name, rows)
    }

    pub fn contains(&self, key: KeyCode) -> bool {
        !key.is_unknown() && self.rows.iter().any(|row| row.contains(&key))
    }

    /// Все назначенные клавиши слоя (без пустых ячеек)
    pub fn keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.rows
            .iter()
            .flatten()
            .copied()
            .filter(|key| !key.is_unknown())
    }

    pub fn set_key(&mut self, row: usize, col: usize, key: KeyCode) -> Result<()> {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = key;
                Ok(())
            }
            None => Err(keyheat_error!(
                invalid_keymap,
                "Нет ячейки ({}, {}) в слое \"{}\"",
                row,
                col,
                self.name
            )),
        }
    }
}

/// Именованная раскладка из нескольких слоёв
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keymap {
    pub name: String,
    pub layers: Vec<KeyLayer>,
}

impl Keymap {
    pub fn new(name: impl Into<String>, layers: Vec<KeyLayer>) -> Self {
        Self {
            name: name.into(),
            layers,
        }
    }

    /// Стандартная раскладка ANSI (основной блок)
    pub fn ansi() -> Self {
        let base = KeyLayer::from_names(
            "Base",
            &[
                &["`", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "-", "=", "backspace"],
                &["tab", "q", "w", "e", "r", "t", "y", "u", "i", "o", "p", "[", "]", "\\"],
                &["capslock", "a", "s", "d", "f", "g", "h", "j", "k", "l", ";", "'", "enter"],
                &["lshift", "z", "x", "c", "v", "b", "n", "m", ",", ".", "/", "rshift"],
                &["lctrl", "lmeta", "lalt", "space", "ralt", "rmeta", "rctrl"],
            ],
        );
        Self::new("ANSI", vec![base])
    }

    /// Сплит-раскладка: две половины `side_rows` x `side_cols` и ряд из `thumbs` клавиш на половину
    pub fn split(
        name: impl Into<String>,
        side_rows: usize,
        side_cols: usize,
        thumbs: usize,
    ) -> Result<Self> {
        let name = name.into();
        if side_rows == 0 || side_cols == 0 {
            return Err(keyheat_error!(
                invalid_keymap,
                "Раскладка \"{}\": размеры половины должны быть больше 0",
                name
            ));
        }

        let mut rows = vec![vec![KeyCode::UNKNOWN; side_cols * 2]; side_rows];
        if thumbs > 0 {
            rows.push(vec![KeyCode::UNKNOWN; thumbs * 2]);
        }

        let keymap = Self::new(name, vec![KeyLayer::new("Base", rows)]);
        keymap.validate()?;
        Ok(keymap)
    }

    pub fn layer(&self, name: &str) -> Option<&KeyLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut KeyLayer> {
        self.layers.iter_mut().find(|layer| layer.name == name)
    }

    /// Добавить пустой слой с геометрией первого слоя
    pub fn add_layer(&mut self, name: impl Into<String>) -> Result<&mut KeyLayer> {
        let name = name.into();
        if self.layer(&name).is_some() {
            return Err(KeyheatError::InvalidKeymap(format!(
                "Слой \"{}\" уже существует в раскладке \"{}\"",
                name, self.name
            )));
        }

        let layer = match self.layers.first() {
            Some(first) => first.blank_like(name),
            None => KeyLayer::new(name, Vec::new()),
        };
        self.layers.push(layer);
        let last = self.layers.len() - 1;
        Ok(&mut self.layers[last])
    }

    pub fn remove_layer(&mut self, name: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|layer| layer.name != name);
        self.layers.len() != before
    }

    pub fn contains(&self, key: KeyCode) -> bool {
        self.layers.iter().any(|layer| layer.contains(key))
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(keyheat_error!(invalid_keymap, "Пустое имя раскладки"));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.name.trim().is_empty() {
                return Err(keyheat_error!(invalid_keymap, "Пустое имя слоя #{}", i + 1));
            }
            if self.layers[..i].iter().any(|l| l.name == layer.name) {
                return Err(keyheat_error!(
                    invalid_keymap,
                    "Повторяющийся слой \"{}\" в раскладке \"{}\"",
                    layer.name,
                    self.name
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ansi_layout_contains_letters() {
        let keymap = Keymap::ansi();
        assert!(keymap.validate().is_ok());
        assert!(keymap.contains(KeyCode::parse("a").unwrap()));
        assert!(keymap.contains(KeyCode::parse("space").unwrap()));
        assert!(!keymap.contains(KeyCode::parse("f5").unwrap()));
        assert!(!keymap.contains(KeyCode::UNKNOWN));
    }

    #[test]
    fn test_split_geometry() {
        let keymap = Keymap::split("Corne", 3, 6, 3).unwrap();
        let base = keymap.layer("Base").unwrap();

        assert_eq!(base.rows.len(), 4);
        assert!(base.rows[..3].iter().all(|row| row.len() == 12));
        assert_eq!(base.rows[3].len(), 6);
        assert_eq!(base.keys().count(), 0);
    }

    #[test]
    fn test_split_rejects_empty_half() {
        assert!(Keymap::split("Broken", 0, 5, 2).is_err());
        assert!(Keymap::split("", 3, 5, 2).is_err());
    }

    #[test]
    fn test_add_and_remove_layer() {
        let mut keymap = Keymap::split("Corne", 3, 6, 3).unwrap();

        let symbols = keymap.add_layer("Symbols").unwrap();
        symbols.set_key(0, 0, KeyCode::parse("1").unwrap()).unwrap();
        assert!(symbols.set_key(9, 0, KeyCode(2)).is_err());

        assert!(keymap.add_layer("Symbols").is_err());
        assert!(keymap.layer("Symbols").unwrap().contains(KeyCode(2)));

        assert!(keymap.remove_layer("Symbols"));
        assert!(!keymap.remove_layer("Symbols"));
        assert_eq!(keymap.layers.len(), 1);
    }

    #[test]
    fn test_layers_serialize_as_json() {
        let keymap = Keymap::ansi();
        let json = serde_json::to_string(&keymap.layers).unwrap();
        let layers: Vec<KeyLayer> = serde_json::from_str(&json).unwrap();
        assert_eq!(layers, keymap.layers);
    }
}
