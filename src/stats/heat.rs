use crate::events::KeyCode;
use crate::keymap::KeyLayer;
use std::collections::{BTreeMap, HashSet};

/// Значение тепловой карты для одной ячейки слоя
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatCell {
    pub key: KeyCode,
    pub presses: u64,
    /// Доля от максимума по слою, 0.0..=1.0
    pub intensity: f64,
    /// Доля от всех нажатий клавиш слоя, 0.0..=1.0
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerHeat {
    pub name: String,
    pub rows: Vec<Vec<HeatCell>>,
    pub total: u64,
    pub max: u64,
}

impl LayerHeat {
    pub fn compute(layer: &KeyLayer, presses: &BTreeMap<KeyCode, u64>) -> Self {
        let count = |key: &KeyCode| presses.get(key).copied().unwrap_or(0);

        // Клавиша может стоять в слое несколько раз, в сумму она входит один раз
        let distinct: HashSet<KeyCode> = layer.keys().collect();
        let total: u64 = distinct.iter().map(count).sum();
        let max = distinct.iter().map(count).max().unwrap_or(0);

        let rows = layer
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|key| {
                        let presses = if key.is_unknown() { 0 } else { count(key) };
                        HeatCell {
                            key: *key,
                            presses,
                            intensity: ratio(presses, max),
                            share: ratio(presses, total),
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            name: layer.name.clone(),
            rows,
            total,
            max,
        }
    }

    pub fn hottest(&self) -> Option<&HeatCell> {
        self.rows
            .iter()
            .flatten()
            .filter(|cell| cell.presses > 0)
            .max_by_key(|cell| cell.presses)
    }
}

fn ratio(value: u64, of: u64) -> f64 {
    if of == 0 {
        0.0
    } else {
        value as f64 / of as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presses(pairs: &[(&str, u64)]) -> BTreeMap<KeyCode, u64> {
        pairs
            .iter()
            .map(|(name, count)| (KeyCode::parse(name).unwrap(), *count))
            .collect()
    }

    #[test]
    fn test_intensity_and_share() {
        let layer = KeyLayer::from_names("Base", &[&["a", "s"], &["d", ""]]);
        let heat = LayerHeat::compute(&layer, &presses(&[("a", 6), ("s", 2), ("f", 100)]));

        assert_eq!(heat.total, 8);
        assert_eq!(heat.max, 6);
        assert_eq!(heat.rows[0][0].intensity, 1.0);
        assert!((heat.rows[0][1].share - 0.25).abs() < 1e-9);
        assert_eq!(heat.rows[1][0].presses, 0);
        assert_eq!(heat.rows[1][1].key, KeyCode::UNKNOWN);
        assert_eq!(heat.hottest().map(|c| c.key), KeyCode::parse("a"));
    }

    #[test]
    fn test_empty_counts_give_zero_heat() {
        let layer = KeyLayer::from_names("Base", &[&["a", "a"]]);
        let heat = LayerHeat::compute(&layer, &BTreeMap::new());

        assert_eq!(heat.total, 0);
        assert!(heat.rows[0].iter().all(|c| c.intensity == 0.0 && c.share == 0.0));
        assert!(heat.hottest().is_none());
    }

    #[test]
    fn test_duplicate_key_counted_once_in_total() {
        let layer = KeyLayer::from_names("Base", &[&["a", "a", "b"]]);
        let heat = LayerHeat::compute(&layer, &presses(&[("a", 3), ("b", 1)]));
        assert_eq!(heat.total, 4);
    }
}
