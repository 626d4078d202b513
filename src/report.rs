//! Текстовый отчёт: сводка по окнам и тепловая карта нажатий поверх раскладки.

use crate::events::KeyCode;
use crate::keymap::Keymap;
use crate::stats::{HeatCell, LayerHeat, WindowInfo};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::{Duration, Instant};

/// Градации яркости ячейки, от холодной к горячей
const SHADES: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Ширина ячейки в сетке раскладки
const CELL_WIDTH: usize = 11;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Показать только это окно
    pub window: Option<String>,
    /// Сколько окон выводить в сводке
    pub top: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            window: None,
            top: 10,
        }
    }
}

/// Собрать отчёт. `presses` - нажатия, по которым строится тепловая карта
/// (одного окна или суммарные).
pub fn render(
    windows: &[WindowInfo],
    presses: &BTreeMap<KeyCode, u64>,
    keymap: &Keymap,
    options: &ReportOptions,
) -> String {
    let mut out = String::new();
    let now = Instant::now();

    let mut ranked: Vec<&WindowInfo> = match &options.window {
        Some(id) => windows.iter().filter(|w| &w.id == id).collect(),
        None => windows.iter().collect(),
    };
    ranked.sort_by(|a, b| {
        b.total_key_presses()
            .cmp(&a.total_key_presses())
            .then_with(|| b.total_clicks().cmp(&a.total_clicks()))
    });

    if ranked.is_empty() {
        match &options.window {
            Some(id) => {
                let _ = writeln!(out, "Окно \"{}\" не найдено в статистике", id);
            }
            None => {
                let _ = writeln!(out, "Статистика пуста");
            }
        }
        return out;
    }

    let _ = writeln!(
        out,
        "Окна: {} (показано {})",
        ranked.len(),
        ranked.len().min(options.top)
    );
    let _ = writeln!(
        out,
        "{:>8} {:>7} {:>7} {:>9} {:>9}  {}",
        "клавиши", "клики", "скролл", "путь", "в фокусе", "окно"
    );
    for window in ranked.iter().take(options.top) {
        let _ = writeln!(
            out,
            "{:>8} {:>7} {:>7} {:>9.0} {:>9}  {}",
            window.total_key_presses(),
            window.total_clicks(),
            window.total_scrolls(),
            window.movement.distance,
            format_duration(window.focused_duration(now)),
            window.id
        );
    }

    for layer in &keymap.layers {
        let heat = LayerHeat::compute(layer, presses);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Раскладка {} / слой {}: {} нажатий",
            keymap.name, heat.name, heat.total
        );
        if let Some(cell) = heat.hottest() {
            let _ = writeln!(
                out,
                "Самая частая: {} ({}, {:.1}%)",
                cell.key,
                cell.presses,
                cell.share * 100.0
            );
        }
        for row in &heat.rows {
            let line: String = row.iter().map(render_cell).collect();
            let _ = writeln!(out, "{}", line.trim_end());
        }
    }

    let outside: Vec<(&KeyCode, &u64)> = presses
        .iter()
        .filter(|(key, count)| **count > 0 && !keymap.contains(**key))
        .collect();
    if !outside.is_empty() {
        let _ = writeln!(out);
        let _ = write!(out, "Вне раскладки:");
        for (key, count) in outside {
            let _ = write!(out, " {}={}", key, count);
        }
        let _ = writeln!(out);
    }

    out
}

fn shade(intensity: f64) -> char {
    let last = SHADES.len() - 1;
    let idx = (intensity.clamp(0.0, 1.0) * last as f64).round() as usize;
    SHADES[idx.min(last)]
}

fn render_cell(cell: &HeatCell) -> String {
    if cell.key.is_unknown() {
        return " ".repeat(CELL_WIDTH);
    }
    let mut label = cell.key.label();
    label.truncate(5);
    let body = format!("{}{}{}", shade(cell.intensity), label, cell.presses);
    format!("[{:<width$}]", body, width = CELL_WIDTH - 2)
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(id: &str, keys: &[(&str, u64)]) -> WindowInfo {
        let mut info = WindowInfo::new(id);
        for (name, count) in keys {
            let key = KeyCode::parse(name).unwrap();
            for _ in 0..*count {
                info.add_key_press(key);
            }
        }
        info
    }

    fn totals(windows: &[WindowInfo]) -> BTreeMap<KeyCode, u64> {
        let mut totals = BTreeMap::new();
        for w in windows {
            for (&k, &c) in &w.key_presses {
                *totals.entry(k).or_insert(0) += c;
            }
        }
        totals
    }

    #[test]
    fn test_windows_ranked_by_key_presses() {
        let windows = vec![window("Quiet", &[("a", 1)]), window("Busy", &[("e", 5)])];
        let text = render(&windows, &totals(&windows), &Keymap::ansi(), &ReportOptions::default());

        let busy = text.find("Busy").unwrap();
        let quiet = text.find("Quiet").unwrap();
        assert!(busy < quiet);
        assert!(text.contains("Самая частая: e (5"));
    }

    #[test]
    fn test_top_limits_listing() {
        let windows = vec![window("One", &[("a", 3)]), window("Two", &[("b", 2)])];
        let options = ReportOptions {
            window: None,
            top: 1,
        };
        let text = render(&windows, &totals(&windows), &Keymap::ansi(), &options);
        assert!(text.contains("One"));
        assert!(!text.contains("Two"));
    }

    #[test]
    fn test_unknown_window_and_empty_stats() {
        let options = ReportOptions {
            window: Some("Missing".to_string()),
            top: 10,
        };
        let text = render(&[], &BTreeMap::new(), &Keymap::ansi(), &options);
        assert!(text.contains("\"Missing\" не найдено"));

        let text = render(&[], &BTreeMap::new(), &Keymap::ansi(), &ReportOptions::default());
        assert!(text.contains("Статистика пуста"));
    }

    #[test]
    fn test_keys_outside_keymap_listed() {
        let windows = vec![window("Editor", &[("a", 1), ("f1", 2)])];
        let text = render(&windows, &totals(&windows), &Keymap::ansi(), &ReportOptions::default());
        assert!(text.contains("Вне раскладки: f1=2"));
    }

    #[test]
    fn test_shade_bounds() {
        assert_eq!(shade(0.0), ' ');
        assert_eq!(shade(1.0), '@');
        assert_eq!(shade(7.0), '@');
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m05s");
        assert_eq!(format_duration(Duration::from_secs(3720)), "1h02m");
    }
}
