use crate::error::{KeyheatError, Result};
use crate::events::{KeyCode, MouseButton, ScrollDirection};
use crate::keymap::{KeyLayer, Keymap};
use crate::stats::{FocusTime, MouseMovement, WindowInfo};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::migrations::run_migrations;
use super::Store;

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| KeyheatError::Internal(format!("Значение {} не помещается в INTEGER", value)))
}

fn to_u64(value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| KeyheatError::Internal(format!("Отрицательный счётчик в базе: {}", value)))
}

/// Хранилище статистики в SQLite
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        if let Err(e) = conn.pragma_update(None, "journal_mode", "WAL") {
            warn!("Не удалось включить WAL: {}", e);
        }
        info!("Хранилище открыто: {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        if let Err(e) = conn.pragma_update(None, "foreign_keys", "ON") {
            error!("Не удалось включить foreign keys: {}", e);
        }
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn load_counters(
        conn: &Connection,
        windows: &mut [WindowInfo],
        positions: &HashMap<String, usize>,
    ) -> Result<()> {
        let mut stmt = conn.prepare("SELECT window_id, key_code, count FROM key_presses")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
        })?;
        for row in rows {
            let (window_id, key_code, count) = row?;
            let Some(&idx) = positions.get(&window_id) else { continue };
            let key_code = u16::try_from(key_code).map_err(|_| {
                KeyheatError::Internal(format!("Некорректный код клавиши в базе: {}", key_code))
            })?;
            windows[idx].key_presses.insert(KeyCode(key_code), to_u64(count)?);
        }

        let mut stmt = conn.prepare("SELECT window_id, button, count FROM mouse_buttons")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
        })?;
        for row in rows {
            let (window_id, button, count) = row?;
            let Some(&idx) = positions.get(&window_id) else { continue };
            match button.parse::<MouseButton>() {
                Ok(button) => {
                    windows[idx].mouse_buttons.insert(button, to_u64(count)?);
                }
                Err(e) => warn!("Пропускаем запись: {}", e),
            }
        }

        let mut stmt = conn.prepare("SELECT window_id, direction, count FROM scrolls")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
        })?;
        for row in rows {
            let (window_id, direction, count) = row?;
            let Some(&idx) = positions.get(&window_id) else { continue };
            match direction.parse::<ScrollDirection>() {
                Ok(direction) => {
                    windows[idx].scrolls.insert(direction, to_u64(count)?);
                }
                Err(e) => warn!("Пропускаем запись: {}", e),
            }
        }

        Ok(())
    }
}

impl Store for SqliteStore {
    fn save(&self, window: &WindowInfo) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let focus_ms = window.focused_duration(Instant::now()).as_millis();
        let focus_ms = i64::try_from(focus_ms).unwrap_or(i64::MAX);

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO windows (id, focus_ms, times_focused, move_samples, move_distance, first_seen_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 focus_ms = excluded.focus_ms,
                 times_focused = excluded.times_focused,
                 move_samples = excluded.move_samples,
                 move_distance = excluded.move_distance,
                 updated_at = excluded.updated_at",
            params![
                window.id,
                focus_ms,
                to_i64(window.focus.times_focused)?,
                to_i64(window.movement.samples)?,
                window.movement.distance,
                now,
            ],
        )?;

        // Счётчики в памяти накопительные, поэтому дочерние строки перезаписываются целиком
        tx.execute("DELETE FROM key_presses WHERE window_id = ?1", params![window.id])?;
        tx.execute("DELETE FROM mouse_buttons WHERE window_id = ?1", params![window.id])?;
        tx.execute("DELETE FROM scrolls WHERE window_id = ?1", params![window.id])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO key_presses (window_id, key_code, count) VALUES (?1, ?2, ?3)",
            )?;
            for (key, count) in &window.key_presses {
                stmt.execute(params![window.id, i64::from(key.value()), to_i64(*count)?])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO mouse_buttons (window_id, button, count) VALUES (?1, ?2, ?3)",
            )?;
            for (button, count) in &window.mouse_buttons {
                stmt.execute(params![window.id, button.as_str(), to_i64(*count)?])?;
            }

            let mut stmt =
                tx.prepare("INSERT INTO scrolls (window_id, direction, count) VALUES (?1, ?2, ?3)")?;
            for (direction, count) in &window.scrolls {
                stmt.execute(params![window.id, direction.as_str(), to_i64(*count)?])?;
            }
        }

        tx.commit()?;
        debug!("Окно \"{}\" сохранено", window.id);
        Ok(())
    }

    fn load(&self) -> Result<Vec<WindowInfo>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, focus_ms, times_focused, move_samples, move_distance
             FROM windows ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?;

        let mut windows = Vec::new();
        for row in rows {
            let (id, focus_ms, times_focused, move_samples, move_distance) = row?;
            let mut window = WindowInfo::new(id);
            window.focus = FocusTime::restored(
                to_u64(times_focused)?,
                Duration::from_millis(to_u64(focus_ms)?),
            );
            window.movement = MouseMovement {
                samples: to_u64(move_samples)?,
                distance: move_distance,
                last_position: None,
            };
            windows.push(window);
        }
        drop(stmt);

        let positions: HashMap<String, usize> = windows
            .iter()
            .enumerate()
            .map(|(idx, w)| (w.id.clone(), idx))
            .collect();
        Self::load_counters(&conn, &mut windows, &positions)?;

        debug!("Загружено {} окон", windows.len());
        Ok(windows)
    }

    fn delete(&self, identifier: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM windows WHERE id = ?1", params![identifier])?;
        Ok(affected > 0)
    }

    fn clear(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM windows", [])?;
        Ok(affected)
    }

    fn list_keymaps(&self) -> Result<Vec<Keymap>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name, layers FROM keymaps ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut keymaps = Vec::new();
        for row in rows {
            let (name, layers) = row?;
            let layers: Vec<KeyLayer> = serde_json::from_str(&layers)?;
            keymaps.push(Keymap::new(name, layers));
        }
        Ok(keymaps)
    }

    fn save_keymap(&self, keymap: &Keymap) -> Result<()> {
        keymap.validate()?;
        let layers = serde_json::to_string(&keymap.layers)?;
        let now = Utc::now().to_rfc3339();

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO keymaps (name, layers, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(name) DO UPDATE SET
                 layers = excluded.layers,
                 updated_at = excluded.updated_at",
            params![keymap.name, layers, now],
        )?;
        Ok(())
    }

    fn delete_keymap(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM keymaps WHERE name = ?1", params![name])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Aggregator;
    use crate::events::{KeyPress, MouseEvent, WindowFocus};

    fn sample_window(id: &str, key: u16, presses: u64) -> WindowInfo {
        let mut window = WindowInfo::new(id);
        for _ in 0..presses {
            window.add_key_press(KeyCode(key));
        }
        window.add_mouse_button_press(MouseButton::Right);
        window.add_scroll(ScrollDirection::Down);
        window
    }

    #[test]
    fn test_save_and_load_keep_order_and_counts() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save(&sample_window("Terminal", 30, 3)).unwrap();
        store.save(&sample_window("Browser", 31, 1)).unwrap();

        let loaded = store.load().unwrap();
        let ids: Vec<&str> = loaded.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["Terminal", "Browser"]);
        assert_eq!(loaded[0].key_count(KeyCode(30)), 3);
        assert_eq!(loaded[0].mouse_buttons.get(&MouseButton::Right), Some(&1));
        assert_eq!(loaded[1].scrolls.get(&ScrollDirection::Down), Some(&1));
        assert!(!loaded[0].is_focused());
    }

    #[test]
    fn test_save_is_upsert() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save(&sample_window("Terminal", 30, 1)).unwrap();
        store.save(&sample_window("Browser", 31, 1)).unwrap();
        store.save(&sample_window("Terminal", 30, 5)).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "Terminal");
        assert_eq!(loaded[0].key_count(KeyCode(30)), 5);
    }

    #[test]
    fn test_delete_and_clear() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save(&sample_window("Terminal", 30, 1)).unwrap();
        store.save(&sample_window("Browser", 31, 1)).unwrap();

        assert!(store.delete("Terminal").unwrap());
        assert!(!store.delete("Terminal").unwrap());
        assert_eq!(store.load().unwrap().len(), 1);

        assert_eq!(store.clear().unwrap(), 1);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_checkpoint_persists_aggregator_state() {
        let store = SqliteStore::open_in_memory().unwrap();
        let aggregator = Aggregator::default();
        let start = Instant::now();

        aggregator.on_window_focus_changed(WindowFocus::at("Editor", start));
        aggregator.on_key_press(KeyPress::at(KeyCode(30), start + Duration::from_millis(1)));
        aggregator.on_mouse_event(MouseEvent::at(
            crate::events::MouseAction::ButtonPress(MouseButton::Left),
            start + Duration::from_millis(2),
        ));

        assert_eq!(aggregator.checkpoint(&store).unwrap(), 1);

        let restored = Aggregator::default();
        restored.restore(store.load().unwrap());
        let editor = restored.lookup("Editor").unwrap();
        assert_eq!(editor.key_count(KeyCode(30)), 1);
        assert_eq!(editor.total_clicks(), 1);
        assert_eq!(editor.focus.times_focused, 1);
    }

    #[test]
    fn test_keymap_upsert_list_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut corne = Keymap::split("Corne", 3, 6, 3).unwrap();
        store.save_keymap(&Keymap::ansi()).unwrap();
        store.save_keymap(&corne).unwrap();

        corne.add_layer("Nav").unwrap();
        store.save_keymap(&corne).unwrap();

        let keymaps = store.list_keymaps().unwrap();
        assert_eq!(keymaps.len(), 2);
        assert_eq!(keymaps[0].name, "ANSI");
        assert_eq!(keymaps[1].layers.len(), 2);

        assert!(store.delete_keymap("ANSI").unwrap());
        assert_eq!(store.list_keymaps().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_keymap_is_not_saved() {
        let store = SqliteStore::open_in_memory().unwrap();
        let keymap = Keymap::new(" ", vec![]);
        assert!(store.save_keymap(&keymap).is_err());
        assert!(store.list_keymaps().unwrap().is_empty());
    }
}
