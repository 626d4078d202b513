//! Граница хранения: агрегатор работает с базой только через `Store`.

mod migrations;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::keymap::Keymap;
use crate::stats::WindowInfo;

/// Долговременное хранилище статистики и раскладок
pub trait Store: Send + Sync {
    /// Вставить или полностью обновить запись окна
    fn save(&self, window: &WindowInfo) -> Result<()>;

    /// Все окна в порядке первого сохранения
    fn load(&self) -> Result<Vec<WindowInfo>>;

    fn delete(&self, identifier: &str) -> Result<bool>;

    fn clear(&self) -> Result<usize>;

    fn list_keymaps(&self) -> Result<Vec<Keymap>>;

    fn save_keymap(&self, keymap: &Keymap) -> Result<()>;

    fn delete_keymap(&self, name: &str) -> Result<bool>;
}
