//! Агрегация статистики по окнам.
//!
//! Модуль ничего не знает об источниках событий: он получает уже готовые
//! KeyPress / MouseEvent / WindowFocus и раскладывает их по записям WindowInfo.

pub mod aggregator;
pub mod heat;
pub mod window_info;

pub use aggregator::{Aggregator, UnattributedPolicy};
pub use heat::{HeatCell, LayerHeat};
pub use window_info::{FocusTime, MouseMovement, WindowInfo};
