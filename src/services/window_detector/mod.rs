//! WindowDetector: только определение активного окна и выдача `WindowFocus`.
//!
//! Подсчёт статистики здесь не ведётся, атрибуция событий целиком на агрегаторе.

mod command;
mod dry_window_detector;
mod kdotool;
mod sway;
mod window_detector;
mod wmctrl;
mod xdotool;
mod r#trait;

pub use self::r#trait::create_window_detector;
