use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// Кнопка мыши
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
            MouseButton::Back => "back",
            MouseButton::Forward => "forward",
        }
    }

    /// Кнопка по коду evdev (BTN_LEFT..BTN_EXTRA)
    pub fn from_evdev(code: u16) -> Option<Self> {
        match code {
            0x110 => Some(MouseButton::Left),
            0x111 => Some(MouseButton::Right),
            0x112 => Some(MouseButton::Middle),
            0x113 => Some(MouseButton::Back),
            0x114 => Some(MouseButton::Forward),
            _ => None,
        }
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            "back" => Ok(MouseButton::Back),
            "forward" => Ok(MouseButton::Forward),
            other => Err(format!("Неизвестная кнопка мыши: {}", other)),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Направление прокрутки колеса
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }

    /// Направление по значению REL_WHEEL (положительное = вверх)
    pub fn vertical(value: i32) -> Option<Self> {
        match value.signum() {
            1 => Some(ScrollDirection::Up),
            -1 => Some(ScrollDirection::Down),
            _ => None,
        }
    }

    /// Направление по значению REL_HWHEEL (положительное = вправо)
    pub fn horizontal(value: i32) -> Option<Self> {
        match value.signum() {
            1 => Some(ScrollDirection::Right),
            -1 => Some(ScrollDirection::Left),
            _ => None,
        }
    }
}

impl FromStr for ScrollDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(ScrollDirection::Up),
            "down" => Ok(ScrollDirection::Down),
            "left" => Ok(ScrollDirection::Left),
            "right" => Ok(ScrollDirection::Right),
            other => Err(format!("Неизвестное направление прокрутки: {}", other)),
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Позиция указателя
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        dx.hypot(dy)
    }
}

/// Действие мыши
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    ButtonPress(MouseButton),
    Scroll(ScrollDirection),
    Move(Position),
}

/// Событие мыши, зафиксированное источником
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub action: MouseAction,
    pub timestamp: Instant,
}

impl MouseEvent {
    pub fn new(action: MouseAction) -> Self {
        Self::at(action, Instant::now())
    }

    pub fn at(action: MouseAction, timestamp: Instant) -> Self {
        Self { action, timestamp }
    }

    pub fn button(button: MouseButton) -> Self {
        Self::new(MouseAction::ButtonPress(button))
    }

    pub fn scroll(direction: ScrollDirection) -> Self {
        Self::new(MouseAction::Scroll(direction))
    }

    pub fn moved(position: Position) -> Self {
        Self::new(MouseAction::Move(position))
    }
}

impl fmt::Display for MouseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            MouseAction::ButtonPress(button) => write!(f, "click {}", button),
            MouseAction::Scroll(direction) => write!(f, "scroll {}", direction),
            MouseAction::Move(pos) => write!(f, "move ({}, {})", pos.x, pos.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_from_evdev() {
        assert_eq!(MouseButton::from_evdev(0x110), Some(MouseButton::Left));
        assert_eq!(MouseButton::from_evdev(0x112), Some(MouseButton::Middle));
        assert_eq!(MouseButton::from_evdev(30), None);
    }

    #[test]
    fn test_labels_parse_back() {
        for button in [MouseButton::Left, MouseButton::Forward] {
            assert_eq!(button.as_str().parse::<MouseButton>(), Ok(button));
        }
        assert!("wheel".parse::<ScrollDirection>().is_err());
    }

    #[test]
    fn test_scroll_direction_from_wheel_value() {
        assert_eq!(ScrollDirection::vertical(1), Some(ScrollDirection::Up));
        assert_eq!(ScrollDirection::vertical(-2), Some(ScrollDirection::Down));
        assert_eq!(ScrollDirection::vertical(0), None);
        assert_eq!(ScrollDirection::horizontal(1), Some(ScrollDirection::Right));
    }

    #[test]
    fn test_position_distance() {
        let a = Position::new(0, 0);
        let b = Position::new(3, 4);
        assert!((a.distance_to(&b) - 5.0).abs() < f64::EPSILON);
    }
}
