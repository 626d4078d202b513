use crate::events::{KeyCode, MouseButton, Position, ScrollDirection};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Накопленное перемещение указателя
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MouseMovement {
    pub samples: u64,
    pub distance: f64,
    pub last_position: Option<Position>,
}

impl MouseMovement {
    fn record(&mut self, position: Position) {
        if let Some(last) = self.last_position {
            self.distance += last.distance_to(&position);
        }
        self.samples += 1;
        self.last_position = Some(position);
    }
}

/// Учёт времени в фокусе
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusTime {
    pub times_focused: u64,
    pub accumulated: Duration,
    focused_since: Option<Instant>,
}

impl FocusTime {
    pub fn restored(times_focused: u64, accumulated: Duration) -> Self {
        Self {
            times_focused,
            accumulated,
            focused_since: None,
        }
    }
}

/// Статистика взаимодействия с одним окном
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    pub id: String,
    pub key_presses: BTreeMap<KeyCode, u64>,
    pub mouse_buttons: BTreeMap<MouseButton, u64>,
    pub scrolls: BTreeMap<ScrollDirection, u64>,
    pub movement: MouseMovement,
    pub focus: FocusTime,
}

impl WindowInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key_presses: BTreeMap::new(),
            mouse_buttons: BTreeMap::new(),
            scrolls: BTreeMap::new(),
            movement: MouseMovement::default(),
            focus: FocusTime::default(),
        }
    }

    pub fn add_key_press(&mut self, key: KeyCode) {
        *self.key_presses.entry(key).or_insert(0) += 1;
    }

    pub fn add_mouse_button_press(&mut self, button: MouseButton) {
        *self.mouse_buttons.entry(button).or_insert(0) += 1;
    }

    pub fn add_scroll(&mut self, direction: ScrollDirection) {
        *self.scrolls.entry(direction).or_insert(0) += 1;
    }

    pub fn add_mouse_movement(&mut self, position: Position) {
        self.movement.record(position);
    }

    pub fn window_focused(&mut self, at: Instant) {
        if self.focus.focused_since.is_none() {
            self.focus.focused_since = Some(at);
            self.focus.times_focused += 1;
        }
    }

    pub fn window_unfocused(&mut self, at: Instant) {
        if let Some(since) = self.focus.focused_since.take() {
            self.focus.accumulated += at.saturating_duration_since(since);
        }
        // Следующий фокус начнёт траекторию заново
        self.movement.last_position = None;
    }

    pub fn is_focused(&self) -> bool {
        self.focus.focused_since.is_some()
    }

    /// Время в фокусе с учётом текущего незакрытого интервала
    pub fn focused_duration(&self, now: Instant) -> Duration {
        let running = self
            .focus
            .focused_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();
        self.focus.accumulated + running
    }

    pub fn key_count(&self, key: KeyCode) -> u64 {
        self.key_presses.get(&key).copied().unwrap_or(0)
    }

    pub fn total_key_presses(&self) -> u64 {
        self.key_presses.values().sum()
    }

    pub fn total_clicks(&self) -> u64 {
        self.mouse_buttons.values().sum()
    }

    pub fn total_scrolls(&self) -> u64 {
        self.scrolls.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.key_presses.is_empty()
            && self.mouse_buttons.is_empty()
            && self.scrolls.is_empty()
            && self.movement.samples == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let mut info = WindowInfo::new("Editor");
        info.add_key_press(KeyCode(30));
        info.add_key_press(KeyCode(30));
        info.add_key_press(KeyCode(31));
        info.add_mouse_button_press(MouseButton::Left);
        info.add_scroll(ScrollDirection::Down);

        assert_eq!(info.key_count(KeyCode(30)), 2);
        assert_eq!(info.key_count(KeyCode(32)), 0);
        assert_eq!(info.total_key_presses(), 3);
        assert_eq!(info.total_clicks(), 1);
        assert_eq!(info.total_scrolls(), 1);
        assert!(!info.is_empty());
    }

    #[test]
    fn test_movement_distance_resets_between_focus() {
        let start = Instant::now();
        let mut info = WindowInfo::new("Browser");
        info.window_focused(start);
        info.add_mouse_movement(Position::new(0, 0));
        info.add_mouse_movement(Position::new(3, 4));
        info.window_unfocused(start);
        info.window_focused(start);
        info.add_mouse_movement(Position::new(100, 100));

        assert_eq!(info.movement.samples, 3);
        assert!((info.movement.distance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_focus_duration_accumulates() {
        let start = Instant::now();
        let mut info = WindowInfo::new("Terminal");

        info.window_focused(start);
        assert!(info.is_focused());
        info.window_unfocused(start + Duration::from_secs(5));
        assert!(!info.is_focused());

        info.window_focused(start + Duration::from_secs(10));
        // повторный focus без unfocus не открывает второй интервал
        info.window_focused(start + Duration::from_secs(11));

        assert_eq!(info.focus.times_focused, 2);
        assert_eq!(
            info.focused_duration(start + Duration::from_secs(12)),
            Duration::from_secs(7)
        );
    }
}
