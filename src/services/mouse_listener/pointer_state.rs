//! Разбор сырых событий мыши.
//!
//! Ядро не знает абсолютных координат курсора, поэтому позиция здесь
//! виртуальная: сумма относительных смещений с момента запуска.

use crate::events::{MouseAction, MouseButton, Position, ScrollDirection};
use evdev::EventType;

const REL_X: u16 = 0x00;
const REL_Y: u16 = 0x01;
const REL_HWHEEL: u16 = 0x06;
const REL_WHEEL: u16 = 0x08;
const SYN_REPORT: u16 = 0x00;

#[derive(Debug, Default)]
pub struct PointerState {
    position: Position,
    reported: Position,
    record_movement: bool,
}

impl PointerState {
    pub fn new(record_movement: bool) -> Self {
        Self {
            record_movement,
            ..Self::default()
        }
    }

    /// Одно событие evdev. Перемещение отдаётся только на SYN_REPORT,
    /// чтобы X и Y одного отчёта дали одну точку.
    pub fn handle(&mut self, event_type: EventType, code: u16, value: i32) -> Option<MouseAction> {
        match event_type {
            EventType::KEY if value == 1 => MouseButton::from_evdev(code).map(MouseAction::ButtonPress),
            EventType::RELATIVE => match code {
                REL_X => {
                    self.position.x = self.position.x.saturating_add(value);
                    None
                }
                REL_Y => {
                    self.position.y = self.position.y.saturating_add(value);
                    None
                }
                REL_WHEEL => ScrollDirection::vertical(value).map(MouseAction::Scroll),
                REL_HWHEEL => ScrollDirection::horizontal(value).map(MouseAction::Scroll),
                // REL_WHEEL_HI_RES и REL_HWHEEL_HI_RES дублируют обычные колёса
                _ => None,
            },
            EventType::SYNCHRONIZATION if code == SYN_REPORT => {
                if self.position == self.reported {
                    return None;
                }
                self.reported = self.position;
                self.record_movement.then_some(MouseAction::Move(self.position))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_only_on_press() {
        let mut state = PointerState::new(true);
        assert_eq!(
            state.handle(EventType::KEY, 0x110, 1),
            Some(MouseAction::ButtonPress(MouseButton::Left))
        );
        assert_eq!(state.handle(EventType::KEY, 0x110, 0), None);
        assert_eq!(
            state.handle(EventType::KEY, 0x113, 1),
            Some(MouseAction::ButtonPress(MouseButton::Back))
        );
        // BTN_TOUCH и прочие кнопки не считаются
        assert_eq!(state.handle(EventType::KEY, 0x14a, 1), None);
    }

    #[test]
    fn test_wheel_directions() {
        let mut state = PointerState::new(true);
        assert_eq!(
            state.handle(EventType::RELATIVE, REL_WHEEL, 1),
            Some(MouseAction::Scroll(ScrollDirection::Up))
        );
        assert_eq!(
            state.handle(EventType::RELATIVE, REL_WHEEL, -1),
            Some(MouseAction::Scroll(ScrollDirection::Down))
        );
        assert_eq!(
            state.handle(EventType::RELATIVE, REL_HWHEEL, 1),
            Some(MouseAction::Scroll(ScrollDirection::Right))
        );
        assert_eq!(state.handle(EventType::RELATIVE, 0x0b, 120), None);
    }

    #[test]
    fn test_movement_reported_once_per_frame() {
        let mut state = PointerState::new(true);
        assert_eq!(state.handle(EventType::RELATIVE, REL_X, 3), None);
        assert_eq!(state.handle(EventType::RELATIVE, REL_Y, -4), None);
        assert_eq!(
            state.handle(EventType::SYNCHRONIZATION, SYN_REPORT, 0),
            Some(MouseAction::Move(Position::new(3, -4)))
        );
        // кадр без смещения
        assert_eq!(state.handle(EventType::SYNCHRONIZATION, SYN_REPORT, 0), None);

        state.handle(EventType::RELATIVE, REL_X, 1);
        assert_eq!(
            state.handle(EventType::SYNCHRONIZATION, SYN_REPORT, 0),
            Some(MouseAction::Move(Position::new(4, -4)))
        );
    }

    #[test]
    fn test_movement_can_be_disabled() {
        let mut state = PointerState::new(false);
        state.handle(EventType::RELATIVE, REL_X, 10);
        assert_eq!(state.handle(EventType::SYNCHRONIZATION, SYN_REPORT, 0), None);
        // кнопки и колесо при этом считаются
        assert_eq!(
            state.handle(EventType::KEY, 0x112, 1),
            Some(MouseAction::ButtonPress(MouseButton::Middle))
        );
    }
}
