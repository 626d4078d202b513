pub mod keyboard;
pub mod mouse;
pub mod window;

pub use keyboard::{KeyCode, KeyPress};
pub use mouse::{MouseAction, MouseButton, MouseEvent, Position, ScrollDirection};
pub use window::{ActiveWindow, IdentifyBy, WindowFocus};

use std::time::Instant;

/// Любое событие от источников захвата
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    KeyPress(KeyPress),
    Mouse(MouseEvent),
    WindowFocusChanged(WindowFocus),
}

impl CaptureEvent {
    pub fn timestamp(&self) -> Instant {
        match self {
            CaptureEvent::KeyPress(press) => press.timestamp,
            CaptureEvent::Mouse(event) => event.timestamp,
            CaptureEvent::WindowFocusChanged(focus) => focus.timestamp,
        }
    }
}

impl From<KeyPress> for CaptureEvent {
    fn from(press: KeyPress) -> Self {
        CaptureEvent::KeyPress(press)
    }
}

impl From<MouseEvent> for CaptureEvent {
    fn from(event: MouseEvent) -> Self {
        CaptureEvent::Mouse(event)
    }
}

impl From<WindowFocus> for CaptureEvent {
    fn from(focus: WindowFocus) -> Self {
        CaptureEvent::WindowFocusChanged(focus)
    }
}
