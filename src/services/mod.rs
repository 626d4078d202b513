pub mod capture;
pub mod keyboard_listener;
pub mod mouse_listener;
pub mod recorder;
pub mod window_detector;

pub use keyboard_listener::create_keyboard_listener;
pub use mouse_listener::create_mouse_listener;
pub use recorder::Recorder;
pub use window_detector::create_window_detector;
