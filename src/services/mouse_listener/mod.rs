mod dry_mouse_listener;
mod mouse_listener;
mod pointer_state;
mod r#trait;

pub use self::r#trait::create_mouse_listener;
