use crate::config::Config;
use crate::error::Result;
use crate::events::KeyPress;
use crate::services::capture::CaptureSource;
use tokio::time::Duration;

/// Создать слушатель клавиатуры: настоящий или синтетический при dry_run
pub fn create_keyboard_listener(
    config: &Config,
    dry_run: bool,
) -> Result<Box<dyn CaptureSource<KeyPress>>> {
    if dry_run {
        Ok(Box::new(super::dry_keyboard_listener::DryRunKeyboardListener::new(
            Duration::from_millis(250),
        )))
    } else {
        Ok(Box::new(super::keyboard_listener::RealKeyboardListener::new(
            config,
        )?))
    }
}
