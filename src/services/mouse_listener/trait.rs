use crate::config::Config;
use crate::error::Result;
use crate::events::MouseEvent;
use crate::services::capture::CaptureSource;
use tokio::time::Duration;

/// Создать слушатель мыши: настоящий или синтетический при dry_run
pub fn create_mouse_listener(
    config: &Config,
    dry_run: bool,
) -> Result<Box<dyn CaptureSource<MouseEvent>>> {
    if dry_run {
        Ok(Box::new(super::dry_mouse_listener::DryRunMouseListener::new(
            Duration::from_millis(400),
            config.capture.record_movement,
        )))
    } else {
        Ok(Box::new(super::mouse_listener::RealMouseListener::new(
            config,
        )?))
    }
}
