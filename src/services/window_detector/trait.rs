use crate::config::Config;
use crate::error::Result;
use crate::events::WindowFocus;
use crate::services::capture::CaptureSource;
use tokio::time::Duration;

/// Создать детектор окон: настоящий или синтетический при dry_run
pub fn create_window_detector(
    config: &Config,
    dry_run: bool,
) -> Result<Box<dyn CaptureSource<WindowFocus>>> {
    if dry_run {
        Ok(Box::new(super::dry_window_detector::DryRunDetector::new(
            Duration::from_secs(10),
            config.window.identify_by,
        )))
    } else {
        Ok(Box::new(super::window_detector::RealWindowDetector::new(
            config,
        )?))
    }
}
