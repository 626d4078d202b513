use crate::error::Result;
use crate::events::{ActiveWindow, IdentifyBy, WindowFocus};
use crate::services::capture::{CaptureSource, FeedSink};
use tokio::time::{interval, Duration};
use tracing::info;

pub struct DryRunDetector {
    period: Duration,
    identify_by: IdentifyBy,
}

impl DryRunDetector {
    pub fn new(period: Duration, identify_by: IdentifyBy) -> Self {
        Self {
            period,
            identify_by,
        }
    }

    fn fake_windows() -> Vec<ActiveWindow> {
        [
            ("Terminal - dry_run", "Konsole"),
            ("Browser - dry_run", "firefox"),
            ("Editor - dry_run", "code"),
            ("Game - dry_run", "steam"),
        ]
        .into_iter()
        .map(|(title, class)| ActiveWindow::new(title.to_string()).with_class(class.to_string()))
        .collect()
    }
}

#[async_trait::async_trait]
impl CaptureSource<WindowFocus> for DryRunDetector {
    fn name(&self) -> &'static str {
        "window (dry-run)"
    }

    async fn run(self: Box<Self>, mut sink: FeedSink<WindowFocus>) -> Result<()> {
        info!("Dry-run режим - WindowDetector работает в режиме эмуляции");

        let fake_windows = Self::fake_windows();
        let mut ticker = interval(self.period);
        sink.set_ready(true);

        for fake_window in fake_windows.iter().cycle() {
            tokio::select! {
                _ = sink.stopped() => break,
                _ = ticker.tick() => {}
            }

            info!("Dry-run: эмулируем смену окна на: {}", fake_window);
            if !sink.emit(WindowFocus::new(fake_window.identifier(self.identify_by))) {
                break;
            }
        }

        Ok(())
    }
}
