use crate::error::Result;
use crate::events::{KeyCode, KeyPress};
use crate::services::capture::{CaptureSource, FeedSink};
use tokio::time::{interval, Duration};
use tracing::{debug, info};

const SAMPLE_TEXT: &str = "the quick brown fox jumps over the lazy dog";

pub struct DryRunKeyboardListener {
    period: Duration,
}

impl DryRunKeyboardListener {
    pub fn new(period: Duration) -> Self {
        info!("Инициализация DryRunKeyboardListener");
        Self { period }
    }

    fn sample_keys() -> Vec<KeyCode> {
        SAMPLE_TEXT
            .chars()
            .filter_map(|c| {
                let name = if c == ' ' { "space".to_string() } else { c.to_string() };
                KeyCode::parse(&name)
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl CaptureSource<KeyPress> for DryRunKeyboardListener {
    fn name(&self) -> &'static str {
        "keyboard (dry-run)"
    }

    async fn run(self: Box<Self>, mut sink: FeedSink<KeyPress>) -> Result<()> {
        info!("Dry-run режим - KeyboardListener работает в режиме эмуляции");
        let keys = Self::sample_keys();
        let mut ticker = interval(self.period);
        sink.set_ready(true);

        for key in keys.iter().cycle() {
            tokio::select! {
                _ = sink.stopped() => break,
                _ = ticker.tick() => {}
            }
            debug!("Dry-run: нажатие {}", key);
            if !sink.emit(KeyPress::new(*key)) {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_keys_cover_text() {
        let keys = DryRunKeyboardListener::sample_keys();
        assert_eq!(keys.len(), SAMPLE_TEXT.len());
        assert_eq!(keys[3], KeyCode::parse("space").unwrap());
    }
}
