use crate::error::Result;
use crate::events::{MouseButton, MouseEvent, Position, ScrollDirection};
use crate::services::capture::{CaptureSource, FeedSink};
use tokio::time::{interval, Duration};
use tracing::{debug, info};

pub struct DryRunMouseListener {
    period: Duration,
    record_movement: bool,
}

impl DryRunMouseListener {
    pub fn new(period: Duration, record_movement: bool) -> Self {
        info!("Инициализация DryRunMouseListener");
        Self {
            period,
            record_movement,
        }
    }

    /// Шаг эмуляции: движение по кругу, изредка клик или прокрутка
    fn synthetic(step: u64, record_movement: bool) -> Option<MouseEvent> {
        match step % 8 {
            3 => Some(MouseEvent::button(MouseButton::Left)),
            5 => Some(MouseEvent::scroll(ScrollDirection::Down)),
            7 => Some(MouseEvent::button(MouseButton::Right)),
            _ if record_movement => {
                let angle = (step % 64) as f64 / 64.0 * std::f64::consts::TAU;
                Some(MouseEvent::moved(Position::new(
                    (angle.cos() * 200.0) as i32,
                    (angle.sin() * 200.0) as i32,
                )))
            }
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSource<MouseEvent> for DryRunMouseListener {
    fn name(&self) -> &'static str {
        "mouse (dry-run)"
    }

    async fn run(self: Box<Self>, mut sink: FeedSink<MouseEvent>) -> Result<()> {
        info!("Dry-run режим - MouseListener работает в режиме эмуляции");
        let mut ticker = interval(self.period);
        sink.set_ready(true);

        for step in 0u64.. {
            tokio::select! {
                _ = sink.stopped() => break,
                _ = ticker.tick() => {}
            }
            let Some(event) = Self::synthetic(step, self.record_movement) else {
                continue;
            };
            debug!("Dry-run: {}", event);
            if !sink.emit(event) {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MouseAction;

    #[test]
    fn test_synthetic_sequence() {
        assert_eq!(
            DryRunMouseListener::synthetic(3, true).map(|e| e.action),
            Some(MouseAction::ButtonPress(MouseButton::Left))
        );
        assert!(matches!(
            DryRunMouseListener::synthetic(0, true).map(|e| e.action),
            Some(MouseAction::Move(_))
        ));
        assert!(DryRunMouseListener::synthetic(0, false).is_none());
    }
}
