use super::pointer_state::PointerState;
use crate::config::Config;
use crate::error::{KeyheatError, Result};
use crate::events::MouseEvent;
use crate::services::capture::{CaptureSource, FeedSink};
use crate::trace_if_enabled;
use crate::utils::DeviceFinder;
use evdev::Device;
use tracing::{error, info};

pub struct RealMouseListener {
    device: Device,
    description: String,
    pointer: PointerState,
}

impl RealMouseListener {
    pub fn new(config: &Config) -> Result<Self> {
        info!("Инициализация RealMouseListener");

        let device_path = DeviceFinder::find_mouse_device(&config.input.mouse_device)?;
        let description = DeviceFinder::describe(&device_path);

        let device = Device::open(&device_path).map_err(|e| {
            KeyheatError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        info!("Мышь: {}", description);
        Ok(Self {
            device,
            description,
            pointer: PointerState::new(config.capture.record_movement),
        })
    }

    fn read_loop(mut self, sink: FeedSink<MouseEvent>) -> Result<()> {
        sink.set_ready(true);
        info!("RealMouseListener запущен ({})", self.description);

        while !sink.is_stopped() {
            let events = match self.device.fetch_events() {
                Ok(events) => events.collect::<Vec<_>>(),
                Err(e) => {
                    error!("Ошибка чтения событий мыши: {}", e);
                    return Err(KeyheatError::Io(e));
                }
            };

            for event in events {
                let Some(action) =
                    self.pointer
                        .handle(event.event_type(), event.code(), event.value())
                else {
                    continue;
                };

                let mouse_event = MouseEvent::new(action);
                trace_if_enabled!("Событие мыши: {}", mouse_event);
                if !sink.emit(mouse_event) {
                    return Ok(());
                }
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl CaptureSource<MouseEvent> for RealMouseListener {
    fn name(&self) -> &'static str {
        "mouse"
    }

    async fn run(self: Box<Self>, sink: FeedSink<MouseEvent>) -> Result<()> {
        tokio::task::spawn_blocking(move || (*self).read_loop(sink))
            .await
            .map_err(|e| KeyheatError::Internal(format!("Поток чтения мыши упал: {}", e)))?
    }
}

impl Drop for RealMouseListener {
    fn drop(&mut self) {
        info!("RealMouseListener завершает работу");
    }
}
