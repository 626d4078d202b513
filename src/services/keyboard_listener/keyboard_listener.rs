use crate::config::Config;
use crate::error::{KeyheatError, Result};
use crate::events::{KeyCode, KeyPress};
use crate::services::capture::{CaptureSource, FeedSink};
use crate::trace_if_enabled;
use crate::utils::DeviceFinder;
use evdev::{Device, EventType};
use tracing::{error, info};

/// Коды от BTN_MISC и выше относятся к кнопкам мыши/джойстика
const BTN_MISC: u16 = 0x100;

pub struct RealKeyboardListener {
    device: Device,
    description: String,
}

impl RealKeyboardListener {
    pub fn new(config: &Config) -> Result<Self> {
        info!("Инициализация RealKeyboardListener");

        let device_path = DeviceFinder::find_keyboard_device(&config.input.keyboard_device)?;
        let description = DeviceFinder::describe(&device_path);

        // Устройство не захватывается эксклюзивно: мы только наблюдаем
        let device = Device::open(&device_path).map_err(|e| {
            KeyheatError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        info!("Клавиатура: {}", description);
        Ok(Self {
            device,
            description,
        })
    }

    /// Нажатие клавиши из сырого события evdev; отпускания и автоповтор не считаются
    pub fn key_press_code(event_type: EventType, code: u16, value: i32) -> Option<KeyCode> {
        if event_type == EventType::KEY && value == 1 && code != 0 && code < BTN_MISC {
            Some(KeyCode::new(code))
        } else {
            None
        }
    }

    /// Блокирующее чтение; остановка проверяется между пачками событий
    fn read_loop(mut self, sink: FeedSink<KeyPress>) -> Result<()> {
        sink.set_ready(true);
        info!("RealKeyboardListener запущен ({})", self.description);

        while !sink.is_stopped() {
            let events = match self.device.fetch_events() {
                Ok(events) => events.collect::<Vec<_>>(),
                Err(e) => {
                    error!("Ошибка чтения событий клавиатуры: {}", e);
                    return Err(KeyheatError::Io(e));
                }
            };

            for event in events {
                if let Some(code) =
                    Self::key_press_code(event.event_type(), event.code(), event.value())
                {
                    trace_if_enabled!("Нажатие клавиши: {}", code);
                    if !sink.emit(KeyPress::new(code)) {
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl CaptureSource<KeyPress> for RealKeyboardListener {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    async fn run(self: Box<Self>, sink: FeedSink<KeyPress>) -> Result<()> {
        tokio::task::spawn_blocking(move || (*self).read_loop(sink))
            .await
            .map_err(|e| KeyheatError::Internal(format!("Поток чтения клавиатуры упал: {}", e)))?
    }
}

impl Drop for RealKeyboardListener {
    fn drop(&mut self) {
        info!("RealKeyboardListener завершает работу");
    }
}
