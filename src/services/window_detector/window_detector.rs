use crate::config::Config;
use crate::error::Result;
use crate::events::{ActiveWindow, IdentifyBy, WindowFocus};
use crate::keyheat_error;
use crate::services::capture::{CaptureSource, FeedSink};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::kdotool::KdotoolDetector;
use super::sway::SwayDetector;
use super::wmctrl::WmctrlDetector;
use super::xdotool::XdotoolDetector;

/// Пауза, если ни одна утилита не отвечает
const RETRY_PAUSE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingMethod {
    Kdotool,
    Xdotool,
    Wmctrl,
    Sway,
}

impl WorkingMethod {
    const AUTO_ORDER: [WorkingMethod; 4] = [
        WorkingMethod::Kdotool,
        WorkingMethod::Xdotool,
        WorkingMethod::Wmctrl,
        WorkingMethod::Sway,
    ];

    /// Кандидаты для значения `window.detection_method`
    pub fn candidates(detection_method: &str) -> Result<Vec<WorkingMethod>> {
        match detection_method {
            "auto" => Ok(Self::AUTO_ORDER.to_vec()),
            "kdotool" => Ok(vec![WorkingMethod::Kdotool]),
            "xdotool" => Ok(vec![WorkingMethod::Xdotool]),
            "wmctrl" => Ok(vec![WorkingMethod::Wmctrl]),
            "sway" => Ok(vec![WorkingMethod::Sway]),
            other => Err(keyheat_error!(
                internal,
                "Неизвестный метод детекции окон: {}",
                other
            )),
        }
    }
}

pub struct RealWindowDetector {
    candidates: Vec<WorkingMethod>,
    polling_interval: Duration,
    identify_by: IdentifyBy,
    working_method: Option<WorkingMethod>,
    current_window: Option<String>,

    // Детекторы утилит
    kdotool: KdotoolDetector,
    xdotool: XdotoolDetector,
    wmctrl: WmctrlDetector,
    sway: SwayDetector,
}

impl RealWindowDetector {
    pub fn new(config: &Config) -> Result<Self> {
        info!("Инициализация RealWindowDetector");

        let candidates = WorkingMethod::candidates(&config.window.detection_method)?;
        if let Ok(session) = std::env::var("XDG_SESSION_TYPE") {
            info!("Тип сессии: {}", session);
        }

        Ok(Self {
            candidates,
            polling_interval: config.polling_interval(),
            identify_by: config.window.identify_by,
            working_method: None,
            current_window: None,
            kdotool: KdotoolDetector::new(),
            xdotool: XdotoolDetector::new(),
            wmctrl: WmctrlDetector::new(),
            sway: SwayDetector::new(),
        })
    }

    async fn detect_working_method(&self) -> Result<WorkingMethod> {
        info!("Определяем рабочий метод детекции окон...");

        for method in &self.candidates {
            let result = match method {
                WorkingMethod::Kdotool => self.kdotool.test().await,
                WorkingMethod::Xdotool => self.xdotool.test().await,
                WorkingMethod::Wmctrl => self.wmctrl.test().await,
                WorkingMethod::Sway => self.sway.test().await,
            };
            match result {
                Ok(()) => {
                    info!("Используем {:?}", method);
                    return Ok(*method);
                }
                Err(e) => debug!("{:?} не работает: {}", method, e),
            }
        }

        Err(keyheat_error!(
            service_unavailable,
            "Ни один метод детекции окон не работает"
        ))
    }

    async fn get_window_by_method(&self, method: WorkingMethod) -> Result<ActiveWindow> {
        match method {
            WorkingMethod::Kdotool => self.kdotool.get_active_window().await,
            WorkingMethod::Xdotool => self.xdotool.get_active_window().await,
            WorkingMethod::Wmctrl => self.wmctrl.get_active_window().await,
            WorkingMethod::Sway => self.sway.get_active_window().await,
        }
    }

    /// Идентификатор нового окна, если фокус сменился
    fn focus_change(&mut self, window: &ActiveWindow) -> Option<String> {
        let identifier = window.identifier(self.identify_by);
        if identifier.is_empty() || self.current_window.as_deref() == Some(identifier) {
            return None;
        }
        self.current_window = Some(identifier.to_string());
        Some(identifier.to_string())
    }

    async fn run_polling(mut self, mut sink: FeedSink<WindowFocus>) -> Result<()> {
        let mut ticker = interval(self.polling_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = sink.stopped() => break,
                _ = ticker.tick() => {}
            }

            let method = match self.working_method {
                Some(method) => method,
                None => match self.detect_working_method().await {
                    Ok(method) => {
                        self.working_method = Some(method);
                        sink.set_ready(true);
                        method
                    }
                    Err(e) => {
                        sink.set_ready(false);
                        error!("{}. Приостанавливаем детекцию на {:?}", e, RETRY_PAUSE);
                        tokio::select! {
                            _ = sink.stopped() => break,
                            _ = tokio::time::sleep(RETRY_PAUSE) => {}
                        }
                        continue;
                    }
                },
            };

            match self.get_window_by_method(method).await {
                Ok(window) => {
                    if let Some(identifier) = self.focus_change(&window) {
                        info!("Смена активного окна на: {}", window);
                        if !sink.emit(WindowFocus::new(identifier)) {
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!("Рабочий метод {:?} перестал работать: {}. Переопределяем...", method, e);
                    self.working_method = None;
                    sink.set_ready(false);
                }
            }
        }

        Ok(())
    }
}

impl Drop for RealWindowDetector {
    fn drop(&mut self) {
        info!("RealWindowDetector завершает работу");
    }
}

#[async_trait::async_trait]
impl CaptureSource<WindowFocus> for RealWindowDetector {
    fn name(&self) -> &'static str {
        "window"
    }

    async fn run(self: Box<Self>, sink: FeedSink<WindowFocus>) -> Result<()> {
        info!("RealWindowDetector запущен, кандидаты: {:?}", self.candidates);
        (*self).run_polling(sink).await
    }
}
