use super::command::run_tool;
use crate::error::Result;
use crate::events::ActiveWindow;
use crate::keyheat_error;
use tracing::debug;

pub struct KdotoolDetector;

impl KdotoolDetector {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        debug!("=== Тестируем kdotool ===");
        let window = self.get_active_window().await?;
        debug!("=== kdotool работает: {} ===", window);
        Ok(())
    }

    pub async fn get_active_window(&self) -> Result<ActiveWindow> {
        let window_id = run_tool("kdotool", &["getactivewindow"]).await?;
        if window_id.is_empty() {
            return Err(keyheat_error!(service_unavailable, "kdotool не вернул id окна"));
        }

        let title = run_tool("kdotool", &["getwindowname", &window_id]).await?;
        if title.is_empty() {
            return Err(keyheat_error!(service_unavailable, "kdotool вернул пустое название"));
        }

        // Класс не обязателен: старые версии kdotool его не умеют
        let class = run_tool("kdotool", &["getwindowclassname", &window_id]).await.unwrap_or_default();

        Ok(ActiveWindow::new(title).with_class(class))
    }
}
