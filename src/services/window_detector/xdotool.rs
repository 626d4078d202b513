use super::command::run_tool;
use crate::error::Result;
use crate::events::ActiveWindow;
use crate::keyheat_error;
use tracing::debug;

pub struct XdotoolDetector;

impl XdotoolDetector {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        run_tool("xdotool", &["getactivewindow", "getwindowname"]).await.map(|_| ())
    }

    pub async fn get_active_window(&self) -> Result<ActiveWindow> {
        debug!("Попытка получить активное окно через xdotool");
        let title = run_tool("xdotool", &["getactivewindow", "getwindowname"]).await?;
        if title.is_empty() {
            return Err(keyheat_error!(service_unavailable, "xdotool вернул пустое название"));
        }
        debug!("xdotool получил заголовок окна: '{}'", title);

        let class = match run_tool("xdotool", &["getactivewindow", "getwindowclassname"]).await {
            Ok(class_name) => class_name,
            Err(e) => {
                debug!("Не удалось получить класс окна: {}", e);
                String::new()
            }
        };

        Ok(ActiveWindow::new(title).with_class(class))
    }
}
