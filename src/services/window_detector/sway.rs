use super::command::run_tool;
use crate::error::Result;
use crate::events::ActiveWindow;
use crate::keyheat_error;
use serde_json::Value;

pub struct SwayDetector;

impl SwayDetector {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        run_tool("swaymsg", &["-t", "get_version"]).await.map(|_| ())
    }

    pub async fn get_active_window(&self) -> Result<ActiveWindow> {
        let tree = run_tool("swaymsg", &["-t", "get_tree"]).await?;
        let tree: Value = serde_json::from_str(&tree)?;

        find_focused(&tree)
            .ok_or_else(|| keyheat_error!(service_unavailable, "Активное окно в Sway не найдено"))
    }
}

/// Поиск в глубину сфокусированного контейнера-окна
fn find_focused(node: &Value) -> Option<ActiveWindow> {
    let is_window = matches!(
        node.get("type").and_then(Value::as_str),
        Some("con") | Some("floating_con")
    );

    if is_window && node.get("focused").and_then(Value::as_bool) == Some(true) {
        let title = node.get("name").and_then(Value::as_str).unwrap_or_default();
        // Wayland-клиенты дают app_id, XWayland - window_properties.class
        let class = node
            .get("app_id")
            .and_then(Value::as_str)
            .or_else(|| node.pointer("/window_properties/class").and_then(Value::as_str))
            .unwrap_or_default();
        return Some(ActiveWindow::new(title.to_string()).with_class(class.to_string()));
    }

    ["nodes", "floating_nodes"]
        .iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_array))
        .flatten()
        .find_map(find_focused)
}
