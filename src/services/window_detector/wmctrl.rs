use super::command::run_tool;
use crate::error::Result;
use crate::events::ActiveWindow;
use crate::keyheat_error;

pub struct WmctrlDetector;

impl WmctrlDetector {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        run_tool("wmctrl", &["-m"]).await.map(|_| ())
    }

    pub async fn get_active_window(&self) -> Result<ActiveWindow> {
        // wmctrl сам не сообщает активное окно, его id берём у xprop
        let root = run_tool("xprop", &["-root", "_NET_ACTIVE_WINDOW"]).await?;
        let active_id = parse_active_window_id(&root)
            .ok_or_else(|| keyheat_error!(service_unavailable, "xprop: нет активного окна"))?;

        let listing = run_tool("wmctrl", &["-lx"]).await?;
        find_window(&listing, active_id).ok_or_else(|| {
            keyheat_error!(service_unavailable, "Окно 0x{:x} не найдено в wmctrl -lx", active_id)
        })
    }
}

/// `_NET_ACTIVE_WINDOW(WINDOW): window id # 0x3a00007`
fn parse_active_window_id(output: &str) -> Option<u64> {
    let hex = output.rsplit('#').next()?.trim();
    let hex = hex.split([',', ' ']).next()?;
    let id = u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok()?;
    (id != 0).then_some(id)
}

/// Строка `wmctrl -lx`: id, рабочий стол, instance.Class, хост, заголовок
fn find_window(listing: &str, active_id: u64) -> Option<ActiveWindow> {
    listing.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let id = u64::from_str_radix(parts.next()?.trim_start_matches("0x"), 16).ok()?;
        if id != active_id {
            return None;
        }
        let _desktop = parts.next()?;
        let wm_class = parts.next()?;
        let _host = parts.next()?;
        let title = parts.collect::<Vec<_>>().join(" ");

        let class = wm_class.rsplit('.').next().unwrap_or(wm_class).to_string();
        Some(ActiveWindow::new(title).with_class(class))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
0x01e00003  0 konsole.Konsole        host ~ : bash
0x03a00007  0 Navigator.firefox      host Rust docs - Mozilla Firefox
";

    #[test]
    fn test_parse_active_window_id() {
        assert_eq!(
            parse_active_window_id("_NET_ACTIVE_WINDOW(WINDOW): window id # 0x3a00007"),
            Some(0x3a00007)
        );
        assert_eq!(parse_active_window_id("_NET_ACTIVE_WINDOW(WINDOW): window id # 0x0"), None);
        assert_eq!(parse_active_window_id("garbage"), None);
    }

    #[test]
    fn test_find_window_by_id() {
        let window = find_window(LISTING, 0x3a00007).unwrap();
        assert_eq!(window.title, "Rust docs - Mozilla Firefox");
        assert_eq!(window.class, "firefox");

        assert!(find_window(LISTING, 0x42).is_none());
    }
}
