use crate::error::{KeyheatError, Result};
use evdev::{Device, KeyCode, RelativeAxisCode};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Какое устройство ищем
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Mouse,
}

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти клавиатуру: указанный путь или автопоиск ("auto")
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        Self::find(device_path, DeviceKind::Keyboard)
    }

    /// Найти мышь: указанный путь или автопоиск ("auto")
    pub fn find_mouse_device(device_path: &str) -> Result<PathBuf> {
        Self::find(device_path, DeviceKind::Mouse)
    }

    fn find(device_path: &str, kind: DeviceKind) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство ({:?}): {:?}", kind, path);
                Ok(path)
            } else {
                KeyheatError::device_not_found(format!(
                    "Указанное устройство не найдено: {:?}",
                    path
                ))
            };
        }

        Self::auto_find(kind)
    }

    fn auto_find(kind: DeviceKind) -> Result<PathBuf> {
        info!("Автопоиск устройства ({:?})...", kind);

        let mut candidates: Vec<(PathBuf, u32)> = evdev::enumerate()
            .filter_map(|(path, device)| {
                let priority = Self::priority(&device, kind)?;
                debug!(
                    "Кандидат {:?}: {} (приоритет {})",
                    path,
                    device.name().unwrap_or("Unknown"),
                    priority
                );
                Some((path, priority))
            })
            .collect();

        // Сначала по приоритету, при равенстве по пути
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        match candidates.into_iter().next() {
            Some((path, _)) => {
                info!("Выбрано устройство ({:?}): {:?}", kind, path);
                Ok(path)
            }
            None => KeyheatError::device_not_found(format!(
                "Не найдено доступное устройство ({:?}). \
                 Убедитесь, что пользователь добавлен в группу 'input'",
                kind
            )),
        }
    }

    /// None, если устройство не подходит
    fn priority(device: &Device, kind: DeviceKind) -> Option<u32> {
        let name = device.name().unwrap_or("").to_lowercase();
        match kind {
            DeviceKind::Keyboard => {
                let keys = device.supported_keys()?;
                let basic_keys = keys.contains(KeyCode::KEY_A)
                    && keys.contains(KeyCode::KEY_SPACE)
                    && keys.contains(KeyCode::KEY_ENTER);
                // У настоящей клавиатуры много клавиш
                if !basic_keys || keys.iter().count() <= 20 {
                    return None;
                }
                if name.contains("mouse") || name.contains("touchpad") {
                    return None;
                }
                Some(if name.contains("keyboard") { 100 } else { 10 })
            }
            DeviceKind::Mouse => {
                let axes = device.supported_relative_axes()?;
                let keys = device.supported_keys()?;
                if !(axes.contains(RelativeAxisCode::REL_X)
                    && axes.contains(RelativeAxisCode::REL_Y)
                    && keys.contains(KeyCode::BTN_LEFT))
                {
                    return None;
                }
                let wheel = axes.contains(RelativeAxisCode::REL_WHEEL);
                Some(match (name.contains("mouse"), wheel) {
                    (true, true) => 100,
                    (_, true) => 50,
                    _ => 10,
                })
            }
        }
    }

    pub fn describe(path: &Path) -> String {
        match Device::open(path) {
            Ok(device) => format!("{} ({})", device.name().unwrap_or("Unknown"), path.display()),
            Err(_) => path.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_keyboard_device_with_specific_path() {
        let result = DeviceFinder::find_keyboard_device("/non/existent/path");
        assert!(matches!(result, Err(KeyheatError::DeviceNotFound(_))));
    }

    #[test]
    fn test_find_mouse_device_with_specific_path() {
        let result = DeviceFinder::find_mouse_device("/non/existent/mouse");
        assert!(result.is_err());
    }
}
