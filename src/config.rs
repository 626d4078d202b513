use crate::events::IdentifyBy;
use crate::stats::UnattributedPolicy;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub window: WindowConfig,
    pub capture: CaptureConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Путь к устройству клавиатуры или "auto"
    pub keyboard_device: String,
    /// Путь к устройству мыши или "auto"
    pub mouse_device: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    /// "auto" | "kdotool" | "xdotool" | "wmctrl" | "sway"
    pub detection_method: String,
    pub polling_interval_ms: u64,
    pub identify_by: IdentifyBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnattributedMode {
    Drop,
    Buffer,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    pub unattributed: UnattributedMode,
    pub pending_limit: usize,
    pub record_movement: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub checkpoint_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
                filter: String::new(),
            },
            input: InputConfig {
                keyboard_device: "auto".to_string(),
                mouse_device: "auto".to_string(),
            },
            window: WindowConfig {
                detection_method: "auto".to_string(),
                polling_interval_ms: 500,
                identify_by: IdentifyBy::Title,
            },
            capture: CaptureConfig {
                unattributed: UnattributedMode::Drop,
                pending_limit: 1024,
                record_movement: true,
            },
            storage: StorageConfig {
                database_path: PathBuf::from("keyheat.db"),
                checkpoint_interval_secs: 60,
            },
        }
    }
}

impl Config {
    /// Значения по умолчанию, поверх них TOML-файл (если есть), поверх него KEYHEAT_* переменные
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("KEYHEAT_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        match self.window.detection_method.as_str() {
            "auto" | "kdotool" | "xdotool" | "wmctrl" | "sway" => {}
            _ => anyhow::bail!(
                "Неверный метод детекции окон: {}",
                self.window.detection_method
            ),
        }

        if self.window.polling_interval_ms < 100 {
            anyhow::bail!("polling_interval_ms должно быть минимум 100");
        }

        if self.capture.unattributed == UnattributedMode::Buffer && self.capture.pending_limit == 0 {
            anyhow::bail!("pending_limit должно быть больше 0 в режиме buffer");
        }

        if self.storage.checkpoint_interval_secs == 0 {
            anyhow::bail!("checkpoint_interval_secs должно быть больше 0");
        }

        if self.storage.database_path.as_os_str().is_empty() {
            anyhow::bail!("Не указан путь к базе данных");
        }

        Ok(())
    }

    pub fn unattributed_policy(&self) -> UnattributedPolicy {
        match self.capture.unattributed {
            UnattributedMode::Drop => UnattributedPolicy::Drop,
            UnattributedMode::Buffer => UnattributedPolicy::Buffer {
                limit: self.capture.pending_limit,
            },
        }
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.window.polling_interval_ms)
    }

    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.storage.checkpoint_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.unattributed_policy(), UnattributedPolicy::Drop);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load("/non/existent/keyheat.toml").unwrap();
        assert_eq!(config.window.detection_method, "auto");
        assert_eq!(config.checkpoint_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_buffer_policy_uses_pending_limit() {
        let mut config = Config::default();
        config.capture.unattributed = UnattributedMode::Buffer;
        config.capture.pending_limit = 16;

        assert_eq!(
            config.unattributed_policy(),
            UnattributedPolicy::Buffer { limit: 16 }
        );

        config.capture.pending_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.window.polling_interval_ms = 10;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.window.detection_method = "magic".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "json".to_string();
        assert!(config.validate().is_err());
    }
}
