use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyheatError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка SQLite: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Ошибка сериализации: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Некорректная раскладка: {0}")]
    InvalidKeymap(String),

    #[error("Сбор событий уже запущен")]
    AlreadyRunning,

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl KeyheatError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(KeyheatError::DeviceNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, KeyheatError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! keyheat_error {
    (device_not_found, $($arg:tt)*) => {
        $crate::error::KeyheatError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::KeyheatError::Permission(format!($($arg)*))
    };
    (invalid_keymap, $($arg:tt)*) => {
        $crate::error::KeyheatError::InvalidKeymap(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::KeyheatError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::KeyheatError::Internal(format!($($arg)*))
    };
}
