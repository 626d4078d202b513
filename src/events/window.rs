use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Активное окно, как его видит детектор
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveWindow {
    pub title: String,
    pub class: String,
}

impl ActiveWindow {
    pub fn new(title: String) -> Self {
        Self {
            title,
            class: String::new(),
        }
    }

    pub fn with_class(mut self, class: String) -> Self {
        self.class = class;
        self
    }

    /// Идентификатор окна для агрегатора: класс (если известен) или заголовок
    pub fn identifier(&self, by: IdentifyBy) -> &str {
        match by {
            IdentifyBy::Class if !self.class.is_empty() => &self.class,
            _ => &self.title,
        }
    }
}

impl fmt::Display for ActiveWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class.is_empty() {
            write!(f, "\"{}\"", self.title)
        } else {
            write!(f, "\"{}\" ({})", self.title, self.class)
        }
    }
}

/// Как строить идентификатор окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifyBy {
    Title,
    Class,
}

/// Событие смены фокуса
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFocus {
    pub identifier: String,
    pub timestamp: Instant,
}

impl WindowFocus {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::at(identifier, Instant::now())
    }

    pub fn at(identifier: impl Into<String>, timestamp: Instant) -> Self {
        Self {
            identifier: identifier.into(),
            timestamp,
        }
    }
}

impl fmt::Display for WindowFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FocusChanged: \"{}\" ({}ms ago)",
            self.identifier,
            self.timestamp.elapsed().as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_by_title_and_class() {
        let window = ActiveWindow::new("Vim - file.txt".to_string()).with_class("vim".to_string());

        assert_eq!(window.identifier(IdentifyBy::Title), "Vim - file.txt");
        assert_eq!(window.identifier(IdentifyBy::Class), "vim");
    }

    #[test]
    fn test_class_falls_back_to_title() {
        let window = ActiveWindow::new("Terminal".to_string());
        assert_eq!(window.identifier(IdentifyBy::Class), "Terminal");
    }

    #[test]
    fn test_display() {
        let window = ActiveWindow::new("Test".to_string());
        assert_eq!(window.to_string(), "\"Test\"");
        let window = window.with_class("App".to_string());
        assert_eq!(window.to_string(), "\"Test\" (App)");
    }
}
