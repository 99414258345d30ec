use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Mensaje de feedback para la superficie de notificaciones.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackMessage {
    pub level: FeedbackLevel,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl FeedbackMessage {
    pub fn new(level: FeedbackLevel, text: impl Into<String>) -> Self {
        FeedbackMessage {
            level,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(FeedbackLevel::Success, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(FeedbackLevel::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(FeedbackLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(FeedbackLevel::Error, text)
    }
}
