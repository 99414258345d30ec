//! models/recording_model.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::twilio_model::WebhookForm;

/// Campos del webhook `recordingStatusCallback`.
#[derive(Debug, Clone)]
pub struct RecordingStatusWebhook {
    pub recording_sid: String,
    pub recording_url: String,
    pub recording_status: String,
    pub recording_duration: i64,
    pub call_sid: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub recording_start_time: Option<String>,
}

impl From<&WebhookForm> for RecordingStatusWebhook {
    fn from(form: &WebhookForm) -> Self {
        RecordingStatusWebhook {
            recording_sid: form.get_or_empty("RecordingSid"),
            recording_url: form.get_or_empty("RecordingUrl"),
            recording_status: form.get("RecordingStatus").unwrap_or("unknown").to_string(),
            // Twilio manda "-1" o nada si no hay duración
            recording_duration: form
                .get("RecordingDuration")
                .and_then(|d| d.parse::<i64>().ok())
                .filter(|d| *d >= 0)
                .unwrap_or(0),
            call_sid: form.get_or_empty("CallSid"),
            from: form.get("From").map(str::to_string),
            to: form.get("To").map(str::to_string),
            recording_start_time: form.get("RecordingStartTime").map(str::to_string),
        }
    }
}

/// Fila de `call_recordings`. Se crea una vez y no se actualiza.
#[derive(Debug, Clone, Serialize)]
pub struct CallRecording {
    pub id: String,
    pub call_sid: String,
    pub recording_sid: String,
    pub recording_url: String,
    pub recording_status: String,
    pub duration_seconds: i64,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub recording_started_at: Option<String>,
    pub created_at: DateTime<Utc>,
}
