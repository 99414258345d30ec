//! services/recording_service.rs
//! Persistencia de grabaciones completadas (tabla `call_recordings`).

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::models::recording_model::{CallRecording, RecordingStatusWebhook};

#[derive(Clone, Debug)]
pub struct RecordingService {
    db_pool: Option<Pool<Sqlite>>,
}

impl RecordingService {
    pub fn new(db_pool: Option<Pool<Sqlite>>) -> Self {
        RecordingService { db_pool }
    }

    /// Hay base de datos configurada.
    pub fn is_enabled(&self) -> bool {
        self.db_pool.is_some()
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        if let Some(pool) = &self.db_pool {
            sqlx::migrate!("./migrations")
                .run(pool)
                .await
                .context("Fallo en migraciones de 'call_recordings'")?;
        }
        Ok(())
    }

    /// Inserta una fila por grabación completada. Nunca actualiza.
    pub async fn save_recording(&self, webhook: &RecordingStatusWebhook) -> Result<CallRecording> {
        let pool = self
            .db_pool
            .as_ref()
            .ok_or_else(|| anyhow!("Base de datos no configurada"))?;

        if webhook.call_sid.is_empty() || webhook.recording_sid.is_empty() {
            return Err(anyhow!("Webhook sin CallSid o RecordingSid"));
        }

        let record = CallRecording {
            id: Uuid::new_v4().to_string(),
            call_sid: webhook.call_sid.clone(),
            recording_sid: webhook.recording_sid.clone(),
            recording_url: webhook.recording_url.clone(),
            recording_status: webhook.recording_status.clone(),
            duration_seconds: webhook.recording_duration,
            from_number: webhook.from.clone(),
            to_number: webhook.to.clone(),
            recording_started_at: webhook.recording_start_time.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO call_recordings (
                id, call_sid, recording_sid, recording_url, recording_status,
                duration_seconds, from_number, to_number, recording_started_at, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&record.id)
        .bind(&record.call_sid)
        .bind(&record.recording_sid)
        .bind(&record.recording_url)
        .bind(&record.recording_status)
        .bind(record.duration_seconds)
        .bind(&record.from_number)
        .bind(&record.to_number)
        .bind(&record.recording_started_at)
        .bind(record.created_at.to_rfc3339())
        .execute(pool)
        .await
        .context("Fallo al insertar call_recording")?;

        Ok(record)
    }

    /// Grabaciones de una llamada, más recientes primero.
    pub async fn list_for_call(&self, call_sid: &str) -> Result<Vec<CallRecording>> {
        let pool = self
            .db_pool
            .as_ref()
            .ok_or_else(|| anyhow!("Base de datos no configurada"))?;

        let rows = sqlx::query(
            r#"
            SELECT
                id, call_sid, recording_sid, recording_url, recording_status,
                duration_seconds, from_number, to_number, recording_started_at, created_at
            FROM call_recordings
            WHERE call_sid = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(call_sid)
        .fetch_all(pool)
        .await
        .context("Fallo al listar call_recordings")?;

        rows.into_iter()
            .map(|r| -> Result<CallRecording> {
                let created_at: String = r.try_get("created_at")?;
                Ok(CallRecording {
                    id: r.try_get("id")?,
                    call_sid: r.try_get("call_sid")?,
                    recording_sid: r.try_get("recording_sid")?,
                    recording_url: r.try_get("recording_url")?,
                    recording_status: r.try_get("recording_status")?,
                    duration_seconds: r.try_get("duration_seconds")?,
                    from_number: r.try_get("from_number")?,
                    to_number: r.try_get("to_number")?,
                    recording_started_at: r.try_get("recording_started_at")?,
                    created_at: created_at.parse()?,
                })
            })
            .collect()
    }
}
