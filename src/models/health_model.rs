//! models/health_model.rs
//! Estado de salud agregado. Nada de esto se persiste.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
    #[serde(other)]
    Unknown,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
            HealthState::Unknown => "unknown",
        }
    }

    /// Estado global a partir de los checks:
    /// - algún unhealthy: unhealthy si ninguno está healthy, si no degraded
    /// - algún degraded: degraded
    /// - todos unknown (o ninguno): unknown
    pub fn aggregate<I>(states: I) -> HealthState
    where
        I: IntoIterator<Item = HealthState>,
    {
        let (mut healthy, mut degraded, mut unhealthy) = (0, 0, 0);
        for state in states {
            match state {
                HealthState::Healthy => healthy += 1,
                HealthState::Degraded => degraded += 1,
                HealthState::Unhealthy => unhealthy += 1,
                HealthState::Unknown => {}
            }
        }

        if unhealthy > 0 {
            if healthy == 0 && degraded == 0 {
                HealthState::Unhealthy
            } else {
                HealthState::Degraded
            }
        } else if degraded > 0 {
            HealthState::Degraded
        } else if healthy > 0 {
            HealthState::Healthy
        } else {
            HealthState::Unknown
        }
    }
}

/// Un check individual tal como viaja en el JSON de `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub status: HealthState,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_millis"
    )]
    pub response_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthCheck {
    pub fn new(status: HealthState) -> Self {
        HealthCheck {
            status,
            response_time: None,
            message: None,
        }
    }

    pub fn with_response_time(mut self, millis: u64) -> Self {
        self.response_time = Some(millis);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Cuerpo de `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthState,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub checks: BTreeMap<String, HealthCheck>,
}

impl HealthReport {
    pub fn from_checks(checks: BTreeMap<String, HealthCheck>) -> Self {
        let status = HealthState::aggregate(checks.values().map(|c| c.status));
        HealthReport {
            status,
            timestamp: Some(Utc::now()),
            checks,
        }
    }
}

// Otros backends mandan `responseTime` con decimales (12.5); se redondea.
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|v| v.as_f64())
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
        .map(|ms| ms.round() as u64))
}

// RFC 3339 o epoch en milisegundos; cualquier otra cosa se ignora.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => s.parse::<DateTime<Utc>>().ok(),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    })
}

/// Servicio individual dentro de un snapshot del monitor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub name: String,
    pub status: HealthState,
    pub response_time: Option<u64>,
    pub message: Option<String>,
}

/// Último resultado del monitor (solo se guarda el más reciente).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub overall: HealthState,
    pub services: Vec<ServiceHealth>,
    pub checked_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl HealthSnapshot {
    /// Aún no se ha hecho ningún poll.
    pub fn pending() -> Self {
        HealthSnapshot {
            overall: HealthState::Unknown,
            services: vec![],
            checked_at: None,
            error: None,
        }
    }

    pub fn from_report(report: HealthReport) -> Self {
        // BTreeMap ya itera ordenado por nombre
        let services = report
            .checks
            .into_iter()
            .map(|(name, check)| ServiceHealth {
                name,
                status: check.status,
                response_time: check.response_time,
                message: check.message,
            })
            .collect();

        HealthSnapshot {
            overall: report.status,
            services,
            checked_at: Some(Utc::now()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        HealthSnapshot {
            overall: HealthState::Unknown,
            services: vec![],
            checked_at: Some(Utc::now()),
            error: Some(error.into()),
        }
    }

    pub fn indicator(&self) -> StatusIndicator {
        let (color, icon) = match (&self.error, self.overall) {
            (Some(_), _) => ("gray", "help-circle"),
            (None, HealthState::Healthy) => ("green", "check-circle"),
            (None, HealthState::Degraded) => ("yellow", "alert-triangle"),
            (None, HealthState::Unhealthy) => ("red", "x-circle"),
            (None, HealthState::Unknown) => ("gray", "help-circle"),
        };

        let label = match &self.error {
            Some(_) => "error".to_string(),
            None => self.overall.as_str().to_string(),
        };

        let mut detail: Vec<String> = self
            .services
            .iter()
            .map(|svc| {
                let mut line = format!("{}: {}", svc.name, svc.status.as_str());
                if let Some(ms) = svc.response_time {
                    line.push_str(&format!(" ({}ms)", ms));
                }
                if let Some(msg) = &svc.message {
                    line.push_str(&format!(" - {}", msg));
                }
                line
            })
            .collect();

        if let Some(err) = &self.error {
            detail.push(format!("error: {}", err));
        }

        StatusIndicator {
            status: label,
            color,
            icon,
            detail,
            checked_at: self.checked_at,
        }
    }
}

/// Indicador compacto: color/icono según salud global,
/// `detail` es lo que se muestra al pasar el mouse.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusIndicator {
    pub status: String,
    pub color: &'static str,
    pub icon: &'static str,
    pub detail: Vec<String>,
    pub checked_at: Option<DateTime<Utc>>,
}
