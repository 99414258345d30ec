//! services/health_service.rs
//! Calcula el reporte de `GET /health` a partir de los servicios dependientes.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use sqlx::{Pool, Sqlite};

use crate::config::app_config::ServiceRegistry;
use crate::models::health_model::{HealthCheck, HealthReport, HealthState};

const BACKEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct HealthService {
    db_pool: Option<Pool<Sqlite>>,
    services: ServiceRegistry,
    http_client: Client,
}

impl HealthService {
    pub fn new(db_pool: Option<Pool<Sqlite>>, services: ServiceRegistry) -> Self {
        Self {
            db_pool,
            services,
            http_client: Client::new(),
        }
    }

    pub async fn report(&self) -> HealthReport {
        let (database, backend) =
            futures::future::join(self.check_database(), self.check_backend()).await;

        let mut checks = BTreeMap::new();
        checks.insert("database".to_string(), database);
        checks.insert(ServiceRegistry::BACKEND.to_string(), backend);

        for (name, endpoint) in self.services.iter() {
            if name == ServiceRegistry::BACKEND {
                continue;
            }
            let check = if endpoint.is_configured() {
                HealthCheck::new(HealthState::Healthy).with_message("configured")
            } else {
                HealthCheck::new(HealthState::Unknown).with_message("not configured")
            };
            checks.insert(name.to_string(), check);
        }

        HealthReport::from_checks(checks)
    }

    async fn check_database(&self) -> HealthCheck {
        let Some(pool) = &self.db_pool else {
            return HealthCheck::new(HealthState::Unknown).with_message("not configured");
        };

        let started = Instant::now();
        match sqlx::query("SELECT 1").fetch_one(pool).await {
            Ok(_) => HealthCheck::new(HealthState::Healthy)
                .with_response_time(started.elapsed().as_millis() as u64),
            Err(e) => {
                log::warn!("Health check de base de datos falló: {:?}", e);
                HealthCheck::new(HealthState::Unhealthy)
                    .with_response_time(started.elapsed().as_millis() as u64)
                    .with_message(e.to_string())
            }
        }
    }

    async fn check_backend(&self) -> HealthCheck {
        let Some(base_url) = self
            .services
            .get(ServiceRegistry::BACKEND)
            .and_then(|e| e.base_url.clone())
        else {
            return HealthCheck::new(HealthState::Unknown).with_message("not configured");
        };

        let started = Instant::now();
        let result = self
            .http_client
            .get(format!("{}/health", base_url))
            .timeout(BACKEND_TIMEOUT)
            .send()
            .await;
        let elapsed = started.elapsed().as_millis() as u64;

        match result {
            Ok(resp) if resp.status().is_success() => {
                HealthCheck::new(HealthState::Healthy).with_response_time(elapsed)
            }
            Ok(resp) => HealthCheck::new(HealthState::Degraded)
                .with_response_time(elapsed)
                .with_message(format!("HTTP {}", resp.status().as_u16())),
            Err(e) => {
                log::warn!("Backend no responde en {}: {}", base_url, e);
                HealthCheck::new(HealthState::Unhealthy)
                    .with_response_time(elapsed)
                    .with_message(e.to_string())
            }
        }
    }
}
