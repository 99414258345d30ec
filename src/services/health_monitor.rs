//! services/health_monitor.rs
//! Poll periódico de un endpoint `/health`. Solo guarda el último resultado;
//! un poll fallido deja el estado de error hasta el siguiente.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::app_config::HealthConfig;
use crate::models::health_model::{HealthReport, HealthSnapshot, StatusIndicator};

const POLL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct HealthMonitor {
    config: HealthConfig,
    http_client: Client,
    latest: Arc<RwLock<HealthSnapshot>>,
}

impl HealthMonitor {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
            latest: Arc::new(RwLock::new(HealthSnapshot::pending())),
        }
    }

    /// Un solo GET al endpoint; el resultado reemplaza al anterior.
    pub async fn poll_once(&self) -> HealthSnapshot {
        let snapshot = match self.fetch_report().await {
            Ok(report) => HealthSnapshot::from_report(report),
            Err(e) => {
                log::warn!("Poll de salud a {} falló: {:?}", self.config.poll_url, e);
                HealthSnapshot::failed(e.to_string())
            }
        };

        match self.latest.write() {
            Ok(mut latest) => *latest = snapshot.clone(),
            Err(poisoned) => *poisoned.into_inner() = snapshot.clone(),
        }
        snapshot
    }

    async fn fetch_report(&self) -> anyhow::Result<HealthReport> {
        // Un 503 también trae el JSON del reporte, así que no se usa error_for_status
        let report = self
            .http_client
            .get(&self.config.poll_url)
            .timeout(POLL_TIMEOUT)
            .send()
            .await?
            .json::<HealthReport>()
            .await?;
        Ok(report)
    }

    pub fn latest(&self) -> HealthSnapshot {
        match self.latest.read() {
            Ok(latest) => latest.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn indicator(&self) -> StatusIndicator {
        self.latest().indicator()
    }

    /// Lanza el loop de polling: primer poll inmediato y luego cada intervalo.
    pub fn spawn(&self) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(monitor.config.poll_interval);
            // Si un poll tarda más que el intervalo no se acumulan ticks
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let snapshot = monitor.poll_once().await;
                log::debug!("Salud global: {}", snapshot.overall.as_str());
            }
        })
    }
}
