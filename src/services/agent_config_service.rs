//! services/agent_config_service.rs
//! Configuración de agentes de coaching, leída del backend y cacheada con TTL.

use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::Value;

use crate::services::cache::TtlCache;

/// El backend respondió, pero con un status no-2xx.
#[derive(Debug)]
pub struct UpstreamStatusError {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for UpstreamStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream respondió {}: {}", self.status, self.body)
    }
}

impl std::error::Error for UpstreamStatusError {}

#[derive(Clone, Debug)]
pub struct AgentConfigService {
    upstream_url: String,
    ttl: Duration,
    cache: TtlCache<Value>,
    http_client: Client,
}

impl AgentConfigService {
    pub fn new(upstream_url: String, ttl: Duration) -> Self {
        Self {
            upstream_url,
            ttl,
            cache: TtlCache::new(),
            http_client: Client::new(),
        }
    }

    pub async fn get_agent_config(&self, agent_id: &str) -> Result<Value> {
        if !is_valid_agent_id(agent_id) {
            return Err(anyhow!("agent_id inválido: {:?}", agent_id));
        }

        let url = format!("{}/agents/{}/config", self.upstream_url, agent_id);
        self.cache
            .get_or_populate(agent_id, || self.fetch(url), self.ttl)
            .await
    }

    async fn fetch(&self, url: String) -> Result<Value> {
        log::info!("Cargando config de agente desde {}", url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Fallo al contactar {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamStatusError {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        response
            .json::<Value>()
            .await
            .context("Config de agente no es JSON válido")
    }
}

pub fn is_valid_agent_id(agent_id: &str) -> bool {
    !agent_id.is_empty()
        && agent_id.len() <= 128
        && agent_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
