//! services/proxy_service.rs
//! Reenvío 1:1 de llamadas JSON del front al backend de RepConnect.

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::Client;

use crate::config::app_config::ProxyConfig;
use crate::services::rate_limiter::RateLimiter;

/// Prefijo propio de la función; se quita para calcular la ruta upstream.
pub const PROXY_PREFIX: &str = "/api/proxy";

// Cabeceras que no se reenvían
const SKIPPED_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "origin",
    // reqwest no descomprime: el upstream debe responder sin comprimir
    "accept-encoding",
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
];

/// Respuesta del upstream tal cual se devuelve al cliente.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Clone, Debug)]
pub struct ProxyService {
    config: ProxyConfig,
    http_client: Client,
    limiter: RateLimiter,
}

impl ProxyService {
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("No se pudo construir el cliente HTTP del proxy")?;
        let limiter = RateLimiter::new(config.rate_limit, config.rate_window);

        Ok(ProxyService {
            config,
            http_client,
            limiter,
        })
    }

    /// `/api/proxy/calls/start?x=1` -> `{upstream}/calls/start?x=1`
    pub fn upstream_url(&self, path: &str, query: &str) -> String {
        let stripped = path.strip_prefix(PROXY_PREFIX).unwrap_or(path);
        let stripped = stripped.trim_start_matches('/');

        let mut url = format!("{}/{}", self.config.upstream_url, stripped);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Origin a devolver en `Access-Control-Allow-Origin`: el de la petición
    /// si está permitido, si no el primero de la lista.
    pub fn allowed_origin(&self, origin: Option<&str>) -> String {
        let default = self
            .config
            .allowed_origins
            .first()
            .cloned()
            .unwrap_or_else(|| crate::config::app_config::DEFAULT_ALLOWED_ORIGIN.to_string());

        match origin.map(|o| o.trim_end_matches('/')) {
            Some(o) if self.config.allowed_origins.iter().any(|a| a == o) => o.to_string(),
            _ => default,
        }
    }

    /// Tamaño máximo del cuerpo que se acepta para reenviar.
    pub fn max_body_bytes(&self) -> usize {
        self.config.max_body_bytes
    }

    /// false si el cliente superó el límite de la ventana.
    pub fn allow_client(&self, client_key: &str) -> bool {
        self.limiter.check(client_key)
    }

    pub fn should_forward_header(name: &str) -> bool {
        !SKIPPED_HEADERS.contains(&name.to_ascii_lowercase().as_str())
    }

    /// Manda la petición al upstream. Un status no-2xx NO es error:
    /// se devuelve tal cual. Error = fallo de transporte o timeout.
    pub async fn forward(
        &self,
        method: &str,
        url: &str,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Result<UpstreamResponse> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .with_context(|| format!("Método inválido: {}", method))?;

        let mut request = self.http_client.request(method, url);
        for (name, value) in headers {
            if Self::should_forward_header(&name) {
                request = request.header(name, value);
            }
        }

        let response = request
            .body(body)
            .send()
            .await
            .with_context(|| format!("Fallo al contactar upstream {}", url))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .context("Fallo al leer cuerpo del upstream")?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
