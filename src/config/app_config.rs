//! config/app_config.rs
//! Configuración global del proceso, leída una sola vez del entorno (.env incluido).

use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

pub const DEFAULT_GREETING: &str =
    "Thank you for calling RepConnect. Please hold while we connect your call.";

/// Origen que se usa cuando el Origin de la petición no está en la lista.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://repconnect.netlify.app";

/// Cuerpo máximo que acepta el proxy (5 MiB).
pub const DEFAULT_PROXY_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Base URL + credencial de un servicio externo.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceEndpoint {
    pub base_url: Option<String>,
    #[serde(skip_serializing)]
    pub credential: Option<String>,
}

impl ServiceEndpoint {
    pub fn is_configured(&self) -> bool {
        self.credential.is_some()
    }
}

/// Mapa inmutable nombre lógico -> endpoint.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<&'static str, ServiceEndpoint>,
}

impl ServiceRegistry {
    pub const SUPABASE: &'static str = "supabase";
    pub const TWILIO: &'static str = "twilio";
    pub const DEEPGRAM: &'static str = "deepgram";
    pub const ELEVENLABS: &'static str = "elevenlabs";
    pub const OPENAI: &'static str = "openai";
    pub const BACKEND: &'static str = "backend";

    pub fn with_service(
        mut self,
        name: &'static str,
        base_url: Option<String>,
        credential: Option<String>,
    ) -> Self {
        self.services.insert(
            name,
            ServiceEndpoint {
                base_url,
                credential,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&ServiceEndpoint> {
        self.services.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ServiceEndpoint)> {
        self.services.iter().map(|(k, v)| (*k, v))
    }
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub forward_phone_number: Option<String>,
    pub auth_token: Option<String>,
    pub validate_signature: bool,
    /// URL pública con la que Twilio firma los webhooks (sin slash final).
    pub public_base_url: Option<String>,
    pub greeting: String,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub upstream_url: String,
    pub allowed_origins: Vec<String>,
    pub timeout: Duration,
    pub rate_limit: usize,
    pub rate_window: Duration,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub poll_url: String,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub twilio: TwilioConfig,
    pub proxy: ProxyConfig,
    pub health: HealthConfig,
    pub agent_config_ttl: Duration,
    pub services: ServiceRegistry,
}

impl Default for AppConfig {
    fn default() -> Self {
        let port = 5022;
        let upstream_url = "http://localhost:8000".to_string();
        AppConfig {
            host: "0.0.0.0".to_string(),
            port,
            database_url: None,
            twilio: TwilioConfig {
                forward_phone_number: None,
                auth_token: None,
                validate_signature: false,
                public_base_url: None,
                greeting: DEFAULT_GREETING.to_string(),
            },
            proxy: ProxyConfig {
                upstream_url: upstream_url.clone(),
                allowed_origins: vec![
                    DEFAULT_ALLOWED_ORIGIN.to_string(),
                    "http://localhost:3000".to_string(),
                ],
                timeout: Duration::from_secs(30),
                rate_limit: 60,
                rate_window: Duration::from_secs(60),
                max_body_bytes: DEFAULT_PROXY_MAX_BODY_BYTES,
            },
            health: HealthConfig {
                poll_url: format!("http://127.0.0.1:{}/health", port),
                poll_interval: Duration::from_secs(30),
            },
            agent_config_ttl: Duration::from_secs(300),
            services: ServiceRegistry::default().with_service(
                ServiceRegistry::BACKEND,
                Some(upstream_url),
                None,
            ),
        }
    }
}

impl AppConfig {
    /// Lee la configuración de variables de entorno. Nada aquí falla:
    /// lo que falta se degrada a default o deshabilita la feature.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();

        let port = env_parse("PORT", defaults.port);
        let upstream_url = env_string("PROXY_UPSTREAM_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.proxy.upstream_url);

        let allowed_origins = env_string("PROXY_ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.proxy.allowed_origins);

        let twilio_auth_token = env_string("TWILIO_AUTH_TOKEN");
        let supabase_url = env_string("SUPABASE_URL");

        let services = ServiceRegistry::default()
            .with_service(
                ServiceRegistry::SUPABASE,
                supabase_url,
                env_string("SUPABASE_ANON_KEY"),
            )
            .with_service(
                ServiceRegistry::TWILIO,
                Some("https://api.twilio.com".to_string()),
                twilio_auth_token.clone(),
            )
            .with_service(
                ServiceRegistry::DEEPGRAM,
                Some("https://api.deepgram.com".to_string()),
                env_string("DEEPGRAM_API_KEY"),
            )
            .with_service(
                ServiceRegistry::ELEVENLABS,
                Some("https://api.elevenlabs.io".to_string()),
                env_string("ELEVENLABS_API_KEY"),
            )
            .with_service(
                ServiceRegistry::OPENAI,
                Some("https://api.openai.com".to_string()),
                env_string("OPENAI_API_KEY"),
            )
            .with_service(ServiceRegistry::BACKEND, Some(upstream_url.clone()), None);

        AppConfig {
            host: env_string("HOST").unwrap_or(defaults.host),
            port,
            database_url: env_string("DATABASE_URL"),
            twilio: TwilioConfig {
                forward_phone_number: env_string("FORWARD_PHONE_NUMBER"),
                auth_token: twilio_auth_token,
                validate_signature: env_parse("TWILIO_VALIDATE_SIGNATURE", false),
                public_base_url: env_string("PUBLIC_BASE_URL")
                    .map(|u| u.trim_end_matches('/').to_string()),
                greeting: env_string("CALL_GREETING").unwrap_or(defaults.twilio.greeting),
            },
            proxy: ProxyConfig {
                upstream_url,
                allowed_origins,
                timeout: Duration::from_secs(env_parse("PROXY_TIMEOUT_SECS", 30)),
                rate_limit: env_parse("PROXY_RATE_LIMIT", defaults.proxy.rate_limit),
                rate_window: Duration::from_secs(env_parse("PROXY_RATE_WINDOW_SECS", 60)),
                max_body_bytes: env_parse("PROXY_MAX_BODY_BYTES", defaults.proxy.max_body_bytes),
            },
            health: HealthConfig {
                poll_url: env_string("HEALTH_POLL_URL")
                    .unwrap_or_else(|| format!("http://127.0.0.1:{}/health", port)),
                poll_interval: Duration::from_secs(
                    env_parse("HEALTH_POLL_INTERVAL_SECS", 30u64).max(1),
                ),
            },
            agent_config_ttl: Duration::from_secs(env_parse("AGENT_CONFIG_TTL_SECS", 300)),
            services,
        }
    }
}

/// Variable de entorno no vacía (recortada).
fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env_string(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Valor inválido para {}: '{}', usando default", key, raw);
            default
        }),
        None => default,
    }
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}
