use std::str::FromStr;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::app_config::AppConfig;
use crate::logger::init_logger;
use crate::models::feedback_model::FeedbackLevel;
use crate::services::agent_config_service::AgentConfigService;
use crate::services::feedback_service::FeedbackBus;
use crate::services::health_monitor::HealthMonitor;
use crate::services::health_service::HealthService;
use crate::services::proxy_service::ProxyService;
use crate::services::recording_service::RecordingService;
use crate::services::twilio_service::TwilioService;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

/// Conecta a la DB si hay DATABASE_URL. Sin DB la app arranca igual,
/// solo que las grabaciones no se persisten.
async fn setup_database(config: &AppConfig) -> Option<Pool<Sqlite>> {
    let Some(db_url) = config.database_url.as_deref() else {
        log::warn!("DATABASE_URL no definido: las grabaciones no se guardarán");
        return None;
    };

    // Carpeta "data" para las URLs relativas tipo sqlite:data/repconnect.db
    if let Err(e) = std::fs::create_dir_all("data") {
        log::warn!("No se pudo crear directorio 'data': {}", e);
    }

    log::info!("Conectando a SQLite en {}", db_url);

    let options = match SqliteConnectOptions::from_str(db_url) {
        Ok(opts) => opts.create_if_missing(true),
        Err(e) => {
            log::error!("DATABASE_URL inválido: {:?}", e);
            return None;
        }
    };

    match SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::error!("No se pudo conectar a la base de datos: {:?}", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env();
    if config.twilio.forward_phone_number.is_none() {
        log::warn!("FORWARD_PHONE_NUMBER no definido: las llamadas entrantes devolverán error");
    }

    // Conectarnos a la DB
    let db_pool = setup_database(&config).await;

    let recording_service = RecordingService::new(db_pool.clone());
    if let Err(e) = recording_service.run_migrations().await {
        panic!("Fallo en migraciones de 'call_recordings': {:?}", e);
    }

    let twilio_service = TwilioService::new(config.twilio.clone());
    if let Err(e) = twilio_service.check_config() {
        log::error!("Configuración de Twilio inválida: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
    let proxy_service = ProxyService::new(config.proxy.clone())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let health_service = HealthService::new(db_pool.clone(), config.services.clone());
    let agent_service =
        AgentConfigService::new(config.proxy.upstream_url.clone(), config.agent_config_ttl);

    // Bus de feedback: la superficie montada aquí es el log del servidor
    let feedback_bus = FeedbackBus::new();
    let feedback_surface = feedback_bus.subscribe(|msg| match msg.level {
        FeedbackLevel::Error => log::error!("[feedback] {}", msg.text),
        FeedbackLevel::Warning => log::warn!("[feedback] {}", msg.text),
        _ => log::info!("[feedback] {}", msg.text),
    });

    let health_monitor = HealthMonitor::new(config.health.clone());
    let poller = health_monitor.spawn();

    // Levantar servidor
    log::info!("Levantando servidor en {}:{}", config.host, config.port);
    let bind_addr = (config.host.clone(), config.port);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(twilio_service.clone()))
            .app_data(web::Data::new(recording_service.clone()))
            .app_data(web::Data::new(proxy_service.clone()))
            .app_data(web::Data::new(health_service.clone()))
            .app_data(web::Data::new(health_monitor.clone()))
            .app_data(web::Data::new(agent_service.clone()))
            .app_data(web::Data::new(feedback_bus.clone()))
            .configure(app::init_app)
    })
    .bind(bind_addr)?
    .run()
    .await;

    // Apagado: lo que se publique desde aquí queda encolado
    poller.abort();
    feedback_surface.unsubscribe();
    server
}
