//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod agent_config_service;
pub mod cache;
pub mod feedback_service;
pub mod health_monitor;
pub mod health_service;
pub mod proxy_service;
pub mod rate_limiter;
pub mod recording_service;
pub mod twilio_service;
