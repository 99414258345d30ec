//! handlers/health_handler.rs

use actix_web::{web, HttpResponse};

use crate::models::health_model::HealthState;
use crate::services::health_monitor::HealthMonitor;
use crate::services::health_service::HealthService;

/// GET /health
/// 503 solo si el estado global es unhealthy; el cuerpo va igual.
pub async fn health_endpoint(health_service: web::Data<HealthService>) -> HttpResponse {
    let report = health_service.report().await;
    if report.status == HealthState::Unhealthy {
        HttpResponse::ServiceUnavailable().json(report)
    } else {
        HttpResponse::Ok().json(report)
    }
}

/// GET /api/health/indicator
pub async fn health_indicator_endpoint(monitor: web::Data<HealthMonitor>) -> HttpResponse {
    HttpResponse::Ok().json(monitor.indicator())
}

/// GET /api/health/snapshot
pub async fn health_snapshot_endpoint(monitor: web::Data<HealthMonitor>) -> HttpResponse {
    HttpResponse::Ok().json(monitor.latest())
}
