//! handlers/agent_handler.rs
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::services::agent_config_service::{
    is_valid_agent_id, AgentConfigService, UpstreamStatusError,
};

/// GET /api/agents/{id}/config
pub async fn agent_config_endpoint(
    agent_service: web::Data<AgentConfigService>,
    path: web::Path<String>,
) -> HttpResponse {
    let agent_id = path.into_inner();
    if !is_valid_agent_id(&agent_id) {
        return HttpResponse::BadRequest().json(json!({
            "error": "Invalid agent id"
        }));
    }

    match agent_service.get_agent_config(&agent_id).await {
        Ok(config) => HttpResponse::Ok().json(config),
        Err(e) => {
            log::error!("Config de agente {} no disponible: {:?}", agent_id, e);
            let status = e
                .downcast_ref::<UpstreamStatusError>()
                .and_then(|u| StatusCode::from_u16(u.status).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            HttpResponse::build(status).json(json!({
                "error": "Agent config unavailable",
                "details": e.to_string()
            }))
        }
    }
}
