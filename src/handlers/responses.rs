//! handlers/responses.rs
//! Respuestas comunes a varios handlers.

use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;

pub const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

pub fn xml(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((header::CONTENT_TYPE, XML_CONTENT_TYPE))
        .body(body)
}

/// 405 para cualquier verbo que no sea POST en los webhooks.
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, "POST"))
        .json(json!({
            "error": "Method not allowed"
        }))
}

/// Config faltante: el detalle solo va al log.
pub fn configuration_missing(detail: &str) -> HttpResponse {
    log::error!("Configuración faltante: {}", detail);
    HttpResponse::InternalServerError().json(json!({
        "error": "Internal server error"
    }))
}
