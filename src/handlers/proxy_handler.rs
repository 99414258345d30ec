//! handlers/proxy_handler.rs
//! Relay de `/api/proxy/*` hacia el backend. Las cabeceras CORS van en todas
//! las respuestas (también en errores) para que el browser pueda leer el cuerpo.

use actix_web::error::PayloadError;
use actix_web::http::{header, Method, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use serde_json::json;

use crate::services::proxy_service::ProxyService;

fn apply_cors<'a>(builder: &'a mut HttpResponseBuilder, origin: &str) -> &'a mut HttpResponseBuilder {
    builder
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.to_string()))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
        .insert_header((
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            "Content-Type, Authorization",
        ))
        .insert_header((header::ACCESS_CONTROL_MAX_AGE, "86400"))
        .insert_header((header::VARY, "Origin"))
}

enum BodyError {
    TooLarge,
    Read(PayloadError),
}

// El cuerpo se lee aquí (y no con el extractor) para que un 413 lleve CORS
async fn read_body(mut payload: web::Payload, limit: usize) -> Result<Bytes, BodyError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(BodyError::Read)?;
        if body.len() + chunk.len() > limit {
            return Err(BodyError::TooLarge);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

/// OPTIONS | POST /api/proxy/{tail:.*}
pub async fn proxy_endpoint(
    req: HttpRequest,
    payload: web::Payload,
    proxy: web::Data<ProxyService>,
) -> HttpResponse {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());
    let allow_origin = proxy.allowed_origin(origin);

    if req.method() == Method::OPTIONS {
        apply_cors(&mut HttpResponse::NoContent(), &allow_origin).finish()
    } else if req.method() == Method::POST {
        forward_post(&req, payload, &proxy, &allow_origin).await
    } else {
        apply_cors(&mut HttpResponse::MethodNotAllowed(), &allow_origin)
            .insert_header((header::ALLOW, "POST, OPTIONS"))
            .json(json!({ "error": "Method not allowed" }))
    }
}

async fn forward_post(
    req: &HttpRequest,
    payload: web::Payload,
    proxy: &ProxyService,
    allow_origin: &str,
) -> HttpResponse {
    // IP del socket: X-Forwarded-For lo controla el cliente
    let client_key = req
        .peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    if !proxy.allow_client(&client_key) {
        log::warn!("Proxy: límite de peticiones superado para {}", client_key);
        return apply_cors(&mut HttpResponse::TooManyRequests(), allow_origin)
            .json(json!({ "error": "Too many requests" }));
    }

    let body = match read_body(payload, proxy.max_body_bytes()).await {
        Ok(body) => body,
        Err(BodyError::TooLarge) => {
            log::warn!(
                "Proxy: cuerpo de {} supera {} bytes",
                client_key,
                proxy.max_body_bytes()
            );
            return apply_cors(&mut HttpResponse::PayloadTooLarge(), allow_origin)
                .json(json!({ "error": "Payload too large" }));
        }
        Err(BodyError::Read(e)) => {
            log::warn!("Proxy: no se pudo leer el cuerpo: {}", e);
            return apply_cors(&mut HttpResponse::BadRequest(), allow_origin).json(json!({
                "error": "Invalid request body",
                "details": e.to_string()
            }));
        }
    };

    let url = proxy.upstream_url(req.path(), req.query_string());
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    log::info!("Proxy: {} {} ({} bytes)", req.method(), url, body.len());

    match proxy.forward(req.method().as_str(), &url, headers, body).await {
        Ok(upstream) => {
            if upstream.status >= 400 {
                log::warn!("Proxy: upstream {} respondió {}", url, upstream.status);
            }
            let status =
                StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let mut builder = HttpResponse::build(status);
            apply_cors(&mut builder, allow_origin);
            if let Some(content_type) = upstream.content_type {
                builder.insert_header((header::CONTENT_TYPE, content_type));
            }
            builder.body(upstream.body)
        }
        Err(e) => {
            log::error!("Proxy: fallo hacia {}: {:?}", url, e);
            apply_cors(&mut HttpResponse::InternalServerError(), allow_origin).json(json!({
                "error": "Upstream request failed",
                "details": e.to_string()
            }))
        }
    }
}
