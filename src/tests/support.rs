//! tests/support.rs
//! Helpers compartidos: upstream falso, puertos cerrados, SQLite en memoria.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: String,
    pub authorization: Option<String>,
    pub accept_encoding: Option<String>,
}

pub type Seen = Arc<Mutex<Vec<SeenRequest>>>;

async fn upstream_handler(
    req: HttpRequest,
    body: web::Bytes,
    seen: web::Data<Seen>,
) -> HttpResponse {
    seen.lock().unwrap().push(SeenRequest {
        method: req.method().to_string(),
        path: req.path().to_string(),
        query: req.query_string().to_string(),
        body: String::from_utf8_lossy(&body).to_string(),
        authorization: req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        accept_encoding: req
            .headers()
            .get("accept-encoding")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let path = req.path();
    if path.ends_with("/fail") {
        return HttpResponse::UnprocessableEntity().json(json!({ "error": "invalid payload" }));
    }
    if path == "/health" {
        return HttpResponse::Ok().json(json!({
            "status": "degraded",
            "timestamp": 1704067200000u64,
            "checks": {
                "openai": { "status": "healthy", "responseTime": 120.4 },
                "database": { "status": "unhealthy", "message": "timeout" }
            }
        }));
    }
    if let Some(rest) = path.strip_prefix("/agents/") {
        let agent_id = rest.trim_end_matches("/config");
        if agent_id == "missing" {
            return HttpResponse::NotFound().json(json!({ "error": "no such agent" }));
        }
        return HttpResponse::Ok().json(json!({ "agentId": agent_id, "voice": "alice" }));
    }

    HttpResponse::Created().json(json!({ "ok": true, "path": path }))
}

/// Levanta un backend falso en un puerto efímero. Devuelve su URL base.
/// Comprime la respuesta si la petición trae `Accept-Encoding`.
pub fn start_upstream() -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(vec![]));
    let seen_for_server = seen.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(seen_for_server.clone()))
            .default_service(web::to(upstream_handler))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("No se pudo bindear el upstream de prueba");

    let addr = server.addrs()[0];
    actix_rt::spawn(server.run());
    (format!("http://{}", addr), seen)
}

/// URL a un puerto donde no escucha nadie.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Pool SQLite en memoria de una sola conexión (cada conexión sería otra DB).
pub async fn memory_pool(migrated: bool) -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("No se pudo abrir SQLite en memoria");
    if migrated {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Fallo en migraciones");
    }
    pool
}
