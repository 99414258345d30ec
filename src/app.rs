//! app.rs
use crate::handlers::{agent_handler, health_handler, proxy_handler, responses, twilio_handler};
use actix_web::web;

/// Webhooks que solo aceptan POST; cualquier otro verbo -> 405.
fn post_only<F, Args>(path: &str, handler: F) -> actix_web::Resource
where
    F: actix_web::Handler<Args>,
    Args: actix_web::FromRequest + 'static,
    F::Output: actix_web::Responder + 'static,
{
    web::resource(path)
        .route(web::post().to(handler))
        .default_service(web::to(responses::method_not_allowed))
}

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_handler::health_endpoint))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/twilio")
                        .service(post_only(
                            "/incoming-call",
                            twilio_handler::incoming_call_endpoint,
                        ))
                        .service(post_only(
                            "/recording-status",
                            twilio_handler::recording_status_endpoint,
                        ))
                        .service(post_only(
                            "/call-status",
                            twilio_handler::call_status_endpoint,
                        )),
                )
                .route(
                    "/calls/{call_sid}/recordings",
                    web::get().to(twilio_handler::list_recordings_endpoint),
                )
                .service(
                    web::resource("/proxy/{tail:.*}")
                        .route(web::route().to(proxy_handler::proxy_endpoint)),
                )
                .service(
                    web::scope("/health")
                        .route(
                            "/indicator",
                            web::get().to(health_handler::health_indicator_endpoint),
                        )
                        .route(
                            "/snapshot",
                            web::get().to(health_handler::health_snapshot_endpoint),
                        ),
                )
                .route(
                    "/agents/{id}/config",
                    web::get().to(agent_handler::agent_config_endpoint),
                ),
        );
}
