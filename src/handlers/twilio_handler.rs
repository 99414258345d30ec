//! handlers/twilio_handler.rs
//! Webhooks de Twilio: llamada entrante, estado de grabación y estado de llamada.

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::handlers::responses;
use crate::models::feedback_model::FeedbackMessage;
use crate::models::recording_model::RecordingStatusWebhook;
use crate::models::twilio_model::{CallStatusWebhook, IncomingCallWebhook, WebhookForm};
use crate::services::feedback_service::FeedbackBus;
use crate::services::recording_service::RecordingService;
use crate::services::twilio_service::TwilioService;

const SIGNATURE_HEADER: &str = "X-Twilio-Signature";

/// Some(403) si la validación de firma está activa y la firma no cuadra.
fn reject_unsigned(
    req: &HttpRequest,
    form: &WebhookForm,
    twilio: &TwilioService,
) -> Option<HttpResponse> {
    if !twilio.signature_required() {
        return None;
    }

    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.path());

    match twilio.verify_signature(path_and_query, form, signature) {
        Ok(true) => None,
        Ok(false) => {
            log::warn!("Firma de Twilio inválida en {}", req.path());
            Some(HttpResponse::Forbidden().json(json!({ "error": "Invalid signature" })))
        }
        Err(e) => Some(responses::configuration_missing(&format!("{:?}", e))),
    }
}

/// POST /api/twilio/incoming-call
pub async fn incoming_call_endpoint(
    req: HttpRequest,
    body: web::Bytes,
    twilio: web::Data<TwilioService>,
) -> HttpResponse {
    let form = WebhookForm::parse(&body);
    if let Some(rejection) = reject_unsigned(&req, &form, &twilio) {
        return rejection;
    }

    let call = IncomingCallWebhook::from(&form);
    match twilio.incoming_call_twiml(&call) {
        Ok(twiml) => responses::xml(StatusCode::OK, twiml),
        Err(e) => {
            log::error!(
                "No se pudo atender la llamada call_sid={}: {:?}",
                call.call_sid,
                e
            );
            responses::configuration_missing(&e.to_string())
        }
    }
}

/// POST /api/twilio/recording-status
///
/// Siempre responde 200: Twilio reintenta si no, y la persistencia
/// no es problema suyo.
pub async fn recording_status_endpoint(
    req: HttpRequest,
    body: web::Bytes,
    twilio: web::Data<TwilioService>,
    recording_service: web::Data<RecordingService>,
    feedback: web::Data<FeedbackBus>,
) -> HttpResponse {
    let form = WebhookForm::parse(&body);
    if let Some(rejection) = reject_unsigned(&req, &form, &twilio) {
        return rejection;
    }

    let webhook = RecordingStatusWebhook::from(&form);
    log::info!(
        "Grabación {} de call_sid={} status={} duración={}s",
        webhook.recording_sid,
        webhook.call_sid,
        webhook.recording_status,
        webhook.recording_duration
    );

    if recording_service.is_enabled() {
        match recording_service.save_recording(&webhook).await {
            Ok(record) => {
                log::info!("Grabación guardada id={}", record.id);
                feedback.publish(FeedbackMessage::success(format!(
                    "Recording saved for call {}",
                    record.call_sid
                )));
            }
            Err(e) => {
                log::error!(
                    "Error guardando grabación {}: {:?}",
                    webhook.recording_sid,
                    e
                );
                feedback.publish(FeedbackMessage::error(format!(
                    "Recording for call {} could not be saved",
                    webhook.call_sid
                )));
            }
        }
    } else {
        log::warn!("Sin base de datos: grabación {} no persistida", webhook.recording_sid);
    }

    responses::xml(StatusCode::OK, twilio.ack_twiml())
}

/// POST /api/twilio/call-status
pub async fn call_status_endpoint(
    req: HttpRequest,
    body: web::Bytes,
    twilio: web::Data<TwilioService>,
    feedback: web::Data<FeedbackBus>,
) -> HttpResponse {
    let form = WebhookForm::parse(&body);
    if let Some(rejection) = reject_unsigned(&req, &form, &twilio) {
        return rejection;
    }

    let status = CallStatusWebhook::from(&form);
    log::info!(
        "Estado de llamada call_sid={} status={} duración={:?} from={} to={}",
        status.call_sid,
        status.call_status,
        status.call_duration,
        status.from,
        status.to
    );

    match status.call_status.as_str() {
        "completed" => feedback.publish(FeedbackMessage::info(format!(
            "Call {} completed",
            status.call_sid
        ))),
        "busy" | "no-answer" | "failed" | "canceled" => {
            feedback.publish(FeedbackMessage::warning(format!(
                "Call {} was not connected ({})",
                status.call_sid, status.call_status
            )))
        }
        _ => {}
    }

    responses::xml(StatusCode::OK, twilio.ack_twiml())
}

/// GET /api/calls/{call_sid}/recordings
pub async fn list_recordings_endpoint(
    recording_service: web::Data<RecordingService>,
    path: web::Path<String>,
) -> HttpResponse {
    let call_sid = path.into_inner();

    if !recording_service.is_enabled() {
        return HttpResponse::ServiceUnavailable().json(json!({
            "error": "Database not configured"
        }));
    }

    match recording_service.list_for_call(&call_sid).await {
        Ok(recordings) => HttpResponse::Ok().json(recordings),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}
