//! services/twilio_service.rs
//! Lógica de los webhooks de Twilio: TwiML de llamada entrante y firma.

use anyhow::{anyhow, Context, Result};
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;

use crate::config::app_config::TwilioConfig;
use crate::models::twilio_model::{IncomingCallWebhook, WebhookForm};
use crate::models::twiml_model::{DialNumber, VoiceResponse};

/// Prefijo de las rutas de webhooks; Twilio resuelve rutas relativas
/// contra la URL del webhook original.
pub const WEBHOOK_PATH: &str = "/api/twilio";

#[derive(Clone, Debug)]
pub struct TwilioService {
    config: TwilioConfig,
}

impl TwilioService {
    pub fn new(config: TwilioConfig) -> Self {
        TwilioService { config }
    }

    /// TwiML para una llamada entrante: saludo + <Dial> al número de reenvío
    /// grabando ambos lados.
    pub fn incoming_call_twiml(&self, call: &IncomingCallWebhook) -> Result<String> {
        let forward_to = self
            .config
            .forward_phone_number
            .as_deref()
            .ok_or_else(|| anyhow!("FORWARD_PHONE_NUMBER no está configurado"))?;

        log::info!(
            "Llamada entrante call_sid={} from={} to={} caller_name={:?}, reenviando",
            call.call_sid,
            call.from,
            call.to,
            call.caller_name
        );

        let callback_base = self.callback_base();
        let dial_attrs = vec![
            ("record".to_string(), "record-from-answer-dual".to_string()),
            (
                "recordingStatusCallback".to_string(),
                format!("{}/recording-status", callback_base),
            ),
            (
                "recordingStatusCallbackEvent".to_string(),
                "completed".to_string(),
            ),
            ("recordingStatusCallbackMethod".to_string(), "POST".to_string()),
        ];
        let number = DialNumber::new(forward_to)
            .attr("statusCallback", format!("{}/call-status", callback_base))
            .attr("statusCallbackEvent", "initiated ringing answered completed")
            .attr("statusCallbackMethod", "POST");

        Ok(VoiceResponse::new()
            .say(Some("alice"), self.config.greeting.clone())
            .dial(dial_attrs, number)
            .to_xml())
    }

    /// Respuesta vacía: solo confirma recepción.
    pub fn ack_twiml(&self) -> String {
        VoiceResponse::new().to_xml()
    }

    fn callback_base(&self) -> String {
        match &self.config.public_base_url {
            Some(base) => format!("{}{}", base, WEBHOOK_PATH),
            None => WEBHOOK_PATH.to_string(),
        }
    }

    /// Solo se valida si está activado y hay con qué validar.
    pub fn signature_required(&self) -> bool {
        self.config.validate_signature
            && self.config.auth_token.is_some()
            && self.config.public_base_url.is_some()
    }

    /// Se llama una vez al arrancar: validar firmas sin token o sin URL
    /// pública no es posible.
    pub fn check_config(&self) -> Result<()> {
        if !self.config.validate_signature {
            return Ok(());
        }
        if self.config.auth_token.is_none() {
            return Err(anyhow!(
                "TWILIO_VALIDATE_SIGNATURE=true requiere TWILIO_AUTH_TOKEN"
            ));
        }
        if self.config.public_base_url.is_none() {
            return Err(anyhow!(
                "TWILIO_VALIDATE_SIGNATURE=true requiere PUBLIC_BASE_URL"
            ));
        }
        Ok(())
    }

    /// Valida `X-Twilio-Signature`: HMAC-SHA1 (base64) de la URL completa
    /// seguida de cada par `clave+valor` del form, ordenado por clave.
    pub fn verify_signature(
        &self,
        path_and_query: &str,
        form: &WebhookForm,
        signature: Option<&str>,
    ) -> Result<bool> {
        if !self.signature_required() {
            return Ok(true);
        }
        let Some(signature) = signature else {
            return Ok(false);
        };
        let token = self
            .config
            .auth_token
            .as_deref()
            .ok_or_else(|| anyhow!("TWILIO_AUTH_TOKEN no está configurado"))?;
        let base = self
            .config
            .public_base_url
            .as_deref()
            .ok_or_else(|| anyhow!("PUBLIC_BASE_URL es necesario para validar firmas"))?;

        let expected = compute_signature(token, &format!("{}{}", base, path_and_query), form)?;
        Ok(expected.len() == signature.len()
            && openssl::memcmp::eq(expected.as_bytes(), signature.as_bytes()))
    }
}

pub fn compute_signature(auth_token: &str, url: &str, form: &WebhookForm) -> Result<String> {
    let mut payload = url.to_string();
    for (key, value) in form.iter() {
        payload.push_str(key);
        payload.push_str(value);
    }

    let key = PKey::hmac(auth_token.as_bytes()).context("Clave HMAC inválida")?;
    let mut signer = Signer::new(MessageDigest::sha1(), &key)?;
    signer.update(payload.as_bytes())?;
    let digest = signer.sign_to_vec()?;
    Ok(base64::encode(digest))
}
