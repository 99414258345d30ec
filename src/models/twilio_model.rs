//! models/twilio_model.rs
//! Payloads form-encoded que manda Twilio en sus webhooks.

/// Cuerpo `application/x-www-form-urlencoded` ya decodificado.
/// Los pares quedan ordenados por clave (y valor) como los firma Twilio;
/// las claves repetidas se conservan.
#[derive(Debug, Clone, Default)]
pub struct WebhookForm {
    fields: Vec<(String, String)>,
}

impl WebhookForm {
    pub fn parse(body: &[u8]) -> Self {
        let mut fields: Vec<(String, String)> = url::form_urlencoded::parse(body)
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        fields.sort();

        WebhookForm { fields }
    }

    /// Primer valor no vacío de `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .find(|v| !v.is_empty())
    }

    /// Devuelve el valor o "" si no viene.
    pub fn get_or_empty(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Webhook de llamada entrante.
#[derive(Debug, Clone)]
pub struct IncomingCallWebhook {
    pub from: String,
    pub to: String,
    pub call_sid: String,
    pub caller_name: Option<String>,
}

impl From<&WebhookForm> for IncomingCallWebhook {
    fn from(form: &WebhookForm) -> Self {
        IncomingCallWebhook {
            from: form.get_or_empty("From"),
            to: form.get_or_empty("To"),
            call_sid: form.get_or_empty("CallSid"),
            caller_name: form.get("CallerName").map(str::to_string),
        }
    }
}

/// Webhook de estado de llamada (statusCallback del <Number>).
#[derive(Debug, Clone)]
pub struct CallStatusWebhook {
    pub call_sid: String,
    pub call_status: String,
    pub call_duration: Option<i64>,
    pub from: String,
    pub to: String,
}

impl From<&WebhookForm> for CallStatusWebhook {
    fn from(form: &WebhookForm) -> Self {
        CallStatusWebhook {
            call_sid: form.get_or_empty("CallSid"),
            call_status: form.get("CallStatus").unwrap_or("unknown").to_string(),
            call_duration: form.get("CallDuration").and_then(|d| d.parse().ok()),
            from: form.get_or_empty("From"),
            to: form.get_or_empty("To"),
        }
    }
}
