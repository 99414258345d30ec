//! models/twiml_model.rs
//! Constructor mínimo de documentos TwiML (voice-control XML de Twilio).

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Clone)]
enum Verb {
    Say {
        voice: Option<String>,
        text: String,
    },
    Dial {
        attrs: Vec<(String, String)>,
        number: DialNumber,
    },
}

/// `<Number>` dentro de un `<Dial>`.
#[derive(Debug, Clone)]
pub struct DialNumber {
    pub number: String,
    pub attrs: Vec<(String, String)>,
}

impl DialNumber {
    pub fn new(number: impl Into<String>) -> Self {
        DialNumber {
            number: number.into(),
            attrs: vec![],
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, voice: Option<&str>, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say {
            voice: voice.map(str::to_string),
            text: text.into(),
        });
        self
    }

    pub fn dial(mut self, attrs: Vec<(String, String)>, number: DialNumber) -> Self {
        self.verbs.push(Verb::Dial { attrs, number });
        self
    }

    /// Serializa a XML. Un VoiceResponse vacío es el "ack" que espera Twilio.
    pub fn to_xml(&self) -> String {
        let mut out = String::from(XML_HEADER);
        out.push_str("<Response>");
        for verb in &self.verbs {
            match verb {
                Verb::Say { voice, text } => {
                    out.push_str("<Say");
                    if let Some(v) = voice {
                        push_attr(&mut out, "voice", v);
                    }
                    out.push('>');
                    out.push_str(&escape_xml(text));
                    out.push_str("</Say>");
                }
                Verb::Dial { attrs, number } => {
                    out.push_str("<Dial");
                    for (k, v) in attrs {
                        push_attr(&mut out, k, v);
                    }
                    out.push_str("><Number");
                    for (k, v) in &number.attrs {
                        push_attr(&mut out, k, v);
                    }
                    out.push('>');
                    out.push_str(&escape_xml(&number.number));
                    out.push_str("</Number></Dial>");
                }
            }
        }
        out.push_str("</Response>");
        out
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_xml(value));
    out.push('"');
}

pub fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
