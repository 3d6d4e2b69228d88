//! Voice-control document tree and its XML rendering.

/// Escapes special XML characters for text nodes and attribute values.
///
/// ```rust
/// use voxcall::core::twiml::escape_xml;
///
/// assert_eq!(escape_xml("Tom & Jerry"), "Tom &amp; Jerry");
/// assert_eq!(escape_xml("<Say>"), "&lt;Say&gt;");
/// ```
pub fn escape_xml(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

/// One instruction to the telephony carrier.
#[derive(Debug, Clone, PartialEq)]
pub enum Verb {
    Say {
        text: String,
        language: String,
    },
    Gather {
        input: String,
        language: String,
        speech_timeout: String,
        action: String,
        method: String,
        children: Vec<Verb>,
    },
    Connect {
        stream_url: String,
    },
    Hangup,
}

impl Verb {
    fn render(&self, out: &mut String) {
        match self {
            Verb::Say { text, language } => {
                out.push_str(&format!(
                    "<Say language=\"{}\">{}</Say>",
                    escape_xml(language),
                    escape_xml(text)
                ));
            }
            Verb::Gather {
                input,
                language,
                speech_timeout,
                action,
                method,
                children,
            } => {
                out.push_str(&format!(
                    "<Gather input=\"{}\" language=\"{}\" speechTimeout=\"{}\" action=\"{}\" method=\"{}\">",
                    escape_xml(input),
                    escape_xml(language),
                    escape_xml(speech_timeout),
                    escape_xml(action),
                    escape_xml(method),
                ));
                for child in children {
                    child.render(out);
                }
                out.push_str("</Gather>");
            }
            Verb::Connect { stream_url } => {
                out.push_str(&format!(
                    "<Connect><Stream url=\"{}\" /></Connect>",
                    escape_xml(stream_url)
                ));
            }
            Verb::Hangup => out.push_str("<Hangup />"),
        }
    }
}

/// A `<Response>` document, rendered in verb order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceDocument {
    pub verbs: Vec<Verb>,
}

impl VoiceDocument {
    pub fn new(verbs: Vec<Verb>) -> Self {
        Self { verbs }
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
        for verb in &self.verbs {
            verb.render(&mut out);
        }
        out.push_str("</Response>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&apos;x&apos;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
        assert_eq!(escape_xml("¿Deseas continuar?"), "¿Deseas continuar?");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(
            VoiceDocument::default().to_xml(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>"
        );
    }

    #[test]
    fn test_nested_gather_rendering() {
        let doc = VoiceDocument::new(vec![Verb::Gather {
            input: "speech".to_string(),
            language: "es-MX".to_string(),
            speech_timeout: "auto".to_string(),
            action: "/consent-response?a=1&b=2".to_string(),
            method: "POST".to_string(),
            children: vec![Verb::Say {
                text: "Hola".to_string(),
                language: "es-MX".to_string(),
            }],
        }]);
        let xml = doc.to_xml();
        assert!(xml.contains(
            "<Gather input=\"speech\" language=\"es-MX\" speechTimeout=\"auto\" action=\"/consent-response?a=1&amp;b=2\" method=\"POST\"><Say language=\"es-MX\">Hola</Say></Gather>"
        ));
    }
}
