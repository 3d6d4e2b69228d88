//! Call-flow documents returned to the telephony carrier.
//!
//! Every document is a pure function of a language profile: consent
//! collection, the greeting that connects the live media stream, and the
//! goodbye that hangs up. `Say` and `Gather` carry the profile's locale.

mod document;

pub use document::{Verb, VoiceDocument, escape_xml};

use crate::core::language::LanguageProfile;

/// Words that count as consent, matched as substrings of the case-folded
/// speech result.
pub const CONSENT_WORDS: &[&str] = &[
    "sí", "si", "yes", "ok", "vale", "continuar", "continue", "proceed",
];

/// Whether a gathered speech result grants consent.
pub fn is_consent(speech_result: &str) -> bool {
    let lowered = speech_result.to_lowercase();
    CONSENT_WORDS.iter().any(|word| lowered.contains(word))
}

#[derive(Debug, Clone)]
pub struct CallFlowDocumentBuilder {
    consent_action_url: String,
    stream_url: String,
}

impl CallFlowDocumentBuilder {
    pub fn new(consent_action_url: impl Into<String>, stream_url: impl Into<String>) -> Self {
        Self {
            consent_action_url: consent_action_url.into(),
            stream_url: stream_url.into(),
        }
    }

    fn say(text: &str, profile: &LanguageProfile) -> Verb {
        Verb::Say {
            text: text.to_string(),
            language: profile.locale.clone(),
        }
    }

    /// Consent prompt, a speech gather with instructions, and the
    /// no-response fallback read when the gather collects nothing.
    pub fn consent(&self, profile: &LanguageProfile) -> VoiceDocument {
        VoiceDocument::new(vec![
            Self::say(&profile.consent_prompt, profile),
            Verb::Gather {
                input: "speech".to_string(),
                language: profile.locale.clone(),
                speech_timeout: "auto".to_string(),
                action: self.consent_action_url.clone(),
                method: "POST".to_string(),
                children: vec![Self::say(&profile.instructions, profile)],
            },
            Self::say(&profile.no_response_prompt, profile),
        ])
    }

    pub fn greeting(&self, profile: &LanguageProfile) -> VoiceDocument {
        VoiceDocument::new(vec![
            Self::say(&profile.greeting, profile),
            Verb::Connect {
                stream_url: self.stream_url.clone(),
            },
        ])
    }

    pub fn goodbye(&self, profile: &LanguageProfile) -> VoiceDocument {
        VoiceDocument::new(vec![Self::say(&profile.goodbye_prompt, profile), Verb::Hangup])
    }
}

impl Default for CallFlowDocumentBuilder {
    fn default() -> Self {
        Self::new("/consent-response", "/voice-stream")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::language::{ENGLISH_US, LanguageProfileTable, SPANISH_LATAM};

    #[test]
    fn test_consent_words() {
        assert!(is_consent("Sí, claro"));
        assert!(is_consent("YES please"));
        assert!(is_consent("okay"));
        assert!(!is_consent("no gracias"));
        assert!(!is_consent(""));
    }

    #[test]
    fn test_consent_document_shape() {
        let table = LanguageProfileTable::default();
        let profile = table.resolve(SPANISH_LATAM);
        let doc = CallFlowDocumentBuilder::default().consent(profile);

        assert_eq!(doc.verbs.len(), 3);
        match &doc.verbs[1] {
            Verb::Gather {
                input,
                speech_timeout,
                action,
                children,
                language,
                ..
            } => {
                assert_eq!(input, "speech");
                assert_eq!(speech_timeout, "auto");
                assert_eq!(action, "/consent-response");
                assert_eq!(language, "es-MX");
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected Gather, got {other:?}"),
        }

        let xml = doc.to_xml();
        assert!(xml.contains("Esta llamada puede grabarse"));
        assert!(xml.contains("<Say language=\"es-MX\">No se recibió respuesta. Llamada terminada.</Say></Response>"));
    }

    #[test]
    fn test_greeting_connects_stream() {
        let table = LanguageProfileTable::default();
        let builder = CallFlowDocumentBuilder::new("/consent-response", "wss://example.test/media");
        let xml = builder.greeting(table.resolve(ENGLISH_US)).to_xml();
        assert!(xml.contains("<Say language=\"en-US\">Hello, I&apos;m your AI agent for LATAM. How can I help you?</Say>"));
        assert!(xml.contains("<Connect><Stream url=\"wss://example.test/media\" /></Connect>"));
    }

    #[test]
    fn test_goodbye_hangs_up() {
        let table = LanguageProfileTable::default();
        let doc = CallFlowDocumentBuilder::default().goodbye(table.resolve("unknown"));
        assert_eq!(doc.verbs.last(), Some(&Verb::Hangup));
        assert!(doc.to_xml().contains("¡Que tengas un buen día!"));
    }
}
