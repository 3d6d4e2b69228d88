//! Static language profiles.
//!
//! A profile bundles everything the agent needs to speak and listen in one
//! language: the prompts read to the caller, the TTS voice, the recognition
//! locale and the LLM system prompt. Profiles are loaded once at startup and
//! never mutated afterwards.

use serde::Serialize;

use super::LanguageError;

/// Language code of the Spanish (LATAM) profile.
pub const SPANISH_LATAM: &str = "es-LA";

/// Language code of the English (US) profile.
pub const ENGLISH_US: &str = "en-US";

/// Default ElevenLabs voice used by both built-in profiles.
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Prompts, voice and instructions for one supported language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageProfile {
    pub code: String,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Locale tag used for `Say`/`Gather` and speech recognition
    pub locale: String,
    #[serde(rename = "tts_voice")]
    pub voice_id: String,
    pub greeting: String,
    #[serde(rename = "consent")]
    pub consent_prompt: String,
    pub instructions: String,
    #[serde(rename = "no_response")]
    pub no_response_prompt: String,
    #[serde(rename = "goodbye")]
    pub goodbye_prompt: String,
    pub system_prompt: String,
}

impl LanguageProfile {
    fn spanish_latam() -> Self {
        Self {
            code: SPANISH_LATAM.to_string(),
            display_name: "Spanish (LATAM)".to_string(),
            locale: "es-MX".to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            greeting: "Hola, soy tu agente AI para LATAM. ¿En qué puedo ayudarte?".to_string(),
            consent_prompt: "Esta llamada puede grabarse para calidad. ¿Deseas continuar?"
                .to_string(),
            instructions: "Por favor responde sí o no.".to_string(),
            no_response_prompt: "No se recibió respuesta. Llamada terminada.".to_string(),
            goodbye_prompt: "Entendido. Llamada terminada. ¡Que tengas un buen día!".to_string(),
            system_prompt: "Eres un agente de servicio al cliente útil, responde en español \
                mexicano, maneja casos como reservas o soporte. Sé amigable, profesional y \
                eficiente. Entiendes y usas expresiones mexicanas coloquiales cuando es \
                apropiado."
                .to_string(),
        }
    }

    fn english_us() -> Self {
        Self {
            code: ENGLISH_US.to_string(),
            display_name: "English (US)".to_string(),
            locale: "en-US".to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            greeting: "Hello, I'm your AI agent for LATAM. How can I help you?".to_string(),
            consent_prompt:
                "This call may be recorded for quality purposes. Do you wish to continue?"
                    .to_string(),
            instructions: "Please answer yes or no.".to_string(),
            no_response_prompt: "No response received. Call terminated.".to_string(),
            goodbye_prompt: "Understood. Call terminated. Have a great day!".to_string(),
            system_prompt: "You are a helpful customer service agent, respond in English, \
                handle cases like reservations or support. Be friendly, professional, and \
                efficient."
                .to_string(),
        }
    }
}

/// Immutable table of language profiles keyed by language code.
///
/// The table always contains the primary and fallback profiles; lookups of
/// unknown codes resolve to the primary profile.
#[derive(Debug, Clone)]
pub struct LanguageProfileTable {
    profiles: Vec<LanguageProfile>,
    primary: usize,
    fallback: usize,
}

impl LanguageProfileTable {
    /// Build the built-in table with the given primary and fallback codes.
    pub fn new(primary: &str, fallback: &str) -> Result<Self, LanguageError> {
        Self::from_profiles(
            vec![LanguageProfile::spanish_latam(), LanguageProfile::english_us()],
            primary,
            fallback,
        )
    }

    /// Build a table from an explicit profile list.
    pub fn from_profiles(
        profiles: Vec<LanguageProfile>,
        primary: &str,
        fallback: &str,
    ) -> Result<Self, LanguageError> {
        if primary == fallback {
            return Err(LanguageError::DuplicateLanguages(primary.to_string()));
        }

        let position = |code: &str| {
            profiles
                .iter()
                .position(|p| p.code == code)
                .ok_or_else(|| LanguageError::UnknownLanguage(code.to_string()))
        };
        let primary = position(primary)?;
        let fallback = position(fallback)?;

        Ok(Self {
            profiles,
            primary,
            fallback,
        })
    }

    pub fn get(&self, code: &str) -> Option<&LanguageProfile> {
        self.profiles.iter().find(|p| p.code == code)
    }

    /// Look up a profile, falling back to the primary profile for unknown codes.
    pub fn resolve(&self, code: &str) -> &LanguageProfile {
        self.get(code).unwrap_or_else(|| self.primary_profile())
    }

    pub fn primary_profile(&self) -> &LanguageProfile {
        &self.profiles[self.primary]
    }

    pub fn primary_language(&self) -> &str {
        &self.profiles[self.primary].code
    }

    pub fn fallback_language(&self) -> &str {
        &self.profiles[self.fallback].code
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Supported language codes in table order.
    pub fn codes(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.code.clone()).collect()
    }
}

impl Default for LanguageProfileTable {
    fn default() -> Self {
        Self {
            profiles: vec![LanguageProfile::spanish_latam(), LanguageProfile::english_us()],
            primary: 0,
            fallback: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_has_both_languages() {
        let table = LanguageProfileTable::default();
        assert_eq!(table.primary_language(), SPANISH_LATAM);
        assert_eq!(table.fallback_language(), ENGLISH_US);
        assert_eq!(table.codes(), vec!["es-LA".to_string(), "en-US".to_string()]);
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_primary() {
        let table = LanguageProfileTable::default();
        let profile = table.resolve("fr-FR");
        assert_eq!(profile.code, SPANISH_LATAM);
        assert_eq!(profile.locale, "es-MX");
    }

    #[test]
    fn test_swapped_primary() {
        let table = LanguageProfileTable::new(ENGLISH_US, SPANISH_LATAM).unwrap();
        assert_eq!(table.primary_profile().code, ENGLISH_US);
        assert_eq!(table.resolve("xx").code, ENGLISH_US);
    }

    #[test]
    fn test_unknown_primary_rejected() {
        let result = LanguageProfileTable::new("pt-BR", ENGLISH_US);
        assert!(matches!(result, Err(LanguageError::UnknownLanguage(code)) if code == "pt-BR"));
    }

    #[test]
    fn test_identical_primary_and_fallback_rejected() {
        let result = LanguageProfileTable::new(ENGLISH_US, ENGLISH_US);
        assert!(matches!(result, Err(LanguageError::DuplicateLanguages(_))));
    }

    #[test]
    fn test_profile_serializes_with_public_field_names() {
        let table = LanguageProfileTable::default();
        let json = serde_json::to_value(table.resolve(ENGLISH_US)).unwrap();
        assert_eq!(json["name"], "English (US)");
        assert_eq!(json["tts_voice"], "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(json["goodbye"], "Understood. Call terminated. Have a great day!");
    }
}
