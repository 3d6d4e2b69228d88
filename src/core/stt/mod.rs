//! Speech recognition settings.
//!
//! Audio is transcribed upstream of this service; what lives here is the
//! per-call recognition configuration handed to the media stream, which has
//! to follow the caller's language.

use serde::Serialize;
use url::Url;

pub const DEEPGRAM_LISTEN_URL: &str = "wss://api.deepgram.com/v1/listen";

#[derive(Debug, Clone, thiserror::Error)]
pub enum STTError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Deepgram streaming parameters for one call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionSettings {
    pub provider: &'static str,
    #[serde(skip)]
    pub api_key: String,
    pub model: String,
    /// Recognition locale, e.g. `es-MX`
    pub language: String,
    /// Carrier media streams are 8 kHz mono mu-law
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: String,
    pub punctuation: bool,
    pub interim_results: bool,
    pub smart_format: bool,
    /// Endpointing timeout in milliseconds
    pub endpointing: Option<u32>,
}

impl RecognitionSettings {
    pub fn deepgram(api_key: impl Into<String>) -> Self {
        Self {
            provider: "deepgram",
            api_key: api_key.into(),
            model: "nova-2".to_string(),
            language: "en-US".to_string(),
            sample_rate: 8000,
            channels: 1,
            encoding: "mulaw".to_string(),
            punctuation: true,
            interim_results: true,
            smart_format: true,
            endpointing: Some(300),
        }
    }

    /// Same settings, listening in `locale`.
    pub fn for_locale(&self, locale: &str) -> Self {
        Self {
            language: locale.to_string(),
            ..self.clone()
        }
    }

    /// Streaming endpoint with all parameters encoded in the query.
    pub fn websocket_url(&self) -> Result<String, STTError> {
        let mut url = Url::parse(DEEPGRAM_LISTEN_URL)
            .map_err(|e| STTError::InvalidConfiguration(format!("Invalid WebSocket URL: {e}")))?;

        {
            let mut query_pairs = url.query_pairs_mut();
            query_pairs.append_pair("model", &self.model);
            query_pairs.append_pair("language", &self.language);
            query_pairs.append_pair("encoding", &self.encoding);
            query_pairs.append_pair("sample_rate", &self.sample_rate.to_string());
            query_pairs.append_pair("channels", &self.channels.to_string());
            query_pairs.append_pair("punctuate", &self.punctuation.to_string());
            query_pairs.append_pair("interim_results", &self.interim_results.to_string());
            query_pairs.append_pair("smart_format", &self.smart_format.to_string());
            if let Some(endpointing) = self.endpointing {
                query_pairs.append_pair("endpointing", &endpointing.to_string());
            }
        }

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_locale_only_changes_language() {
        let base = RecognitionSettings::deepgram("dg-key");
        let spanish = base.for_locale("es-MX");
        assert_eq!(spanish.language, "es-MX");
        assert_eq!(spanish.model, base.model);
        assert_eq!(spanish.api_key, "dg-key");
    }

    #[test]
    fn test_websocket_url() {
        let url = RecognitionSettings::deepgram("k")
            .for_locale("es-MX")
            .websocket_url()
            .unwrap();
        assert!(url.starts_with("wss://api.deepgram.com/v1/listen?"));
        assert!(url.contains("language=es-MX"));
        assert!(url.contains("encoding=mulaw"));
        assert!(url.contains("sample_rate=8000"));
        assert!(url.contains("endpointing=300"));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let json = serde_json::to_value(RecognitionSettings::deepgram("secret")).unwrap();
        assert!(json.get("api_key").is_none());
        assert_eq!(json["provider"], "deepgram");
    }
}
