use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration; anything missing
/// falls back to the environment and then to defaults.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5001
///
/// telephony:
///   voice_stream_url: "wss://agent.example.com/voice-stream"
///   consent_action_url: "/consent-response"
///
/// providers:
///   openai_api_key: "sk-..."
///   openai_model: "gpt-4o-mini"
///   elevenlabs_api_key: "your-elevenlabs-key"
///   elevenlabs_model: "eleven_multilingual_v2"
///   deepgram_api_key: "your-deepgram-key"
///   timeout_seconds: 10
///
/// language:
///   primary: "es-LA"
///   fallback: "en-US"
///
/// conversation:
///   voicemail_tick_ms: 250
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub telephony: Option<TelephonyYaml>,
    pub providers: Option<ProvidersYaml>,
    pub language: Option<LanguageYaml>,
    pub conversation: Option<ConversationYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Carrier-facing URLs embedded in call-flow documents
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TelephonyYaml {
    pub voice_stream_url: Option<String>,
    pub consent_action_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_model: Option<String>,
    pub deepgram_api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LanguageYaml {
    pub primary: Option<String>,
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConversationYaml {
    pub voicemail_tick_ms: Option<u64>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
