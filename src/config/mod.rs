//! Configuration module for the voxcall server
//!
//! Configuration comes from an optional YAML file and environment variables.
//! YAML values win over environment variables, which win over defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voxcall::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file, falling back to the environment
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod validation;
mod yaml;

/// Server configuration
///
/// Contains everything needed to run the voice agent:
/// - Server settings (host, port)
/// - Carrier-facing URLs embedded in call-flow documents
/// - Provider credentials and models (OpenAI, ElevenLabs, Deepgram)
/// - The primary/fallback language pair
/// - Provider timeout and voicemail tick interval
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Telephony
    pub voice_stream_url: String,
    pub consent_action_url: String,

    // Providers
    pub openai_api_key: String,
    pub openai_model: String,
    pub elevenlabs_api_key: String,
    pub elevenlabs_model: String,
    pub deepgram_api_key: String,
    pub provider_timeout_seconds: u64,

    // Language
    pub primary_language: String,
    pub fallback_language: String,

    // Conversation
    pub voicemail_tick_ms: u64,
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable fallback
    ///
    /// The `.env` file is not loaded here: the YAML file is the source of
    /// truth and only real environment variables fill in what it omits.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the merged
    /// configuration fails validation.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        merge::merge_config(Some(yaml_config))
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_seconds)
    }

    pub fn voicemail_tick(&self) -> Duration {
        Duration::from_millis(self.voicemail_tick_ms)
    }

    /// Human-readable summary with credentials masked, printed by `check-config`.
    pub fn summary(&self) -> String {
        format!(
            "address: {}\n\
             voice_stream_url: {}\n\
             consent_action_url: {}\n\
             openai: model={} key={}\n\
             elevenlabs: model={} key={}\n\
             deepgram: key={}\n\
             languages: primary={} fallback={}\n\
             provider_timeout_seconds: {}\n\
             voicemail_tick_ms: {}",
            self.address(),
            self.voice_stream_url,
            self.consent_action_url,
            self.openai_model,
            mask_secret(&self.openai_api_key),
            self.elevenlabs_model,
            mask_secret(&self.elevenlabs_api_key),
            mask_secret(&self.deepgram_api_key),
            self.primary_language,
            self.fallback_language,
            self.provider_timeout_seconds,
            self.voicemail_tick_ms,
        )
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
