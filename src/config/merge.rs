use std::env;

use super::ServerConfig;
use super::validation::{
    require_api_key, validate_languages, validate_telephony_urls, validate_timings,
};
use super::yaml::YamlConfig;

/// Parse a numeric environment variable, naming the variable on failure.
fn env_number<T>(env_var: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(env_var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {env_var} environment variable: {e}").into()),
        Err(_) => Ok(None),
    }
}

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// The merged result is validated before it is returned: missing provider
/// keys, unknown or identical languages and zero timings are all errors.
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // Helper macro to get value with priority: YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for optional values: YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            $yaml_value.or_else(|| env::var($env_var).ok())
        };
    }

    // Server
    let host = get_value!(
        "HOST",
        yaml.server.as_ref().and_then(|s| s.host.clone()),
        "0.0.0.0"
    );

    let port = match yaml.server.as_ref().and_then(|s| s.port) {
        Some(port) => port,
        None => env_number::<u16>("PORT")?.unwrap_or(5001),
    };

    // Telephony
    let voice_stream_url = get_value!(
        "VOICE_STREAM_URL",
        yaml.telephony.as_ref().and_then(|t| t.voice_stream_url.clone()),
        "/voice-stream"
    );
    let consent_action_url = get_value!(
        "CONSENT_ACTION_URL",
        yaml.telephony.as_ref().and_then(|t| t.consent_action_url.clone()),
        "/consent-response"
    );

    // Providers
    let providers = yaml.providers.as_ref();
    let openai_api_key = require_api_key(
        "OPENAI_API_KEY",
        get_optional!("OPENAI_API_KEY", providers.and_then(|p| p.openai_api_key.clone())),
    )?;
    let openai_model = get_value!(
        "OPENAI_MODEL",
        providers.and_then(|p| p.openai_model.clone()),
        "gpt-4o-mini"
    );
    let elevenlabs_api_key = require_api_key(
        "ELEVENLABS_API_KEY",
        get_optional!(
            "ELEVENLABS_API_KEY",
            providers.and_then(|p| p.elevenlabs_api_key.clone())
        ),
    )?;
    let elevenlabs_model = get_value!(
        "ELEVENLABS_MODEL",
        providers.and_then(|p| p.elevenlabs_model.clone()),
        "eleven_multilingual_v2"
    );
    let deepgram_api_key = require_api_key(
        "DEEPGRAM_API_KEY",
        get_optional!(
            "DEEPGRAM_API_KEY",
            providers.and_then(|p| p.deepgram_api_key.clone())
        ),
    )?;
    let provider_timeout_seconds = match providers.and_then(|p| p.timeout_seconds) {
        Some(seconds) => seconds,
        None => env_number::<u64>("PROVIDER_TIMEOUT_SECONDS")?.unwrap_or(10),
    };

    // Language
    let primary_language = get_value!(
        "PRIMARY_LANGUAGE",
        yaml.language.as_ref().and_then(|l| l.primary.clone()),
        "es-LA"
    );
    let fallback_language = get_value!(
        "FALLBACK_LANGUAGE",
        yaml.language.as_ref().and_then(|l| l.fallback.clone()),
        "en-US"
    );

    // Conversation
    let voicemail_tick_ms = match yaml.conversation.as_ref().and_then(|c| c.voicemail_tick_ms) {
        Some(ms) => ms,
        None => env_number::<u64>("VOICEMAIL_TICK_MS")?.unwrap_or(250),
    };

    validate_languages(&primary_language, &fallback_language)?;
    validate_telephony_urls(&voice_stream_url, &consent_action_url)?;
    validate_timings(provider_timeout_seconds, voicemail_tick_ms)?;

    Ok(ServerConfig {
        host,
        port,
        voice_stream_url,
        consent_action_url,
        openai_api_key,
        openai_model,
        elevenlabs_api_key,
        elevenlabs_model,
        deepgram_api_key,
        primary_language,
        fallback_language,
        provider_timeout_seconds,
        voicemail_tick_ms,
    })
}
