use crate::core::language::LanguageProfileTable;

/// Require a provider credential.
///
/// Missing or blank keys are fatal: the service refuses to start rather
/// than run without a provider.
pub fn require_api_key(
    env_var: &str,
    value: Option<String>,
) -> Result<String, Box<dyn std::error::Error>> {
    match value.map(|v| v.trim().to_string()) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(format!("{env_var} is required but not configured").into()),
    }
}

/// Validate that both language codes have profiles and differ
pub fn validate_languages(primary: &str, fallback: &str) -> Result<(), Box<dyn std::error::Error>> {
    LanguageProfileTable::new(primary, fallback)
        .map(|_| ())
        .map_err(|e| format!("Invalid language configuration: {e}").into())
}

/// Validate carrier-facing URLs used inside call-flow documents
pub fn validate_telephony_urls(
    voice_stream_url: &str,
    consent_action_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if voice_stream_url.trim().is_empty() {
        return Err("VOICE_STREAM_URL cannot be empty".into());
    }
    if consent_action_url.trim().is_empty() {
        return Err("CONSENT_ACTION_URL cannot be empty".into());
    }
    Ok(())
}

/// Validate timing settings
pub fn validate_timings(
    provider_timeout_seconds: u64,
    voicemail_tick_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    if provider_timeout_seconds == 0 {
        return Err("PROVIDER_TIMEOUT_SECONDS must be greater than 0".into());
    }
    if voicemail_tick_ms == 0 || voicemail_tick_ms > 3000 {
        return Err(format!(
            "VOICEMAIL_TICK_MS must be between 1 and 3000, got {voicemail_tick_ms}"
        )
        .into());
    }
    Ok(())
}
