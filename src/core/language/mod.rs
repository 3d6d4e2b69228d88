//! Language profiles, detection and switching.

pub mod manager;
pub mod profiles;

pub use manager::{
    DEFAULT_CONFIDENCE, Detection, LanguageDetectionState, LanguageManager, LanguageSwitch,
    REQUIRED_CONSECUTIVE_DETECTIONS, SWITCH_THRESHOLD,
};
pub use profiles::{ENGLISH_US, LanguageProfile, LanguageProfileTable, SPANISH_LATAM};

/// Errors raised while building the language table
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LanguageError {
    #[error("Unsupported language: {0}")]
    UnknownLanguage(String),
    #[error("Primary and fallback language must differ: {0}")]
    DuplicateLanguages(String),
}
