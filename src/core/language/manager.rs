//! Keyword language detection with switch hysteresis.
//!
//! Detection scores a transcript against two fixed keyword lexicons. The
//! resulting confidence is coarse on purpose: the hysteresis rule below was
//! tuned against these exact values.
//!
//! # Switch rule
//!
//! ```text
//! detected != current && confidence >= 0.8  ──► streak += 1 ──► streak == 2 ──► switch, streak = 0
//! detected == current                       ──► streak = 0 (confidence stored)
//! confidence < 0.8 (other language)         ──► ignored
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::profiles::{ENGLISH_US, LanguageProfile, LanguageProfileTable, SPANISH_LATAM};

/// Minimum confidence for a detection to count towards a switch.
pub const SWITCH_THRESHOLD: f64 = 0.8;

/// Consecutive qualifying detections required before a switch commits.
pub const REQUIRED_CONSECUTIVE_DETECTIONS: u32 = 2;

/// Confidence reported when no lexicon entry matches.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const SPANISH_INDICATORS: &[&str] = &[
    "hola",
    "gracias",
    "por favor",
    "ayuda",
    "necesito",
    "reserva",
    "servicio",
    "cliente",
    "cuenta",
    "problema",
    "solución",
    "información",
    "órale",
    "chido",
    "padre",
    "cañón",
    "manches",
    "mames",
    "cabrón",
    "carnal",
    "güey",
    "onda",
    "qué",
    "cómo",
    "dónde",
    "cuándo",
];

const ENGLISH_INDICATORS: &[&str] = &[
    "hello",
    "hi",
    "help",
    "need",
    "reservation",
    "service",
    "customer",
    "account",
    "problem",
    "solution",
    "information",
    "thank you",
    "please",
    "what",
    "how",
    "where",
    "when",
    "why",
    "can you",
    "i need",
];

/// Result of scoring a transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub language: String,
    pub confidence: f64,
}

/// A committed language switch.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageSwitch {
    pub from: String,
    pub to: String,
    pub confidence: f64,
}

/// Detection and hysteresis state for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageDetectionState {
    pub current_language: String,
    pub primary_language: String,
    pub fallback_language: String,
    pub language_confidence: f64,
    pub consecutive_detections: u32,
    pub language_switches: u32,
    pub switch_threshold: f64,
    /// Alternate language the current streak is counting towards
    #[serde(skip)]
    pending_language: Option<String>,
}

impl LanguageDetectionState {
    fn new(primary: &str, fallback: &str) -> Self {
        Self {
            current_language: primary.to_string(),
            primary_language: primary.to_string(),
            fallback_language: fallback.to_string(),
            language_confidence: 0.0,
            consecutive_detections: 0,
            language_switches: 0,
            switch_threshold: SWITCH_THRESHOLD,
            pending_language: None,
        }
    }
}

/// Decides which language a conversation is held in.
#[derive(Debug, Clone)]
pub struct LanguageManager {
    profiles: Arc<LanguageProfileTable>,
    state: LanguageDetectionState,
}

/// Count lexicon entries present in already lower-cased text.
fn lexicon_score(text: &str, lexicon: &[&str]) -> usize {
    lexicon.iter().filter(|word| text.contains(*word)).count()
}

impl LanguageManager {
    /// Create a manager starting in the table's primary language.
    pub fn new(profiles: Arc<LanguageProfileTable>) -> Self {
        let state =
            LanguageDetectionState::new(profiles.primary_language(), profiles.fallback_language());
        Self { profiles, state }
    }

    /// Score `text` against the Spanish and English lexicons.
    ///
    /// Each lexicon entry contributes at most once. With no hits the primary
    /// language is returned with [`DEFAULT_CONFIDENCE`]. Equal scores go to
    /// Spanish, whose lexicon is evaluated first.
    pub fn detect(&self, text: &str) -> Detection {
        let lowered = text.to_lowercase();
        let spanish = lexicon_score(&lowered, SPANISH_INDICATORS);
        let english = lexicon_score(&lowered, ENGLISH_INDICATORS);
        let total = spanish + english;

        if total == 0 {
            return Detection {
                language: self.state.primary_language.clone(),
                confidence: DEFAULT_CONFIDENCE,
            };
        }

        let (language, score) = if spanish >= english {
            (SPANISH_LATAM, spanish)
        } else {
            (ENGLISH_US, english)
        };

        Detection {
            language: language.to_string(),
            confidence: score as f64 / total as f64,
        }
    }

    /// Feed one detection into the hysteresis rule.
    ///
    /// Returns the committed switch, if this detection completed one.
    pub fn evaluate_switch(&mut self, detected: &str, confidence: f64) -> Option<LanguageSwitch> {
        let state = &mut self.state;

        if detected == state.current_language {
            state.consecutive_detections = 0;
            state.pending_language = None;
            state.language_confidence = confidence;
            return None;
        }

        if confidence < state.switch_threshold {
            debug!(
                "Ignoring low-confidence detection of {} ({:.2})",
                detected, confidence
            );
            return None;
        }

        // A qualifying detection for a different alternate breaks the streak
        if state
            .pending_language
            .as_deref()
            .is_some_and(|pending| pending != detected)
        {
            state.consecutive_detections = 0;
            state.pending_language = None;
            return None;
        }

        state.pending_language = Some(detected.to_string());
        state.consecutive_detections += 1;

        if state.consecutive_detections < REQUIRED_CONSECUTIVE_DETECTIONS {
            return None;
        }

        let from = std::mem::replace(&mut state.current_language, detected.to_string());
        state.language_confidence = confidence;
        state.language_switches += 1;
        state.consecutive_detections = 0;
        state.pending_language = None;

        info!(
            "Language switched from {} to {} (confidence: {:.2})",
            from, detected, confidence
        );

        Some(LanguageSwitch {
            from,
            to: detected.to_string(),
            confidence,
        })
    }

    /// Profile of the active language, or the primary profile if unknown.
    pub fn current_config(&self) -> &LanguageProfile {
        self.profiles.resolve(&self.state.current_language)
    }

    pub fn current_language(&self) -> &str {
        &self.state.current_language
    }

    pub fn state(&self) -> &LanguageDetectionState {
        &self.state
    }

    pub fn profiles(&self) -> &Arc<LanguageProfileTable> {
        &self.profiles
    }
}
