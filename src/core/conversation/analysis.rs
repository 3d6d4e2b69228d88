//! Transcript heuristics: Mexican Spanish slang and audio-quality markers.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static SLANG_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(órale|chido|padre|cañón|manches|mames|cabrón|carnal|güey|onda)\b",
        r"\b(no manches|no mames|está chido|está padre|está cañón|está cabrón)\b",
        r"\b(órale güey|órale carnal|qué onda|qué chido)\b",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Return the first colloquial Mexican Spanish phrase found in `text`.
pub fn detect_slang(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    SLANG_PATTERNS
        .iter()
        .find_map(|re| re.find(&lowered))
        .map(|m| m.as_str().to_string())
}

/// Transcription artefacts that hint at a poor audio channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioQualityIssue {
    /// Ellipsis or parenthetical marker such as `(static)`
    IncompleteSpeech,
    /// Three identical consecutive tokens
    RepeatedWords,
    /// Under ten characters and not a question
    ShortResponse,
}

impl AudioQualityIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioQualityIssue::IncompleteSpeech => "incomplete_speech",
            AudioQualityIssue::RepeatedWords => "repeated_words",
            AudioQualityIssue::ShortResponse => "short_response",
        }
    }
}

impl fmt::Display for AudioQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `text`; the first matching issue in declaration order wins.
pub fn detect_audio_quality_issue(text: &str) -> Option<AudioQualityIssue> {
    if text.contains("...") || text.contains('(') {
        return Some(AudioQualityIssue::IncompleteSpeech);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > 3 && words.windows(3).any(|w| w[0] == w[1] && w[1] == w[2]) {
        return Some(AudioQualityIssue::RepeatedWords);
    }

    if text.trim().chars().count() < 10 && !text.ends_with('?') {
        return Some(AudioQualityIssue::ShortResponse);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slang_single_word() {
        assert_eq!(detect_slang("Órale, gracias").as_deref(), Some("órale"));
        assert_eq!(detect_slang("eso está muy chido").as_deref(), Some("chido"));
    }

    #[test]
    fn test_slang_requires_word_boundary() {
        // "padre" is slang, "padres" is not
        assert!(detect_slang("mis padres llegaron").is_none());
        assert!(detect_slang("Hello, I need help").is_none());
    }

    #[test]
    fn test_slang_phrase() {
        assert_eq!(detect_slang("Qué onda carnal").as_deref(), Some("onda"));
        assert!(detect_slang("no manches").is_some());
    }

    #[test]
    fn test_incomplete_speech_markers() {
        assert_eq!(
            detect_audio_quality_issue("Hola... (static) ... necesito ayuda"),
            Some(AudioQualityIssue::IncompleteSpeech)
        );
        assert_eq!(
            detect_audio_quality_issue("quiero (ruido) una reserva para mañana"),
            Some(AudioQualityIssue::IncompleteSpeech)
        );
    }

    #[test]
    fn test_repeated_words() {
        assert_eq!(
            detect_audio_quality_issue("I need need need a reservation"),
            Some(AudioQualityIssue::RepeatedWords)
        );
        // Only three tokens, so the repetition rule does not apply
        assert_eq!(
            detect_audio_quality_issue("no no no"),
            Some(AudioQualityIssue::ShortResponse)
        );
    }

    #[test]
    fn test_short_response() {
        assert_eq!(
            detect_audio_quality_issue("  sí  "),
            Some(AudioQualityIssue::ShortResponse)
        );
        assert_eq!(detect_audio_quality_issue("why?"), None);
    }

    #[test]
    fn test_clean_transcript() {
        assert_eq!(
            detect_audio_quality_issue("Hola, necesito ayuda con mi cuenta"),
            None
        );
    }

    #[test]
    fn test_issue_names() {
        assert_eq!(AudioQualityIssue::RepeatedWords.to_string(), "repeated_words");
    }
}
