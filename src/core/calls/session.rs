//! Call session records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::latency::{LatencyKind, LatencySamples};

/// Who initiated the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Inbound,
    Outbound,
    /// Synthetic call created through the testing endpoints
    Test,
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallDirection::Inbound => "inbound",
            CallDirection::Outbound => "outbound",
            CallDirection::Test => "test",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Active,
    Completed,
}

/// One telephone interaction, from ring to termination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSession {
    pub call_sid: String,
    pub phone_number: String,
    pub direction: CallDirection,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds between start and end, stamped on termination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub status: CallStatus,
    pub language: String,
    #[serde(flatten)]
    pub latency: LatencySamples,
    pub language_switches: u32,
    pub interruptions: u32,
    pub utterances: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<String>,
}

impl CallSession {
    pub(crate) fn new(
        call_sid: &str,
        phone_number: &str,
        direction: CallDirection,
        language: &str,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            call_sid: call_sid.to_string(),
            phone_number: phone_number.to_string(),
            direction,
            start_time,
            end_time: None,
            duration: None,
            status: CallStatus::Active,
            language: language.to_string(),
            latency: LatencySamples::default(),
            language_switches: 0,
            interruptions: 0,
            utterances: 0,
            end_reason: None,
        }
    }

    /// Stamp the termination fields. Duration is clamped at zero.
    pub(crate) fn complete(&mut self, reason: &str, end_time: DateTime<Utc>) {
        let elapsed_ms = (end_time - self.start_time).num_milliseconds().max(0);
        self.end_time = Some(end_time);
        self.duration = Some(elapsed_ms as f64 / 1000.0);
        self.end_reason = Some(reason.to_string());
        self.status = CallStatus::Completed;
    }
}

/// Per-call performance view served by `/performance?call_sid=`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallPerformance {
    pub call_sid: String,
    pub status: CallStatus,
    pub duration: f64,
    pub language: String,
    pub language_switches: u32,
    pub interruptions: u32,
    pub utterances: u32,
    pub avg_stt_latency: f64,
    pub avg_llm_latency: f64,
    pub avg_tts_latency: f64,
}

impl From<&CallSession> for CallPerformance {
    fn from(session: &CallSession) -> Self {
        Self {
            call_sid: session.call_sid.clone(),
            status: session.status,
            duration: session.duration.unwrap_or(0.0),
            language: session.language.clone(),
            language_switches: session.language_switches,
            interruptions: session.interruptions,
            utterances: session.utterances,
            avg_stt_latency: session.latency.ring(LatencyKind::Stt).mean(),
            avg_llm_latency: session.latency.ring(LatencyKind::Llm).mean(),
            avg_tts_latency: session.latency.ring(LatencyKind::Tts).mean(),
        }
    }
}
