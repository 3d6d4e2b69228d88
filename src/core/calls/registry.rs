//! Concurrency-safe registry of live and completed calls.
//!
//! Every operation takes the registry-wide lock for the duration of one
//! logical step and never across an await point. Mutations addressed to an
//! unknown call id are silent no-ops: telephony callbacks can legitimately
//! race the registry (a late metric for a call that already hung up).

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Local, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::latency::{LatencyKind, mean, p95_nearest_rank};
use super::session::{CallDirection, CallSession};

/// Completed calls kept for `recent_history`; the oldest are dropped first.
pub const CALL_HISTORY_CAPACITY: usize = 1000;

/// Live operating picture across the currently active calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalMetrics {
    pub active_calls: usize,
    pub total_calls_today: u64,
    pub avg_stt_latency: f64,
    pub avg_llm_latency: f64,
    pub avg_tts_latency: f64,
    pub avg_total_latency: f64,
    pub p95_latency: f64,
    pub min_latency: f64,
    pub max_latency: f64,
    pub total_utterances: u64,
    pub total_interruptions: u64,
    pub total_language_switches: u64,
}

/// Round to millisecond resolution for reporting.
fn round_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

#[derive(Default)]
struct RegistryInner {
    active: HashMap<String, CallSession>,
    history: VecDeque<CallSession>,
    total_calls_today: u64,
    last_reset_date: Option<NaiveDate>,
}

impl RegistryInner {
    /// Reset the daily counter once per calendar date change.
    fn roll_daily_stats(&mut self, today: NaiveDate) {
        if self.last_reset_date != Some(today) {
            self.last_reset_date = Some(today);
            self.total_calls_today = 0;
            info!("Daily call statistics reset for {}", today);
        }
    }
}

/// Store of in-progress and completed call sessions.
pub struct CallRegistry {
    default_language: String,
    inner: Mutex<RegistryInner>,
}

impl CallRegistry {
    /// Create a registry whose new calls start in `default_language`.
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into(),
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// Begin tracking a call.
    ///
    /// A second start for an id that is still active overwrites the prior
    /// record; the collision is logged.
    pub fn start_call(&self, call_sid: &str, phone_number: &str, direction: CallDirection) {
        self.start_call_at(
            call_sid,
            phone_number,
            direction,
            Utc::now(),
            Local::now().date_naive(),
        );
    }

    pub(crate) fn start_call_at(
        &self,
        call_sid: &str,
        phone_number: &str,
        direction: CallDirection,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) {
        let mut inner = self.inner.lock();
        inner.roll_daily_stats(today);

        let session =
            CallSession::new(call_sid, phone_number, direction, &self.default_language, now);
        if inner.active.insert(call_sid.to_string(), session).is_some() {
            warn!(
                "Call {} started while already active; previous record overwritten",
                call_sid
            );
        }
        inner.total_calls_today += 1;

        info!(
            "Call started: {} from {} ({})",
            call_sid, phone_number, direction
        );
        info!("Active calls: {}", inner.active.len());
    }

    /// Stop tracking a call and move it to history.
    ///
    /// Returns the completed record, or `None` when the id was not active.
    pub fn end_call(&self, call_sid: &str, reason: &str) -> Option<CallSession> {
        let mut inner = self.inner.lock();
        let Some(mut session) = inner.active.remove(call_sid) else {
            debug!("end_call for unknown call {}", call_sid);
            return None;
        };

        session.complete(reason, Utc::now());
        info!(
            "Call ended: {} ({}) - Duration: {:.1}s",
            call_sid,
            reason,
            session.duration.unwrap_or_default()
        );
        inner.history.push_back(session.clone());
        if inner.history.len() > CALL_HISTORY_CAPACITY {
            inner.history.pop_front();
        }
        info!("Active calls: {}", inner.active.len());

        Some(session)
    }

    /// Record the call's new language, counting a switch if it changed.
    pub fn update_language(&self, call_sid: &str, language: &str) {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.active.get_mut(call_sid)
            && session.language != language
        {
            info!(
                "Call {}: language changed from {} to {}",
                call_sid, session.language, language
            );
            session.language = language.to_string();
            session.language_switches += 1;
        }
    }

    pub fn record_metric(&self, call_sid: &str, kind: LatencyKind, latency_seconds: f64) {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.active.get_mut(call_sid) {
            session.latency.ring_mut(kind).push(latency_seconds);
        }
    }

    pub fn record_interruption(&self, call_sid: &str) {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.active.get_mut(call_sid) {
            session.interruptions += 1;
            info!("Call {}: user interruption recorded", call_sid);
        }
    }

    pub fn record_utterance(&self, call_sid: &str) {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.active.get_mut(call_sid) {
            session.utterances += 1;
        }
    }

    pub fn active_call_count(&self) -> usize {
        self.inner.lock().active.len()
    }

    /// Aggregate metrics over the active calls only.
    pub fn snapshot_global_metrics(&self) -> GlobalMetrics {
        let inner = self.inner.lock();
        let sessions = || inner.active.values();

        let stage_mean = |kind: LatencyKind| {
            mean(sessions().flat_map(|s| s.latency.ring(kind).iter()))
        };

        let mut totals: Vec<f64> = sessions()
            .flat_map(|s| s.latency.ring(LatencyKind::Total).iter())
            .collect();
        totals.sort_by(|a, b| a.total_cmp(b));

        GlobalMetrics {
            active_calls: inner.active.len(),
            total_calls_today: inner.total_calls_today,
            avg_stt_latency: round_ms(stage_mean(LatencyKind::Stt)),
            avg_llm_latency: round_ms(stage_mean(LatencyKind::Llm)),
            avg_tts_latency: round_ms(stage_mean(LatencyKind::Tts)),
            avg_total_latency: round_ms(mean(totals.iter().copied())),
            p95_latency: round_ms(p95_nearest_rank(&totals)),
            min_latency: round_ms(totals.first().copied().unwrap_or(0.0)),
            max_latency: round_ms(totals.last().copied().unwrap_or(0.0)),
            total_utterances: sessions().map(|s| u64::from(s.utterances)).sum(),
            total_interruptions: sessions().map(|s| u64::from(s.interruptions)).sum(),
            total_language_switches: sessions().map(|s| u64::from(s.language_switches)).sum(),
        }
    }

    /// Snapshot of an active call.
    pub fn get_call_info(&self, call_sid: &str) -> Option<CallSession> {
        self.inner.lock().active.get(call_sid).cloned()
    }

    /// Active calls, oldest first.
    pub fn active_calls(&self) -> Vec<CallSession> {
        let inner = self.inner.lock();
        let mut calls: Vec<CallSession> = inner.active.values().cloned().collect();
        calls.sort_by_key(|c| c.start_time);
        calls
    }

    /// Completed calls, most recently started first.
    pub fn recent_history(&self, limit: usize) -> Vec<CallSession> {
        let inner = self.inner.lock();
        let mut history: Vec<&CallSession> = inner.history.iter().collect();
        history.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        history.into_iter().take(limit).cloned().collect()
    }
}
