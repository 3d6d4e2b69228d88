use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Roundtrip latency below this many seconds counts as meeting the target.
pub const LATENCY_TARGET_SECONDS: f64 = 0.5;

/// Finished calls whose per-call metrics stay queryable. Older ones are
/// evicted; the global counters keep their contribution.
pub const FINISHED_CALLS_RETAINED: usize = 1000;

/// Process-wide counters, reported as-is when no call has been monitored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalCounters {
    pub total_calls: u64,
    pub total_interruptions: u64,
    pub total_slang_detections: u64,
    pub total_low_quality_handling: u64,
    pub total_language_switches: u64,
    pub latency_target_met: u64,
    pub latency_target_missed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallAverages {
    pub latency_success_rate: String,
    pub avg_interruptions_per_call: f64,
    pub avg_slang_detections_per_call: f64,
    pub avg_low_quality_handling_per_call: f64,
    pub avg_language_switches_per_call: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalSummary {
    #[serde(flatten)]
    pub counters: GlobalCounters,
    #[serde(flatten)]
    pub averages: Option<CallAverages>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSummary {
    pub call_duration: f64,
    pub total_interactions: usize,
    pub avg_roundtrip_latency: f64,
    pub min_roundtrip_latency: f64,
    pub max_roundtrip_latency: f64,
    pub interruptions: u32,
    pub slang_detections: u32,
    pub low_quality_handling: u32,
    pub language_switches: u32,
    pub edge_cases: Vec<String>,
}

#[derive(Debug)]
struct CallMetrics {
    started: Instant,
    finished: Option<Instant>,
    stt_latencies: Vec<f64>,
    llm_latencies: Vec<f64>,
    tts_latencies: Vec<f64>,
    roundtrip_latencies: Vec<f64>,
    interruptions: u32,
    slang_detections: u32,
    low_quality_handling: u32,
    language_switches: u32,
    edge_cases: Vec<String>,
}

impl CallMetrics {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            finished: None,
            stt_latencies: Vec::new(),
            llm_latencies: Vec::new(),
            tts_latencies: Vec::new(),
            roundtrip_latencies: Vec::new(),
            interruptions: 0,
            slang_detections: 0,
            low_quality_handling: 0,
            language_switches: 0,
            edge_cases: Vec::new(),
        }
    }
}

#[derive(Default)]
struct MonitorInner {
    calls: HashMap<String, CallMetrics>,
    /// Finished call ids, oldest first
    finished: VecDeque<String>,
    global: GlobalCounters,
}

/// Latency SLA and edge-case tracker, maintained independently of the
/// call registry.
///
/// Uses the same locking discipline as the registry: one mutex, held for a
/// single operation. Records for calls that were never started are dropped.
#[derive(Default)]
pub struct PerformanceMonitor {
    inner: Mutex<MonitorInner>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate per-call tracking and bump the global call counter.
    pub fn start_monitoring(&self, call_sid: &str) {
        let mut inner = self.inner.lock();
        inner.finished.retain(|id| id != call_sid);
        inner.calls.insert(call_sid.to_string(), CallMetrics::new());
        inner.global.total_calls += 1;
        debug!("Performance monitoring started for {}", call_sid);
    }

    /// Freeze the call's duration. Its summary stays available until
    /// [`FINISHED_CALLS_RETAINED`] newer calls have finished.
    pub fn finish_monitoring(&self, call_sid: &str) {
        let mut inner = self.inner.lock();
        let Some(call) = inner.calls.get_mut(call_sid) else {
            return;
        };
        if call.finished.is_some() {
            return;
        }
        call.finished = Some(Instant::now());
        inner.finished.push_back(call_sid.to_string());

        while inner.finished.len() > FINISHED_CALLS_RETAINED {
            if let Some(evicted) = inner.finished.pop_front() {
                inner.calls.remove(&evicted);
                debug!("Monitoring data for {} evicted", evicted);
            }
        }
    }

    pub fn record_stt_latency(&self, call_sid: &str, seconds: f64) {
        self.with_call(call_sid, |call| call.stt_latencies.push(seconds));
    }

    pub fn record_llm_latency(&self, call_sid: &str, seconds: f64) {
        self.with_call(call_sid, |call| call.llm_latencies.push(seconds));
    }

    pub fn record_tts_latency(&self, call_sid: &str, seconds: f64) {
        self.with_call(call_sid, |call| call.tts_latencies.push(seconds));
    }

    /// Record a full turn and classify it against [`LATENCY_TARGET_SECONDS`].
    pub fn record_roundtrip_latency(&self, call_sid: &str, seconds: f64) {
        let mut inner = self.inner.lock();
        let MonitorInner { calls, global, .. } = &mut *inner;
        let Some(call) = calls.get_mut(call_sid) else {
            return;
        };

        call.roundtrip_latencies.push(seconds);
        if seconds < LATENCY_TARGET_SECONDS {
            global.latency_target_met += 1;
        } else {
            global.latency_target_missed += 1;
            warn!(
                "Call {}: roundtrip latency {:.3}s missed the {:.1}s target",
                call_sid, seconds, LATENCY_TARGET_SECONDS
            );
        }
    }

    pub fn record_interruption(&self, call_sid: &str) {
        self.with_call_and_global(call_sid, |call, global| {
            call.interruptions += 1;
            global.total_interruptions += 1;
        });
    }

    pub fn record_slang_detection(&self, call_sid: &str, phrase: &str) {
        self.with_call_and_global(call_sid, |call, global| {
            call.slang_detections += 1;
            call.edge_cases.push(format!("slang: {phrase}"));
            global.total_slang_detections += 1;
        });
    }

    pub fn record_low_quality_handling(&self, call_sid: &str, issue: &str) {
        self.with_call_and_global(call_sid, |call, global| {
            call.low_quality_handling += 1;
            call.edge_cases.push(format!("audio_quality: {issue}"));
            global.total_low_quality_handling += 1;
        });
    }

    pub fn record_language_switch(&self, call_sid: &str, from: &str, to: &str) {
        self.with_call_and_global(call_sid, |call, global| {
            call.language_switches += 1;
            call.edge_cases.push(format!("language_switch: {from} -> {to}"));
            global.total_language_switches += 1;
        });
        info!("Call {}: language switch {} -> {}", call_sid, from, to);
    }

    pub fn call_summary(&self, call_sid: &str) -> Option<CallSummary> {
        let inner = self.inner.lock();
        let call = inner.calls.get(call_sid)?;

        let roundtrips = &call.roundtrip_latencies;
        let end = call.finished.unwrap_or_else(Instant::now);
        let (min, max) = roundtrips
            .iter()
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 0.0));

        Some(CallSummary {
            call_duration: end.duration_since(call.started).as_secs_f64(),
            total_interactions: roundtrips.len(),
            avg_roundtrip_latency: crate::core::calls::latency::mean(roundtrips.iter().copied()),
            min_roundtrip_latency: min,
            max_roundtrip_latency: max,
            interruptions: call.interruptions,
            slang_detections: call.slang_detections,
            low_quality_handling: call.low_quality_handling,
            language_switches: call.language_switches,
            edge_cases: call.edge_cases.clone(),
        })
    }

    /// Global counters plus per-call averages.
    ///
    /// With zero monitored calls only the raw counters are returned. The
    /// success rate is met roundtrips per monitored call, as a percentage.
    pub fn global_summary(&self) -> GlobalSummary {
        let counters = self.inner.lock().global.clone();
        if counters.total_calls == 0 {
            return GlobalSummary {
                counters,
                averages: None,
            };
        }

        let calls = counters.total_calls as f64;
        let per_call = |value: u64| value as f64 / calls;
        let success_rate = per_call(counters.latency_target_met) * 100.0;

        let averages = CallAverages {
            latency_success_rate: format!("{success_rate:.1}%"),
            avg_interruptions_per_call: per_call(counters.total_interruptions),
            avg_slang_detections_per_call: per_call(counters.total_slang_detections),
            avg_low_quality_handling_per_call: per_call(counters.total_low_quality_handling),
            avg_language_switches_per_call: per_call(counters.total_language_switches),
        };

        GlobalSummary {
            counters,
            averages: Some(averages),
        }
    }

    fn with_call(&self, call_sid: &str, f: impl FnOnce(&mut CallMetrics)) {
        match self.inner.lock().calls.get_mut(call_sid) {
            Some(call) => f(call),
            None => debug!("Metric for unmonitored call {} dropped", call_sid),
        }
    }

    fn with_call_and_global(
        &self,
        call_sid: &str,
        f: impl FnOnce(&mut CallMetrics, &mut GlobalCounters),
    ) {
        let mut inner = self.inner.lock();
        let MonitorInner { calls, global, .. } = &mut *inner;
        match calls.get_mut(call_sid) {
            Some(call) => f(call, global),
            None => debug!("Edge case for unmonitored call {} dropped", call_sid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_roundtrip_target_classification() {
        let monitor = PerformanceMonitor::new();
        monitor.start_monitoring("A");
        monitor.record_roundtrip_latency("A", 0.45);
        monitor.record_roundtrip_latency("A", 0.5);
        monitor.record_roundtrip_latency("A", 0.9);

        let summary = monitor.global_summary();
        assert_eq!(summary.counters.latency_target_met, 1);
        assert_eq!(summary.counters.latency_target_missed, 2);
    }

    #[test]
    fn test_finished_calls_are_evicted_oldest_first() {
        let monitor = PerformanceMonitor::new();
        for i in 0..=FINISHED_CALLS_RETAINED {
            let sid = format!("CA{i}");
            monitor.start_monitoring(&sid);
            monitor.record_roundtrip_latency(&sid, 0.2);
            monitor.finish_monitoring(&sid);
        }
        monitor.start_monitoring("live");

        assert!(monitor.call_summary("CA0").is_none());
        assert!(monitor.call_summary("CA1").is_some());
        assert!(monitor.call_summary("live").is_some());

        let counters = monitor.global_summary().counters;
        assert_eq!(counters.total_calls, FINISHED_CALLS_RETAINED as u64 + 2);
        assert_eq!(counters.latency_target_met, FINISHED_CALLS_RETAINED as u64 + 1);
    }

    #[test]
    fn test_restarted_call_is_not_evicted_by_its_old_finish() {
        let monitor = PerformanceMonitor::new();
        monitor.start_monitoring("A");
        monitor.finish_monitoring("A");
        monitor.start_monitoring("A");
        for i in 0..FINISHED_CALLS_RETAINED {
            let sid = format!("CA{i}");
            monitor.start_monitoring(&sid);
            monitor.finish_monitoring(&sid);
        }

        assert!(monitor.call_summary("A").is_some());
    }

    #[test]
    fn test_unmonitored_calls_are_ignored() {
        let monitor = PerformanceMonitor::new();
        monitor.record_roundtrip_latency("ghost", 0.1);
        monitor.record_interruption("ghost");
        monitor.record_slang_detection("ghost", "órale");

        let summary = monitor.global_summary();
        assert_eq!(summary.counters, GlobalCounters::default());
        assert!(monitor.call_summary("ghost").is_none());
    }

    #[test]
    fn test_edge_case_log_entries() {
        let monitor = PerformanceMonitor::new();
        monitor.start_monitoring("A");
        monitor.record_slang_detection("A", "qué onda");
        monitor.record_low_quality_handling("A", "incomplete_speech");
        monitor.record_language_switch("A", "es-LA", "en-US");
        monitor.record_interruption("A");

        let summary = monitor.call_summary("A").unwrap();
        assert_eq!(
            summary.edge_cases,
            vec![
                "slang: qué onda",
                "audio_quality: incomplete_speech",
                "language_switch: es-LA -> en-US",
            ]
        );
        assert_eq!(summary.slang_detections, 1);
        assert_eq!(summary.low_quality_handling, 1);
        assert_eq!(summary.language_switches, 1);
        assert_eq!(summary.interruptions, 1);
    }

    #[test]
    fn test_call_summary_roundtrip_stats() {
        let monitor = PerformanceMonitor::new();
        monitor.start_monitoring("A");
        let empty = monitor.call_summary("A").unwrap();
        assert_eq!(empty.total_interactions, 0);
        assert_eq!(empty.min_roundtrip_latency, 0.0);

        for v in [0.3, 0.1, 0.5] {
            monitor.record_roundtrip_latency("A", v);
        }
        monitor.finish_monitoring("A");
        let summary = monitor.call_summary("A").unwrap();
        assert_eq!(summary.total_interactions, 3);
        assert_eq!(summary.min_roundtrip_latency, 0.1);
        assert_eq!(summary.max_roundtrip_latency, 0.5);
        assert!((summary.avg_roundtrip_latency - 0.3).abs() < 1e-9);
        assert!(summary.call_duration >= 0.0);
    }

    #[test]
    fn test_global_summary_without_calls_returns_raw_counters() {
        let summary = PerformanceMonitor::new().global_summary();
        assert!(summary.averages.is_none());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_calls"], 0);
        assert!(json.get("latency_success_rate").is_none());
    }

    #[test]
    fn test_global_summary_averages() {
        let monitor = PerformanceMonitor::new();
        monitor.start_monitoring("A");
        monitor.start_monitoring("B");
        monitor.record_roundtrip_latency("A", 0.2);
        monitor.record_interruption("A");
        monitor.record_interruption("B");
        monitor.record_interruption("B");

        let summary = monitor.global_summary();
        let averages = summary.averages.unwrap();
        assert_eq!(averages.latency_success_rate, "50.0%");
        assert_eq!(averages.avg_interruptions_per_call, 1.5);

        let json = serde_json::to_value(monitor.global_summary()).unwrap();
        assert_eq!(json["total_calls"], 2);
        assert_eq!(json["latency_success_rate"], "50.0%");
    }

    #[test]
    fn test_concurrent_recording() {
        let monitor = Arc::new(PerformanceMonitor::new());
        monitor.start_monitoring("A");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let monitor = Arc::clone(&monitor);
                thread::spawn(move || {
                    for _ in 0..100 {
                        monitor.record_roundtrip_latency("A", 0.1);
                        monitor.record_interruption("A");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let summary = monitor.global_summary();
        assert_eq!(summary.counters.latency_target_met, 400);
        assert_eq!(summary.counters.total_interruptions, 400);
    }
}
