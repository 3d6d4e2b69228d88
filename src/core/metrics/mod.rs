//! Process-wide latency SLA and edge-case aggregation.

mod monitor;

pub use monitor::{
    CallAverages, CallSummary, GlobalCounters, GlobalSummary, LATENCY_TARGET_SECONDS, PerformanceMonitor,
};
