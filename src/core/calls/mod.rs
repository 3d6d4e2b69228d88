//! Call lifecycle tracking and per-call latency samples.

pub mod latency;
pub mod registry;
pub mod session;

pub use latency::{LATENCY_RING_CAPACITY, LatencyKind, LatencyRing, LatencySamples};
pub use registry::{CallRegistry, GlobalMetrics};
pub use session::{CallDirection, CallPerformance, CallSession, CallStatus};
