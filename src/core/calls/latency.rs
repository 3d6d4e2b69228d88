//! Bounded latency sample storage.

use std::collections::VecDeque;

use serde::{Serialize, Serializer};

/// Samples kept per stage and call.
pub const LATENCY_RING_CAPACITY: usize = 100;

/// Pipeline stage a latency sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyKind {
    Stt,
    Llm,
    Tts,
    Total,
}

/// Fixed-capacity FIFO of latency samples in seconds.
///
/// Pushing past capacity drops the oldest sample, so the ring always holds
/// the most recent `capacity` values in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyRing {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl LatencyRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, seconds: f64) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(seconds);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Arithmetic mean, or 0.0 when empty.
    pub fn mean(&self) -> f64 {
        mean(self.samples.iter().copied())
    }
}

impl Default for LatencyRing {
    fn default() -> Self {
        Self::new(LATENCY_RING_CAPACITY)
    }
}

impl Serialize for LatencyRing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.samples.iter())
    }
}

/// One ring per pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySamples {
    #[serde(rename = "stt_latency")]
    pub stt: LatencyRing,
    #[serde(rename = "llm_latency")]
    pub llm: LatencyRing,
    #[serde(rename = "tts_latency")]
    pub tts: LatencyRing,
    #[serde(rename = "total_latency")]
    pub total: LatencyRing,
}

impl LatencySamples {
    pub fn ring(&self, kind: LatencyKind) -> &LatencyRing {
        match kind {
            LatencyKind::Stt => &self.stt,
            LatencyKind::Llm => &self.llm,
            LatencyKind::Tts => &self.tts,
            LatencyKind::Total => &self.total,
        }
    }

    pub fn ring_mut(&mut self, kind: LatencyKind) -> &mut LatencyRing {
        match kind {
            LatencyKind::Stt => &mut self.stt,
            LatencyKind::Llm => &mut self.llm,
            LatencyKind::Tts => &mut self.tts,
            LatencyKind::Total => &mut self.total,
        }
    }
}

/// Arithmetic mean of an iterator, 0.0 when empty.
pub fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Nearest-rank 95th percentile: the value at index `floor(0.95 * n)` of the
/// ascending-sorted samples. Returns 0.0 for an empty slice.
pub fn p95_nearest_rank(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f64) * 0.95).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}
