//! Stats reporting seam plus a log-backed implementation.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::logger::METRICS_TARGET;

/// Sink for timings, counters and gauges.
pub trait StatsReporter: Send + Sync {
    fn timing_sampled(&self, key: &str, millis: u64, sample_rate: f64);

    fn increment_sampled(&self, key: &str, magnitude: i64, sample_rate: f64);

    fn gauge(&self, key: &str, value: f64);

    fn timing(&self, key: &str, millis: u64) {
        self.timing_sampled(key, millis, 1.0);
    }

    fn increment(&self, key: &str) {
        self.increment_sampled(key, 1, 1.0);
    }

    fn increment_by(&self, key: &str, magnitude: i64) {
        self.increment_sampled(key, magnitude, 1.0);
    }

    fn decrement(&self, key: &str) {
        self.increment_sampled(key, -1, 1.0);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpStatsReporter;

impl StatsReporter for NoOpStatsReporter {
    fn timing_sampled(&self, _key: &str, _millis: u64, _sample_rate: f64) {}

    fn increment_sampled(&self, _key: &str, _magnitude: i64, _sample_rate: f64) {}

    fn gauge(&self, _key: &str, _value: f64) {}
}

/// Aggregated timings of one key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimingStats {
    pub count: u64,
    pub total_ms: u64,
    pub max_ms: u64,
}

/// Writes every sample to the metrics log target and keeps per-key aggregates.
#[derive(Debug)]
pub struct LogStatsReporter {
    slow_ms: u64,
    timings_total: AtomicU64,
    slow_total: AtomicU64,
    timings: RwLock<BTreeMap<String, TimingStats>>,
    counters: RwLock<BTreeMap<String, i64>>,
    gauges: RwLock<BTreeMap<String, f64>>,
}

impl Default for LogStatsReporter {
    fn default() -> Self {
        Self::new(500)
    }
}

impl LogStatsReporter {
    /// Timings at or above `slow_ms` are logged at warn level.
    #[must_use]
    pub fn new(slow_ms: u64) -> Self {
        Self {
            slow_ms,
            timings_total: AtomicU64::new(0),
            slow_total: AtomicU64::new(0),
            timings: RwLock::new(BTreeMap::new()),
            counters: RwLock::new(BTreeMap::new()),
            gauges: RwLock::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn timing_stats(&self, key: &str) -> Option<TimingStats> {
        self.timings.read().get(key).copied()
    }

    #[must_use]
    pub fn timing_keys(&self) -> Vec<String> {
        self.timings.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn counter(&self, key: &str) -> i64 {
        self.counters.read().get(key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn gauge_value(&self, key: &str) -> Option<f64> {
        self.gauges.read().get(key).copied()
    }

    #[must_use]
    pub fn slow_total(&self) -> u64 {
        self.slow_total.load(Ordering::Relaxed)
    }

    /// Plain-text exposition of the aggregates, one `name value` per line.
    #[must_use]
    pub fn metrics_text(&self) -> String {
        let mut out = format!(
            "restdsl_timings_total {}\nrestdsl_timings_slow_total {}\n",
            self.timings_total.load(Ordering::Relaxed),
            self.slow_total.load(Ordering::Relaxed)
        );
        for (key, t) in self.timings.read().iter() {
            out.push_str(&format!("{key}.count {}\n{key}.total_ms {}\n", t.count, t.total_ms));
        }
        for (key, v) in self.counters.read().iter() {
            out.push_str(&format!("{key} {v}\n"));
        }
        out
    }
}

fn key_hash(key: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..8])
}

impl StatsReporter for LogStatsReporter {
    fn timing_sampled(&self, key: &str, millis: u64, sample_rate: f64) {
        self.timings_total.fetch_add(1, Ordering::Relaxed);
        {
            let mut timings = self.timings.write();
            let t = timings.entry(key.to_string()).or_default();
            t.count += 1;
            t.total_ms = t.total_ms.saturating_add(millis);
            t.max_ms = t.max_ms.max(millis);
        }
        let line = serde_json::json!({
            "kind": "timing",
            "key": key,
            "key_hash": key_hash(key),
            "ms": millis,
            "rate": sample_rate,
        });
        if millis >= self.slow_ms {
            self.slow_total.fetch_add(1, Ordering::Relaxed);
            log::warn!(target: METRICS_TARGET, "{line}");
        } else {
            log::info!(target: METRICS_TARGET, "{line}");
        }
    }

    fn increment_sampled(&self, key: &str, magnitude: i64, sample_rate: f64) {
        *self.counters.write().entry(key.to_string()).or_insert(0) += magnitude;
        log::info!(
            target: METRICS_TARGET,
            "{}",
            serde_json::json!({"kind": "counter", "key": key, "delta": magnitude, "rate": sample_rate})
        );
    }

    fn gauge(&self, key: &str, value: f64) {
        self.gauges.write().insert(key.to_string(), value);
        log::info!(
            target: METRICS_TARGET,
            "{}",
            serde_json::json!({"kind": "gauge", "key": key, "value": value})
        );
    }
}

/// Reports the elapsed milliseconds under `key` when dropped.
pub struct StatsTimer {
    reporter: Arc<dyn StatsReporter>,
    key: String,
    started: Instant,
}

impl StatsTimer {
    #[must_use]
    pub fn start(reporter: Arc<dyn StatsReporter>, key: impl Into<String>) -> Self {
        Self { reporter, key: key.into(), started: Instant::now() }
    }
}

impl Drop for StatsTimer {
    fn drop(&mut self) {
        let ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.reporter.timing(&self.key, ms);
    }
}

/// `queries.shapes.<collection>.<shape>`
#[must_use]
pub fn shape_key(collection: &str, shape: &str) -> String {
    format!("queries.shapes.{collection}.{shape}")
}
