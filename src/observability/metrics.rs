//! Thread-safe metrics collection system
//!
//! Atomic counters for request outcomes plus mutex-protected collections for
//! per-decision counts and processing-time samples.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Number of processing-time samples kept for percentile calculations
const MAX_TIMING_SAMPLES: usize = 1000;

/// Thread-safe metrics collector using atomics and mutexes
pub struct MetricsCollector {
    requests_received: AtomicU64,
    requests_completed: AtomicU64,
    requests_rejected: AtomicU64,
    stage_failures: AtomicU64,
    requests_timed_out: AtomicU64,

    decisions: Mutex<HashMap<String, u64>>,
    processing_times: Mutex<Vec<u64>>, // in milliseconds

    uptime_start: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            requests_received: AtomicU64::new(0),
            requests_completed: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            stage_failures: AtomicU64::new(0),
            requests_timed_out: AtomicU64::new(0),
            decisions: Mutex::new(HashMap::new()),
            processing_times: Mutex::new(Vec::new()),
            uptime_start: AtomicU64::new(current_timestamp()),
        }
    }

    pub fn request_received(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_completed(&self, duration: Duration) {
        self.requests_completed.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(duration);
    }

    /// Invalid input reported back to the caller
    pub fn request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Handler or composer failure swallowed into a generic response
    pub fn stage_failed(&self, duration: Duration) {
        self.stage_failures.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(duration);
    }

    /// Request abandoned by the HTTP timeout; its run never reaches another bucket
    pub fn request_timed_out(&self) {
        self.requests_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decision_made(&self, label: &str) {
        if let Ok(mut decisions) = self.decisions.lock() {
            *decisions.entry(label.to_string()).or_insert(0) += 1;
        }
    }

    fn record_processing_time(&self, duration: Duration) {
        if let Ok(mut times) = self.processing_times.lock() {
            times.push(duration.as_millis() as u64);
            if times.len() > MAX_TIMING_SAMPLES {
                let overflow = times.len() - MAX_TIMING_SAMPLES;
                times.drain(0..overflow);
            }
        }
    }

    /// Point-in-time copy of every metric
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let decisions = self
            .decisions
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default();
        let mut times = self
            .processing_times
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default();
        times.sort_unstable();

        let average_ms = if times.is_empty() {
            0.0
        } else {
            times.iter().sum::<u64>() as f64 / times.len() as f64
        };

        let received = self.requests_received.load(Ordering::Relaxed);
        let completed = self.requests_completed.load(Ordering::Relaxed);
        let rejected = self.requests_rejected.load(Ordering::Relaxed);
        let stage_failures = self.stage_failures.load(Ordering::Relaxed);
        let timed_out = self.requests_timed_out.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests: RequestMetrics {
                received,
                completed,
                rejected,
                stage_failures,
                timed_out,
                in_flight: received
                    .saturating_sub(completed + rejected + stage_failures + timed_out),
            },
            decisions,
            processing: ProcessingMetrics {
                samples: times.len(),
                average_ms,
                p50_ms: percentile(&times, 50),
                p95_ms: percentile(&times, 95),
                p99_ms: percentile(&times, 99),
            },
            uptime_seconds: current_timestamp()
                .saturating_sub(self.uptime_start.load(Ordering::Relaxed)),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest-rank percentile over sorted samples
fn percentile(sorted: &[u64], pct: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests: RequestMetrics,
    pub decisions: HashMap<String, u64>,
    pub processing: ProcessingMetrics,
    pub uptime_seconds: u64,
}

/// Request counters
///
/// Every received request ends in exactly one of `completed`, `rejected`,
/// `stage_failures` or `timed_out`; `in_flight` is whatever has not ended yet.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetrics {
    pub received: u64,
    pub completed: u64,
    pub rejected: u64,
    pub stage_failures: u64,
    pub timed_out: u64,
    pub in_flight: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingMetrics {
    pub samples: usize,
    pub average_ms: f64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
