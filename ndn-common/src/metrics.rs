//! Counters kept by a face.
//!
//! All values are plain atomics so a snapshot can be read from any task
//! without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/* ---------------------------------------------------------------- *
 * Simple Counter
 * ---------------------------------------------------------------- */

#[derive(Debug)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

/* ---------------------------------------------------------------- *
 * Gauge
 * ---------------------------------------------------------------- */

#[derive(Debug)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Saturates at zero.
    pub fn decrement(&self) {
        let _ = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self::new()
    }
}

/* ---------------------------------------------------------------- *
 * Histogram
 * ---------------------------------------------------------------- */

/// Fixed-bucket histogram; values above the last boundary land in overflow.
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<AtomicU64>,
    boundaries: Vec<u64>,
    overflow: AtomicU64,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    pub fn new(boundaries: Vec<u64>) -> Self {
        let buckets = (0..boundaries.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            buckets,
            boundaries,
            overflow: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Buckets for round-trip times in microseconds.
    pub fn latency() -> Self {
        Self::new(vec![100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000])
    }

    pub fn observe(&self, value: u64) {
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        match self.boundaries.iter().position(|&b| value <= b) {
            Some(idx) => self.buckets[idx].fetch_add(1, Ordering::Relaxed),
            None => self.overflow.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn observe_duration(&self, elapsed: Duration) {
        self.observe(elapsed.as_micros() as u64);
    }

    pub fn average(&self) -> f64 {
        let c = self.count.load(Ordering::Relaxed);
        if c == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / c as f64
        }
    }

    pub fn counts(&self) -> Vec<(u64, u64)> {
        self.boundaries
            .iter()
            .zip(self.buckets.iter())
            .map(|(&b, bucket)| (b, bucket.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn overflow(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/* ---------------------------------------------------------------- *
 * Aggregate face metrics
 * ---------------------------------------------------------------- */

#[derive(Debug)]
pub struct FaceMetrics {
    // Consumer side
    /// Interests handed to `send_interest`, including collapsed ones
    pub interests_expressed: Counter,
    /// Interests actually written to the transport
    pub interests_sent: Counter,
    pub interests_collapsed: Counter,
    pub interests_satisfied: Counter,
    pub interests_timed_out: Counter,
    pub interest_rtt_us: Histogram,

    // Inbound traffic
    pub data_received: Counter,
    pub data_unsolicited: Counter,
    pub interests_received: Counter,
    pub packets_dropped: Counter,

    // Producer side
    pub data_sent: Counter,

    // Content store
    pub cs_hits: Counter,
    pub cs_misses: Counter,
    pub cs_inserts: Counter,

    // PIT
    pub pit_size: Gauge,

    // Transport
    pub bytes_received: Counter,
    pub bytes_sent: Counter,
}

impl FaceMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for FaceMetrics {
    fn default() -> Self {
        Self {
            interests_expressed: Counter::new(),
            interests_sent: Counter::new(),
            interests_collapsed: Counter::new(),
            interests_satisfied: Counter::new(),
            interests_timed_out: Counter::new(),
            interest_rtt_us: Histogram::latency(),
            data_received: Counter::new(),
            data_unsolicited: Counter::new(),
            interests_received: Counter::new(),
            packets_dropped: Counter::new(),
            data_sent: Counter::new(),
            cs_hits: Counter::new(),
            cs_misses: Counter::new(),
            cs_inserts: Counter::new(),
            pit_size: Gauge::new(),
            bytes_received: Counter::new(),
            bytes_sent: Counter::new(),
        }
    }
}
