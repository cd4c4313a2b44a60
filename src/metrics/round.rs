use std::time::{Duration, Instant};

use hdrhistogram::Histogram;

use super::percentiles::PercentileSet;
use super::StatusCounts;

// ─── Configuration ───────────────────────────────────────────────

/// HdrHistogram range for per-attempt query latency: 1 μs → 1 h.
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 3_600_000_000;
const HIST_SIGFIG: u8 = 3;

// ─── Accumulator ─────────────────────────────────────────────────

/// Aggregates for one measurement round, mutated attempt by attempt.
///
/// Individual attempts are never retained; only the running sums, the
/// status-code counts and a latency histogram survive.
pub struct RoundStats {
    started: Instant,
    attempts: u64,
    total_query_latency: Duration,
    status_counts: StatusCounts,
    failures: u64,
    query_latency_hist: Histogram<u64>,
}

/// Frozen view of a round, carried by every outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Headline figure: propagation latency, or the timeout that ended the round.
    pub latency: Duration,
    pub avg_request_latency: Duration,
    pub total_query_latency: Duration,
    pub requests: u64,
    pub status_counts: StatusCounts,
    pub failures: u64,
    /// Per-attempt query latency in microseconds.
    pub query_latency_us: PercentileSet,
}

impl RoundStats {
    /// Start the round clock now.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            attempts: 0,
            total_query_latency: Duration::ZERO,
            status_counts: StatusCounts::new(),
            failures: 0,
            query_latency_hist: Histogram::<u64>::new_with_bounds(
                HIST_LOW,
                HIST_HIGH,
                HIST_SIGFIG,
            )
            .expect("histogram creation"),
        }
    }

    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn record_query_latency(&mut self, latency: Duration) {
        self.total_query_latency += latency;
        let us = (latency.as_micros() as u64).max(HIST_LOW);
        self.query_latency_hist.saturating_record(us);
    }

    pub fn record_status(&mut self, code: u16) {
        self.status_counts.record(code);
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn status_counts(&self) -> &StatusCounts {
        &self.status_counts
    }

    pub fn total_query_latency(&self) -> Duration {
        self.total_query_latency
    }

    /// `total_query_latency / attempts`, zero before the first attempt.
    pub fn avg_request_latency(&self) -> Duration {
        if self.attempts == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_query_latency.as_nanos() / u128::from(self.attempts);
        Duration::from_nanos(nanos as u64)
    }

    /// Wall-clock time since the round started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time between round start and `at`.
    pub fn elapsed_at(&self, at: Instant) -> Duration {
        at.saturating_duration_since(self.started)
    }

    pub fn measurement(&self, latency: Duration) -> Measurement {
        Measurement {
            latency,
            avg_request_latency: self.avg_request_latency(),
            total_query_latency: self.total_query_latency,
            requests: self.attempts,
            status_counts: self.status_counts.clone(),
            failures: self.failures,
            query_latency_us: PercentileSet::from_histogram(&self.query_latency_hist),
        }
    }
}
