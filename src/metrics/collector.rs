use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;

use super::percentiles::PercentileSet;
use super::StatusCounts;
use crate::poller::Outcome;

// ─── Configuration ───────────────────────────────────────────────

/// Propagation histogram range: 1 ms → 24 h, 3 significant figures.
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 86_400_000;
const HIST_SIGFIG: u8 = 3;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe tally of finished rounds.
///
/// Rounds never share in-flight state; each one hands its outcome over
/// here only after it has ended.
pub struct SummaryCollector {
    inner: Mutex<Inner>,
}

/// Totals across every round of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SummarySnapshot {
    pub rounds: u64,
    pub skipped_writes: u64,
    pub resolved: u64,
    pub timed_out: u64,
    pub total_requests: u64,
    pub total_failures: u64,
    pub status_counts: StatusCounts,
    /// Propagation latency of resolved rounds, in milliseconds.
    pub propagation_ms: PercentileSet,
    pub avg_request_latency_ms: f64,
    pub elapsed_secs: f64,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    propagation_hist: Histogram<u64>,
    skipped_writes: u64,
    resolved: u64,
    timed_out: u64,
    total_requests: u64,
    total_failures: u64,
    total_query_latency: Duration,
    status_counts: StatusCounts,
    start_time: Instant,
}

// ─── SummaryCollector impl ───────────────────────────────────────

impl SummaryCollector {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    /// A round whose write failed and was therefore never polled.
    pub fn record_skipped(&self) {
        self.inner.lock().skipped_writes += 1;
    }

    pub fn record(&self, outcome: &Outcome) {
        self.inner.lock().record(outcome);
    }

    pub fn snapshot(&self) -> SummarySnapshot {
        self.inner.lock().snapshot()
    }
}

impl Default for SummaryCollector {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl Inner {
    fn new() -> Self {
        Self {
            propagation_hist: Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
                .expect("histogram creation"),
            skipped_writes: 0,
            resolved: 0,
            timed_out: 0,
            total_requests: 0,
            total_failures: 0,
            total_query_latency: Duration::ZERO,
            status_counts: StatusCounts::new(),
            start_time: Instant::now(),
        }
    }

    fn record(&mut self, outcome: &Outcome) {
        let m = outcome.measurement();
        self.total_requests += m.requests;
        self.total_failures += m.failures;
        self.total_query_latency += m.total_query_latency;
        self.status_counts.merge(&m.status_counts);

        if outcome.is_resolved() {
            self.resolved += 1;
            let ms = (m.latency.as_millis() as u64).max(HIST_LOW);
            self.propagation_hist.saturating_record(ms);
        } else {
            self.timed_out += 1;
        }
    }

    fn snapshot(&self) -> SummarySnapshot {
        let avg_request_latency_ms = if self.total_requests > 0 {
            self.total_query_latency.as_secs_f64() * 1000.0 / self.total_requests as f64
        } else {
            0.0
        };

        SummarySnapshot {
            rounds: self.skipped_writes + self.resolved + self.timed_out,
            skipped_writes: self.skipped_writes,
            resolved: self.resolved,
            timed_out: self.timed_out,
            total_requests: self.total_requests,
            total_failures: self.total_failures,
            status_counts: self.status_counts.clone(),
            propagation_ms: PercentileSet::from_histogram(&self.propagation_hist),
            avg_request_latency_ms,
            elapsed_secs: self.start_time.elapsed().as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RoundStats;
    use crate::poller::TimeoutCause;

    fn outcome(resolved: bool, latency: Duration, codes: &[u16]) -> Outcome {
        let mut stats = RoundStats::start();
        for &code in codes {
            stats.begin_attempt();
            stats.record_query_latency(Duration::from_millis(10));
            stats.record_status(code);
        }
        let measurement = stats.measurement(latency);
        if resolved {
            Outcome::Resolved(measurement)
        } else {
            Outcome::TimedOut {
                cause: TimeoutCause::Deadline,
                measurement,
            }
        }
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let snap = SummaryCollector::new().snapshot();
        assert_eq!(snap.rounds, 0);
        assert_eq!(snap.avg_request_latency_ms, 0.0);
        assert!(!snap.propagation_ms.has_data());
    }

    #[test]
    fn folds_outcomes_and_skips() {
        let collector = SummaryCollector::new();
        collector.record(&outcome(true, Duration::from_millis(1500), &[500, 200]));
        collector.record(&outcome(false, Duration::from_secs(300), &[500]));
        collector.record_skipped();

        let snap = collector.snapshot();
        assert_eq!(snap.rounds, 3);
        assert_eq!(snap.resolved, 1);
        assert_eq!(snap.timed_out, 1);
        assert_eq!(snap.skipped_writes, 1);
        assert_eq!(snap.total_requests, 3);
        assert_eq!(snap.status_counts.get(500), 2);
        assert_eq!(snap.status_counts.get(200), 1);
        assert_eq!(snap.propagation_ms.count, 1);
        assert!((snap.avg_request_latency_ms - 10.0).abs() < 1e-9);
    }
}
