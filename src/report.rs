use std::fmt;

use crate::poller::Outcome;

/// Result of one round whose write succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    /// The timestamp written and searched for.
    pub timestamp: i64,
    pub outcome: Outcome,
}

/// Tab-separated: latency, avg request latency (both seconds), requests,
/// status counts as JSON, failures.
impl fmt::Display for RoundReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.outcome.measurement();
        write!(
            f,
            "{:.6}\t{:.6}\t{}\t{}\t{}",
            m.latency.as_secs_f64(),
            m.avg_request_latency.as_secs_f64(),
            m.requests,
            m.status_counts,
            m.failures,
        )
    }
}
