use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::client::{SeriesQuery, TsdbClient};
use crate::config::ProbeConfig;
use crate::metrics::{SummaryCollector, SummarySnapshot};
use crate::poller;
use crate::report::RoundReport;
use crate::writer;

/// Runs measurement rounds: one write, then one poll loop, per round.
pub struct RoundDriver {
    config: ProbeConfig,
    client: TsdbClient,
    summary: SummaryCollector,
    /// Last second handed to a round; every round writes a later one.
    last_timestamp: AtomicI64,
}

impl RoundDriver {
    pub fn new(config: ProbeConfig, client: TsdbClient) -> Self {
        Self {
            config,
            client,
            summary: SummaryCollector::new(),
            last_timestamp: AtomicI64::new(i64::MIN),
        }
    }

    pub fn summary(&self) -> SummarySnapshot {
        self.summary.snapshot()
    }

    // ─── Single round ───────────────────────────────────────────

    /// Write a point stamped with the current second and poll for it.
    ///
    /// Rounds never share a second, so one round cannot resolve on another
    /// round's point. A round whose second is already taken waits for the
    /// next free one. `None` when the write fails: the round is skipped
    /// without polling.
    pub async fn run_round(&self) -> Option<RoundReport> {
        let timestamp = self.claim_timestamp();
        let wait_ms = timestamp
            .saturating_mul(1000)
            .saturating_sub(Utc::now().timestamp_millis());
        if wait_ms > 0 {
            tokio::time::sleep(Duration::from_millis(wait_ms as u64)).await;
        }

        let written = writer::write(
            &self.client,
            &self.config.metric,
            timestamp,
            self.config.write_timeout(),
        )
        .await;
        if !written {
            self.summary.record_skipped();
            return None;
        }

        let window_end = timestamp.saturating_add_unsigned(self.config.window_secs);
        let query = SeriesQuery::new(self.config.metric.clone(), timestamp, window_end);
        let outcome = poller::poll(&self.client, &query, &self.config.poll_settings()).await;

        self.summary.record(&outcome);
        Some(RoundReport { timestamp, outcome })
    }

    /// The current second, or the one after the last claimed second if
    /// that is later.
    fn claim_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp();
        let next = |last: i64| now.max(last.saturating_add(1));
        let previous = self
            .last_timestamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(next(last)))
            .unwrap_or_else(|last| last);
        next(previous)
    }

    // ─── All rounds ─────────────────────────────────────────────

    /// Run `repeat` rounds across `concurrency` workers, handing each report
    /// to `emit` as soon as its round ends.
    ///
    /// With one worker rounds run strictly in sequence. Workers only share
    /// the round counter; every round keeps its own statistics.
    pub async fn run<F>(self: Arc<Self>, mut emit: F)
    where
        F: FnMut(&RoundReport),
    {
        let repeat = self.config.repeat;
        let workers = u64::from(self.config.concurrency.max(1)).min(repeat.max(1));
        let next_round = Arc::new(AtomicU64::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut handles = Vec::with_capacity(workers as usize);
        for worker_id in 0..workers {
            let driver = self.clone();
            let next_round = next_round.clone();
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                while next_round.fetch_add(1, Ordering::SeqCst) < repeat {
                    if let Some(report) = driver.run_round().await {
                        if tx.send(report).is_err() {
                            break;
                        }
                    }
                }
                debug!(worker_id, "worker finished");
            }));
        }
        drop(tx);

        while let Some(report) = rx.recv().await {
            emit(&report);
        }

        for h in handles {
            if let Err(e) = h.await {
                error!(error = %e, "round worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> RoundDriver {
        let config = ProbeConfig::default();
        let client = TsdbClient::new(&config.write_host, &config.query_host).unwrap();
        RoundDriver::new(config, client)
    }

    #[test]
    fn claimed_seconds_are_strictly_increasing() {
        let driver = driver();
        let now = Utc::now().timestamp();
        let claimed: Vec<i64> = (0..5).map(|_| driver.claim_timestamp()).collect();

        assert!(claimed[0] >= now);
        for pair in claimed.windows(2) {
            assert_eq!(pair[1], pair[0] + 1);
        }
    }
}
