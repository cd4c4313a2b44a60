use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::client::{QueryResponse, SeriesQuery, TsdbClient};
use crate::error::QueryError;
use crate::metrics::{Measurement, RoundStats};
use crate::parse::parse_timestamps;

// ─── Public types ────────────────────────────────────────────────

/// Timing knobs for one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Round-global deadline, measured from the start of polling.
    pub round_timeout: Duration,
    /// Bound for a single query.
    pub query_timeout: Duration,
    /// Sleep before every attempt. Zero disables throttling.
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutCause {
    /// A single query hit its own timeout.
    Attempt,
    /// The round ran past `round_timeout`.
    Deadline,
}

/// How a round ended. Both variants carry the full statistics.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Resolved(Measurement),
    TimedOut {
        cause: TimeoutCause,
        measurement: Measurement,
    },
}

impl Outcome {
    pub fn measurement(&self) -> &Measurement {
        match self {
            Self::Resolved(m) => m,
            Self::TimedOut { measurement, .. } => measurement,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// What a non-terminal attempt produced.
enum Attempt {
    Found,
    NotYet,
}

// ─── Poll loop ───────────────────────────────────────────────────

/// Query `query` until its `start` timestamp shows up in the response.
///
/// Terminates on the target being found, on a per-attempt timeout, or once
/// the round deadline passes. Non-200 responses, unreadable bodies and
/// malformed lines are counted and retried. Dropping the returned future
/// cancels the in-flight request.
pub async fn poll(client: &TsdbClient, query: &SeriesQuery, settings: &PollSettings) -> Outcome {
    let target = query.start;
    let series = query.series_name();
    let mut stats = RoundStats::start();

    loop {
        stats.begin_attempt();
        if !settings.delay.is_zero() {
            tokio::time::sleep(settings.delay).await;
        }

        let attempt_start = Instant::now();
        let response = client.query(query, settings.query_timeout).await;
        let attempt_end = Instant::now();
        stats.record_query_latency(attempt_end - attempt_start);

        if stats.elapsed_at(attempt_end) > settings.round_timeout {
            warn!(
                target_ts = target,
                attempts = stats.attempts(),
                "round deadline of {:?} exceeded",
                settings.round_timeout
            );
            return finish(
                &stats,
                target,
                Some(TimeoutCause::Deadline),
                settings.round_timeout,
            );
        }

        let result = match response {
            Ok(response) => evaluate(response, target, &series, &mut stats).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(Attempt::Found) => {
                return finish(&stats, target, None, stats.elapsed_at(attempt_end));
            }
            Ok(Attempt::NotYet) => {}
            Err(err) if err.is_terminal() => {
                warn!(target_ts = target, attempts = stats.attempts(), error = %err, "query attempt timed out");
                return finish(
                    &stats,
                    target,
                    Some(TimeoutCause::Attempt),
                    settings.round_timeout,
                );
            }
            Err(err) => {
                stats.record_failure();
                debug!(target_ts = target, attempt = stats.attempts(), error = %err, "query attempt failed");
            }
        }
    }
}

/// Freeze `stats` into an outcome and log the round's query latency spread.
///
/// `timeout` is `None` for a resolved round. Timed-out rounds report the
/// round timeout as their headline, whichever limit fired.
fn finish(
    stats: &RoundStats,
    target: i64,
    timeout: Option<TimeoutCause>,
    latency: Duration,
) -> Outcome {
    let measurement = stats.measurement(latency);
    let spread = &measurement.query_latency_us;
    info!(
        target_ts = target,
        resolved = timeout.is_none(),
        latency_secs = latency.as_secs_f64(),
        attempts = measurement.requests,
        query_p50_us = spread.p50,
        query_p99_us = spread.p99,
        query_max_us = spread.max,
        "round finished"
    );

    match timeout {
        None => Outcome::Resolved(measurement),
        Some(cause) => Outcome::TimedOut { cause, measurement },
    }
}

/// Record the status and, for a 200, look for `target` in the body.
async fn evaluate(
    response: QueryResponse,
    target: i64,
    series: &str,
    stats: &mut RoundStats,
) -> Result<Attempt, QueryError> {
    let status = response.status();
    stats.record_status(status);
    if status != 200 {
        debug!(target_ts = target, attempt = stats.attempts(), status, "query not ok");
        return Ok(Attempt::NotYet);
    }

    let body = response.text().await?;
    let timestamps = parse_timestamps(&body, series)?;

    info!(
        attempt = stats.attempts(),
        target_ts = target,
        avg_request_secs = stats.avg_request_latency().as_secs_f64(),
        codes = %stats.status_counts(),
        failures = stats.failures(),
        last_seen = ?timestamps.last(),
        "poll"
    );

    if timestamps.contains(&target) {
        Ok(Attempt::Found)
    } else {
        Ok(Attempt::NotYet)
    }
}
