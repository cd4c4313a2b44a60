use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::error::{ConfigError, QueryError, WriteError};

/// Series name prefix the store prepends to numeric metrics.
pub const SERIES_PREFIX: &str = "l.numeric.";

/// Downsampling aggregator requested from the query endpoint.
pub const AGGREGATOR: &str = "min";

// ─── Query description ───────────────────────────────────────────

/// One metric over the closed window `[start, end]` (seconds since epoch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub metric: String,
    pub start: i64,
    pub end: i64,
}

impl SeriesQuery {
    pub fn new(metric: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            metric: metric.into(),
            start,
            end,
        }
    }

    /// Full series name as it appears at the start of every response line.
    pub fn series_name(&self) -> String {
        format!("{SERIES_PREFIX}{}", self.metric)
    }

    /// `/q?...` in plaintext mode with caching disabled.
    pub fn path_and_query(&self) -> String {
        format!(
            "/q?start={}&end={}&m={AGGREGATOR}:{}&ascii&nocache",
            self.start,
            self.end,
            self.series_name(),
        )
    }
}

// ─── Client ──────────────────────────────────────────────────────

/// Thin HTTP wrapper around the ingest and query endpoints.
///
/// `Client` is reference-counted internally, so clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct TsdbClient {
    http: Client,
    write_url: String,
    query_base: String,
}

impl TsdbClient {
    /// `write_host` and `query_host` are `host:port` pairs.
    ///
    /// Proxy environment variables are ignored: both endpoints are expected
    /// to be directly reachable (or tunnelled to localhost).
    pub fn new(write_host: &str, query_host: &str) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .no_proxy()
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            write_url: format!("http://{write_host}/write"),
            query_base: format!("http://{query_host}"),
        })
    }

    /// POST `payload` as JSON to the write path. Only HTTP 200 is success.
    pub async fn write_point<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        timeout: Duration,
    ) -> Result<(), WriteError> {
        let response = self
            .http
            .post(&self.write_url)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| WriteError::from_transport(e, timeout))?;

        match response.status().as_u16() {
            200 => Ok(()),
            code => Err(WriteError::Rejected(code)),
        }
    }

    /// Issue one query. Returns once headers arrive; the body is read lazily
    /// through [`QueryResponse::text`] under the same timeout.
    pub async fn query(
        &self,
        query: &SeriesQuery,
        timeout: Duration,
    ) -> Result<QueryResponse, QueryError> {
        let url = format!("{}{}", self.query_base, query.path_and_query());
        let inner = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| QueryError::from_transport(e, timeout))?;

        Ok(QueryResponse { inner, timeout })
    }
}

/// A query response whose headers have arrived.
#[derive(Debug)]
pub struct QueryResponse {
    inner: reqwest::Response,
    timeout: Duration,
}

impl QueryResponse {
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    pub async fn text(self) -> Result<String, QueryError> {
        let timeout = self.timeout;
        self.inner
            .text()
            .await
            .map_err(|e| QueryError::from_body(e, timeout))
    }
}
