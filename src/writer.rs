use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::client::TsdbClient;

/// One numeric sample in the ingest wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub timestamp: i64,
    pub value: i64,
}

/// `{ "<metric>": [{"type":"numeric","timestamp":<ts>,"value":0}] }`
pub fn payload(metric: &str, timestamp: i64) -> BTreeMap<String, Vec<DataPoint>> {
    let point = DataPoint {
        kind: "numeric",
        timestamp,
        value: 0,
    };
    BTreeMap::from([(metric.to_owned(), vec![point])])
}

/// Write a single zero-valued point for `metric` at `timestamp`.
///
/// Exactly one attempt. Returns `true` only for HTTP 200; every failure is
/// logged and reported as `false`.
pub async fn write(client: &TsdbClient, metric: &str, timestamp: i64, timeout: Duration) -> bool {
    match client.write_point(&payload(metric, timestamp), timeout).await {
        Ok(()) => {
            debug!(timestamp, metric, "write accepted");
            true
        }
        Err(err) => {
            warn!(timestamp, metric, error = %err, "write failed, skipping round");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_matches_ingest_format() {
        let json = serde_json::to_value(payload("probe.heartbeat", 1000)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "probe.heartbeat": [{"type": "numeric", "timestamp": 1000, "value": 0}]
            })
        );
    }
}
