#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::Value;

/// What the mock query endpoint does for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Bare status, empty body.
    Status(u16),
    /// 200 with this exact body.
    Body(String),
    /// 200 with a well-formed line for the requested `start` timestamp.
    Echo,
    /// Sleep, then answer 200 with an empty body.
    Hang(Duration),
    /// Sleep, then answer like `Echo`.
    Late(Duration),
}

struct MockState {
    metric: String,
    write_status: Mutex<u16>,
    writes: Mutex<Vec<Value>>,
    script: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Reply>,
    queries: Mutex<Vec<String>>,
}

/// In-process ingest + query endpoints on one ephemeral port.
pub struct MockTsdb {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockTsdb {
    /// Writes answer 200; queries answer with `Echo` unless scripted.
    pub async fn start(metric: &str) -> Self {
        let state = Arc::new(MockState {
            metric: metric.to_owned(),
            write_status: Mutex::new(200),
            writes: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Reply::Echo),
            queries: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/write", post(write_handler))
            .route("/q", get(query_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock tsdb");
        let addr = listener.local_addr().expect("mock tsdb address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Replies consumed in order by the next queries.
    pub fn script(&self, replies: impl IntoIterator<Item = Reply>) {
        self.state.script.lock().extend(replies);
    }

    /// Reply used once the script is exhausted.
    pub fn fallback(&self, reply: Reply) {
        *self.state.fallback.lock() = reply;
    }

    pub fn set_write_status(&self, code: u16) {
        *self.state.write_status.lock() = code;
    }

    pub fn writes(&self) -> Vec<Value> {
        self.state.writes.lock().clone()
    }

    /// Raw query strings, in arrival order.
    pub fn queries(&self) -> Vec<String> {
        self.state.queries.lock().clone()
    }
}

/// A port nothing listens on.
pub fn closed_host() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind spare port");
    let addr = listener.local_addr().expect("spare port address");
    drop(listener);
    addr.to_string()
}

// ─── Handlers ────────────────────────────────────────────────────

async fn write_handler(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> StatusCode {
    state.writes.lock().push(body);
    let code = *state.write_status.lock();
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn query_handler(State(state): State<Arc<MockState>>, RawQuery(query): RawQuery) -> Response {
    let query = query.unwrap_or_default();
    state.queries.lock().push(query.clone());

    let scripted = state.script.lock().pop_front();
    let reply = match scripted {
        Some(reply) => reply,
        None => state.fallback.lock().clone(),
    };

    match reply {
        Reply::Status(code) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Reply::Body(body) => (StatusCode::OK, body).into_response(),
        Reply::Echo => echo(&state.metric, &query),
        Reply::Hang(delay) => {
            tokio::time::sleep(delay).await;
            StatusCode::OK.into_response()
        }
        Reply::Late(delay) => {
            tokio::time::sleep(delay).await;
            echo(&state.metric, &query)
        }
    }
}

fn echo(metric: &str, query: &str) -> Response {
    let start = query_param(query, "start").unwrap_or_default();
    let line = format!("l.numeric.{metric} {start} 0 host=mock\n");
    (StatusCode::OK, line).into_response()
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_owned())
    })
}
