//! Write-then-poll propagation latency probe for OpenTSDB-style metric stores.
//!
//! A round writes one data point stamped with the current second, then polls
//! the query endpoint until that second shows up in the result or the round
//! deadline passes.

pub mod cli;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod parse;
pub mod poller;
pub mod report;
pub mod writer;

pub use client::{SeriesQuery, TsdbClient};
pub use config::ProbeConfig;
pub use driver::RoundDriver;
pub use poller::{poll, Outcome, PollSettings, TimeoutCause};
pub use report::RoundReport;
