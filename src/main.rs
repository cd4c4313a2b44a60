use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use tsdb_latency_probe::cli::Cli;
use tsdb_latency_probe::{RoundDriver, TsdbClient};

/// Conventional exit status for a process stopped by SIGINT.
const EXIT_INTERRUPTED: i32 = 130;
const EXIT_CONFIG: i32 = 2;

#[tokio::main]
async fn main() {
    // ── 1. Logging (stderr only; stdout carries results) ────────
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // ── 2. Configuration ────────────────────────────────────────
    let config = Cli::parse().resolve().unwrap_or_else(|e| {
        eprintln!("❌ {e}");
        std::process::exit(EXIT_CONFIG);
    });

    let client = TsdbClient::new(&config.write_host, &config.query_host).unwrap_or_else(|e| {
        eprintln!("❌ {e}");
        std::process::exit(EXIT_CONFIG);
    });

    info!(
        write_host = %config.write_host,
        query_host = %config.query_host,
        metric = %config.metric,
        rounds = config.repeat,
        concurrency = config.concurrency,
        "starting latency probe"
    );

    // ── 3. Run rounds until done or interrupted ─────────────────
    let driver = Arc::new(RoundDriver::new(config, client));
    let rounds = driver.clone().run(|report| println!("{report}"));

    tokio::pin!(rounds);
    tokio::select! {
        _ = &mut rounds => {}
        interrupt = signal::ctrl_c() => {
            if interrupted(interrupt) {
                warn!("interrupted, abandoning in-flight round");
                std::process::exit(EXIT_INTERRUPTED);
            }
            rounds.await;
        }
    }

    // ── 4. Summary ──────────────────────────────────────────────
    let summary = driver.summary();
    info!(
        summary = %serde_json::to_string(&summary).unwrap_or_default(),
        "probe finished"
    );
}

/// Only a delivered Ctrl-C counts; a listener that failed to install
/// leaves the rounds running.
fn interrupted(signal: std::io::Result<()>) -> bool {
    match signal {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C, running without interrupt handling");
            false
        }
    }
}
