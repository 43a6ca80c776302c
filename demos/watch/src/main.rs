//! Watches workflow runs on an HTTP engine until they finish.
//!
//! ```text
//! RUNWATCH_ENGINE_URL=http://localhost:8080/api/v1 \
//! RUNWATCH_STATE_FILE=/tmp/runwatch.json \
//!     cargo run -p watch -- nightly-report run-42
//! ```
//!
//! Without arguments the binary only resumes what the state file holds.

use std::{env, sync::Arc};

use tracing::{info, warn};

use runwatch_core::{FileRegistry, Subscription, Tracker, TrackerConfig};
use runwatch_http::{HttpFetcherConfig, HttpStatusFetcher};
use runwatch_model::TrackOptions;
use runwatch_observe::{Journal, logger_init_from_env};
use runwatch_prometheus::{PrometheusMetrics, TextEncoder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Logger (RUNWATCH_LOG, RUNWATCH_LOG_FORMAT)
    let log_cfg = logger_init_from_env()?;
    info!(format = ?log_cfg.format, level = %log_cfg.level, "logger initialized");

    // 2) Fetcher
    let mut http = HttpFetcherConfig::new(
        env::var("RUNWATCH_ENGINE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
    );
    if let Ok(token) = env::var("RUNWATCH_TOKEN") {
        http = http.with_bearer_token(token);
    }
    info!(base_url = %http.base_url, runs_path = %http.runs_path, "engine configured");
    let fetcher = Arc::new(HttpStatusFetcher::new(http)?);

    // 3) Registry + observers
    let state_file =
        env::var("RUNWATCH_STATE_FILE").unwrap_or_else(|_| "runwatch-state.json".to_string());
    let registry = Arc::new(FileRegistry::open(&state_file).await?);
    let metrics = Arc::new(PrometheusMetrics::new()?);

    let tracker = Tracker::builder(fetcher)
        .with_config(TrackerConfig::default().with_defaults(
            TrackOptions::default()
                .with_poll_interval_secs(5)
                .with_max_timeout_secs(30 * 60),
        ))
        .with_registry(registry)
        .with_observer(Arc::new(Journal))
        .with_observer(metrics.clone())
        .build()?;

    // 4) Resume leftovers, then track what was asked for
    let mut subscriptions = tracker.resume().await?;
    info!(resumed = subscriptions.len(), state_file = %state_file, "resumed tracked runs");

    let args: Vec<String> = env::args().skip(1).collect();
    if let [key, run_id] = args.as_slice() {
        subscriptions.push(tracker.track_default(key, run_id.as_str()).await?);
    } else if !args.is_empty() {
        warn!("usage: watch [<key> <run-id>]");
    }

    for sub in subscriptions {
        tokio::spawn(report(sub));
    }

    // 5) Keep running; entries stay in the state file for the next start
    info!("press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    let encoder = TextEncoder::new();
    match encoder.encode_to_string(&metrics.gather()) {
        Ok(text) => println!("{text}"),
        Err(e) => warn!(error = %e, "failed to encode metrics"),
    }
    info!(active = ?tracker.active_keys().await, "shutting down");
    Ok(())
}

async fn report(sub: Subscription) {
    let key = sub.key().to_string();
    match sub.wait().await {
        Ok(snapshot) => info!(%key, run_id = %snapshot.run_id, state = %snapshot.state, "run finished"),
        Err(e) => warn!(%key, error = %e, "run not confirmed"),
    }
}
