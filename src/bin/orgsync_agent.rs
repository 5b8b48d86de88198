//! CLI entry point: loads config, runs one cycle immediately, then sleeps
//! until the next configured daily offset and repeats.
//!
//! Grounded in `timer.go`'s `InitTimer`: compute seconds until the next
//! occurrence of the configured offset-from-midnight, sleep, run, repeat
//! forever. `env::args` argument handling follows `cli.rs`'s style rather
//! than reaching for a flag-parsing crate for a single `--config` option.

use std::env;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use orgsync_agent::config::{parse_daily_offset, AgentConfig};
use orgsync_agent::sot::SotClient;
use orgsync_agent::target::{TargetApi, TargetClient};
use orgsync_agent::{run_once, AgentState};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[tokio::main]
async fn main() {
    let config_path = parse_args();

    let config = match AgentConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config {}: {}", config_path, e);
            process::exit(1);
        }
    };

    init_tracing(&config);

    tracing::info!(config = %config_path, "orgsync-agent starting");

    let sot = SotClient::new(&config);
    let target: Arc<dyn TargetApi> = Arc::new(TargetClient::new(&config));
    let mut state = AgentState::new();
    let offset_seconds = parse_daily_offset(&config.sot.read_interval) as i64;

    loop {
        match run_once(&config, &sot, Arc::clone(&target), &mut state).await {
            Ok(report) => {
                tracing::info!(
                    departments_created = report.departments_created,
                    departments_updated = report.departments_updated,
                    departments_deleted = report.departments_deleted,
                    users_completed = report.users_completed,
                    user_failures = report.user_failures,
                    "cycle complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "cycle failed");
            }
        }

        let sleep_for = seconds_until_next_offset(offset_seconds);
        tracing::info!(seconds = sleep_for, "sleeping until next cycle");
        tokio::time::sleep(Duration::from_secs(sleep_for as u64)).await;
    }
}

fn parse_args() -> String {
    let args: Vec<String> = env::args().collect();
    let mut config_path = "config.yaml".to_string();

    let mut i = 1;
    while i < args.len() {
        if args[i] == "--config" && i + 1 < args.len() {
            config_path = args[i + 1].clone();
            i += 2;
        } else {
            eprintln!("Usage: {} [--config <path>]", args[0]);
            process::exit(1);
        }
    }

    config_path
}

fn init_tracing(config: &AgentConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Seconds from now until the next time-of-day `offset_seconds` occurs,
/// computed against the wall clock rather than `Instant` since it tracks
/// a calendar offset, not an elapsed duration.
fn seconds_until_next_offset(offset_seconds: i64) -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;

    let seconds_today = now % SECONDS_PER_DAY;
    let day_start = now - seconds_today;

    let mut next = day_start + offset_seconds;
    if next <= now {
        next += SECONDS_PER_DAY;
    }
    (next - now).max(1)
}
