//! Common test utilities with comprehensive tracing setup.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//!     // ... test code with tracing::info!, tracing::debug!, etc.
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Filter directives (e.g., `mapfill=debug,mapfill::orchestrator=trace`)
//! - `MAPFILL_LOG_DIR`: Log directory (default: `logs/`)
//! - `MAPFILL_LOG_CONSOLE`: Set to "0" to disable console output
//!
//! # Log Files
//!
//! Logs are appended to `logs/mapfill.jsonl` as newline-delimited JSON (NDJSON):
//!
//! ```bash
//! # Phase timings of every execution
//! jq 'select(.fields.message == "phase complete")' logs/mapfill.jsonl
//!
//! # Failed executions only
//! jq 'select(.level == "ERROR")' logs/mapfill.jsonl
//! ```

#![allow(dead_code)]

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Once;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Ensures tracing is only initialized once across all tests.
static INIT: Once = Once::new();

/// Initialize the tracing subscriber with file and console logging.
///
/// Safe to call multiple times - only the first call takes effect.
/// Logs go to `logs/mapfill.jsonl`.
pub fn init_tracing() {
    INIT.call_once(|| {
        setup_tracing();
    });
}

/// Configuration for tracing setup.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Directory for log files.
    pub log_dir: PathBuf,
    /// Log file name.
    pub log_file: String,
    /// Enable console output.
    pub console_enabled: bool,
    /// Default log level if RUST_LOG is not set.
    pub default_level: Level,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_file: "mapfill.jsonl".to_string(),
            console_enabled: true,
            default_level: Level::INFO,
        }
    }
}

impl TracingConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("MAPFILL_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if env::var("MAPFILL_LOG_CONSOLE").is_ok_and(|v| v == "0") {
            config.console_enabled = false;
        }

        config
    }
}

/// `RUST_LOG`, or the harness at `default_level` and everything else at `warn`.
fn make_filter(default_level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,mapfill={default_level}")))
}

#[expect(clippy::expect_used)]
fn setup_tracing() {
    let config = TracingConfig::from_env();

    // Create log directory
    std::fs::create_dir_all(&config.log_dir).expect("Failed to create log directory");

    let log_path = config.log_dir.join(&config.log_file);

    // Open file in append mode (nextest runs tests in separate processes)
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    // === Console Layer ===
    let console_layer = if config.console_enabled {
        Some(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(true)
                .compact()
                .with_filter(make_filter(config.default_level)),
        )
    } else {
        None
    };

    // === File Layer (NDJSON format) ===
    // Writes one JSON object per line. Use `jq` for pretty-printing.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::sync::Mutex::new(file))
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .json()
        .with_filter(make_filter(config.default_level));

    // Compose and install subscriber (use try_init to avoid panic if lib already set one)
    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

/// Key stream for `percent` and `capacity` from the harness's default seed.
pub fn stream(percent: u32, capacity: usize) -> mapfill::KeyStream {
    use rand::SeedableRng;

    let percent = mapfill::UniquePercent::new(percent).expect("valid percent");
    let mut rng = rand::rngs::StdRng::seed_from_u64(mapfill::config::DEFAULT_SEED);
    mapfill::KeyStream::for_round(percent, capacity, &mut rng).expect("valid round")
}

/// Config over `candidates` with small defaults for integration runs.
pub fn small_config(
    table_size: usize,
    percents: &[u32],
    max_threads: usize,
    candidates: &[&str],
) -> mapfill::HarnessConfig {
    mapfill::HarnessConfig {
        table_size,
        percents: percents.to_vec(),
        min_threads: 1,
        max_threads,
        candidates: candidates.iter().map(|&c| c.to_string()).collect(),
        ..mapfill::HarnessConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_init() {
        init_tracing();
        tracing::info!("Tracing initialized successfully");
        tracing::debug!(candidate = "DashMap", threads = 4, "Debug event");
        tracing::trace!(thread = ?std::thread::current().id(), "Trace event");
    }
}
