//! Fill/lookup scalability benchmark.
//!
//! Run with:
//! ```bash
//! # Full sweep with the defaults (2M items, 5/10/20/30/100%, 1..=ncpu threads)
//! cargo run --release
//!
//! # Smaller table, two rounds, two candidates, markdown + JSON into results/
//! TABLE_SIZE=200000 cargo run --release -- \
//!     --percents 10,100 --candidates DashMap,Papaya \
//!     --format markdown --format json --output-dir results
//!
//! # Progress logging plus an NDJSON log file
//! cargo run --release -- --verbose --log-file logs/mapfill.jsonl
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use mapfill::{
    BenchError, HarnessConfig, Registry, ReportFormat, RoundController, StatisticsCollector,
    allocator,
};

#[cfg(feature = "tracing")]
type TracingGuard = Option<tracing_appender::non_blocking::WorkerGuard>;

#[cfg(not(feature = "tracing"))]
type TracingGuard = ();

/// Fill concurrent maps from N threads and time insert and find phases.
#[derive(Debug, Parser)]
#[command(name = "mapfill", version, about)]
struct Cli {
    /// Log fill progress between phases.
    #[arg(short, long)]
    verbose: bool,

    /// Smallest thread count.
    #[arg(long)]
    min_threads: Option<usize>,

    /// Largest thread count [default: available parallelism].
    #[arg(long)]
    max_threads: Option<usize>,

    /// Uniqueness percentages, one round each (1..=30 or 100).
    #[arg(long, value_delimiter = ',')]
    percents: Vec<u32>,

    /// Candidates to run [default: all registered].
    #[arg(long, value_delimiter = ',')]
    candidates: Vec<String>,

    /// Key generator seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Report formats written to the output directory [default: text, json].
    #[arg(long = "format", value_enum)]
    formats: Vec<ReportFormat>,

    /// Directory receiving the report files.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Also write NDJSON logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the registered candidates and exit.
    #[arg(long)]
    list: bool,
}

impl Cli {
    fn config(&self) -> Result<HarnessConfig, BenchError> {
        let mut config = HarnessConfig::default();
        config.apply_env()?;
        Ok(self.overlay(config))
    }

    /// Command-line flags on top of `config`. Flags win over the environment.
    fn overlay(&self, mut config: HarnessConfig) -> HarnessConfig {
        if let Some(min) = self.min_threads {
            config.min_threads = min;
        }
        if let Some(max) = self.max_threads {
            config.max_threads = max;
        }
        if !self.percents.is_empty() {
            config.percents.clone_from(&self.percents);
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.candidates.clone_from(&self.candidates);
        config.verbose = self.verbose;
        config
    }

    fn formats(&self) -> Vec<ReportFormat> {
        if self.formats.is_empty() {
            vec![ReportFormat::Text, ReportFormat::Json]
        } else {
            self.formats.clone()
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.log_file.as_deref());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::error!(error = %e, "run aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), BenchError> {
    let registry = Registry::with_builtin();

    if cli.list {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    allocator::ensure_scalable()?;
    let config = cli.config()?.validate(&registry)?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        table_size = config.table_size,
        threads = ?config.threads,
        seed = config.seed,
        candidates = config.candidates.len(),
        allocator = %allocator::active(),
        "starting"
    );

    let mut stats = StatisticsCollector::new("mapfill");
    RoundController::new(&config).run(&mut stats)?;

    print!("{}", stats.render(ReportFormat::Text)?);

    for path in stats.report(&cli.formats(), &cli.output_dir)? {
        println!("wrote {}", path.display());
    }
    Ok(())
}

// =============================================================================
// Tracing initialization
// =============================================================================

#[cfg(feature = "tracing")]
fn init_tracing(verbose: bool, log_file: Option<&Path>) -> TracingGuard {
    use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = if verbose { "info" } else { "warn" };
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_target(true)
        .compact()
        .with_filter(filter());

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty());
            let dir = dir.unwrap_or_else(|| Path::new("."));
            let name = path.file_name().map_or_else(
                || std::ffi::OsString::from("mapfill.jsonl"),
                std::ffi::OsStr::to_os_string,
            );
            let _ = std::fs::create_dir_all(dir);

            let appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .json()
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();

    guard
}

#[cfg(not(feature = "tracing"))]
fn init_tracing(_verbose: bool, log_file: Option<&Path>) -> TracingGuard {
    if log_file.is_some() {
        eprintln!("--log-file ignored: built without the `tracing` feature");
    }
}
