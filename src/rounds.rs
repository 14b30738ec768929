//! Round controller: sweeps percentages, thread counts and candidates.
//!
//! ```text
//! for percent in percents:                 (declared order)
//!     keys = generate(percent, table_size) (one seeded generator for the whole run)
//!     for threads in min..=max:
//!         for candidate in candidates:     (registration order)
//!             table = candidate.build(threads * 16)
//!             run insert + find on `threads` workers
//!     label round "<percent>%"
//! ```
//!
//! The generator is seeded once, so the same configuration reproduces every stream bit
//! for bit. Each execution gets a freshly built table.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::candidate::{self, CandidateEntry};
use crate::config::ValidatedConfig;
use crate::error::Result;
use crate::keys::{KeyStream, UniquePercent};
use crate::orchestrator::{self, RunTimings};
use crate::stats::StatisticsCollector;
use crate::tracing_helpers::{debug_log, info_log, warn_log};
use crate::workload::{FillTester, Phase};

/// Drives a validated configuration to completion.
pub struct RoundController<'a> {
    config: &'a ValidatedConfig,
}

impl<'a> RoundController<'a> {
    /// Controller over `config`.
    #[must_use]
    pub const fn new(config: &'a ValidatedConfig) -> Self {
        Self { config }
    }

    /// Run every round and record one sample per phase of every execution.
    ///
    /// Also fills in the report's run information and round titles.
    ///
    /// # Errors
    ///
    /// The first failure, wrapped in [`crate::BenchError::Execution`] when it happened inside
    /// an execution. Samples recorded before the failure stay in `stats`.
    pub fn run(&self, stats: &mut StatisticsCollector) -> Result<()> {
        let config = self.config;
        stats.set_run_info("Items", config.table_size);
        stats.set_run_info("Seed", config.seed);
        stats.set_run_info(
            "Threads",
            format!("{}..={}", config.threads.start(), config.threads.end()),
        );

        let mut rng = StdRng::seed_from_u64(config.seed);
        let first_round = stats.rounds().last().map_or(0, |r| r + 1);

        for (i, &percent) in config.percents.iter().enumerate() {
            let round = first_round + i;
            let keys = KeyStream::for_round(percent, config.table_size, &mut rng)?;

            info_log!(
                round,
                %percent,
                input_size = keys.len(),
                distinct_bound = ?keys.round().distinct_bound,
                "round start"
            );

            for threads in config.threads.clone() {
                for entry in &config.candidates {
                    let timings = self
                        .execute(&keys, entry, threads)
                        .map_err(|e| e.in_execution(percent.get(), threads, entry.name()))?;
                    stats.record_run(round, percent, entry.name(), &timings);
                }
            }

            stats.set_round_title(round, percent.to_string());
        }
        Ok(())
    }

    /// One execution: fresh table, insert phase, find phase.
    ///
    /// # Errors
    ///
    /// Construction, spawn and correctness failures, unwrapped.
    pub fn execute(
        &self,
        keys: &KeyStream,
        entry: &CandidateEntry,
        threads: usize,
    ) -> Result<RunTimings> {
        let capacity = candidate::capacity_hint(entry.name(), threads)?;
        let table = entry.build(capacity)?;

        debug_log!(
            candidate = entry.name(),
            threads,
            capacity,
            "execution start"
        );

        let tester = FillTester::new(keys, &*table, threads)?.verbose(self.config.verbose);
        if tester.n_items() == 0 {
            warn_log!(
                candidate = entry.name(),
                threads,
                input_size = keys.len(),
                "more workers than keys, execution performs no operations"
            );
        }
        orchestrator::run(&tester, &Phase::ALL)
    }
}

/// Generate the key stream of every round the way [`RoundController::run`] does.
///
/// # Errors
///
/// See [`KeyStream::for_round`].
pub fn key_streams(
    seed: u64,
    percents: &[UniquePercent],
    table_size: usize,
) -> Result<Vec<KeyStream>> {
    let mut rng = StdRng::seed_from_u64(seed);
    percents
        .iter()
        .map(|&percent| KeyStream::for_round(percent, table_size, &mut rng))
        .collect()
}
