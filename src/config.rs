//! Harness configuration.
//!
//! Built-in defaults, then the `TABLE_SIZE` environment variable, then command-line
//! overrides applied by the binary. [`HarnessConfig::validate`] runs before any key is
//! generated, so a bad configuration aborts without producing a partial report.

use std::env;
use std::num::NonZeroUsize;
use std::thread;

use crate::candidate::{CandidateEntry, Registry};
use crate::error::{BenchError, Result};
use crate::keys::UniquePercent;

/// Final table size when `TABLE_SIZE` is not set.
pub const DEFAULT_TABLE_SIZE: usize = 2_000_000;

/// Uniqueness percentages tested by default.
pub const DEFAULT_PERCENTS: [u32; 5] = [5, 10, 20, 30, 100];

/// Seed of the key generator.
pub const DEFAULT_SEED: u64 = 10101;

/// Most percentages one run accepts.
pub const MAX_PERCENTS: usize = 10;

/// Environment variable overriding [`DEFAULT_TABLE_SIZE`].
pub const TABLE_SIZE_VAR: &str = "TABLE_SIZE";

/// Everything a run needs to know before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Distinct keys the filled table should end up with.
    pub table_size: usize,
    /// Uniqueness percentages, one round each, in this order.
    pub percents: Vec<u32>,
    /// Smallest thread count.
    pub min_threads: usize,
    /// Largest thread count.
    pub max_threads: usize,
    /// Key generator seed.
    pub seed: u64,
    /// Candidate names. Empty means every registered candidate.
    pub candidates: Vec<String>,
    /// Log fill progress between phases.
    pub verbose: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            table_size: DEFAULT_TABLE_SIZE,
            percents: DEFAULT_PERCENTS.to_vec(),
            min_threads: 1,
            max_threads: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            seed: DEFAULT_SEED,
            candidates: Vec::new(),
            verbose: false,
        }
    }
}

/// A configuration that passed [`HarnessConfig::validate`].
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    /// Distinct keys the filled table should end up with.
    pub table_size: usize,
    /// Rounds, in execution order.
    pub percents: Vec<UniquePercent>,
    /// Thread counts, ascending.
    pub threads: std::ops::RangeInclusive<usize>,
    /// Key generator seed.
    pub seed: u64,
    /// Candidates, in registration order.
    pub candidates: Vec<CandidateEntry>,
    /// Log fill progress between phases.
    pub verbose: bool,
}

impl HarnessConfig {
    /// Apply `TABLE_SIZE` from the process environment.
    ///
    /// # Errors
    ///
    /// [`BenchError::InvalidTableSize`] if the variable is set but malformed.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_table_size(env::var(TABLE_SIZE_VAR).ok().as_deref())
    }

    /// Apply a `TABLE_SIZE` value. `None` keeps the current size.
    ///
    /// # Errors
    ///
    /// [`BenchError::InvalidTableSize`] for anything but a positive integer.
    pub fn apply_table_size(&mut self, raw: Option<&str>) -> Result<()> {
        let Some(raw) = raw else {
            return Ok(());
        };

        match raw.trim().parse::<usize>() {
            Ok(size) if size > 0 => {
                self.table_size = size;
                Ok(())
            }
            _ => Err(BenchError::InvalidTableSize(raw.to_string())),
        }
    }

    /// Check every setting and resolve candidates against `registry`.
    ///
    /// # Errors
    ///
    /// The first configuration error found.
    pub fn validate(&self, registry: &Registry) -> Result<ValidatedConfig> {
        if self.table_size == 0 {
            return Err(BenchError::ZeroCapacity);
        }
        if self.table_size.checked_mul(100).is_none() {
            return Err(BenchError::CapacityOverflow(self.table_size));
        }

        if self.percents.is_empty() {
            return Err(BenchError::NoPercents);
        }
        if self.percents.len() > MAX_PERCENTS {
            return Err(BenchError::TooManyPercents {
                count: self.percents.len(),
                max: MAX_PERCENTS,
            });
        }

        let mut percents = Vec::with_capacity(self.percents.len());
        for &raw in &self.percents {
            let percent = UniquePercent::new(raw)?;
            if percents.contains(&percent) {
                return Err(BenchError::DuplicatePercent(raw));
            }
            percents.push(percent);
        }

        if self.min_threads == 0 || self.min_threads > self.max_threads {
            return Err(BenchError::InvalidThreadRange {
                min: self.min_threads,
                max: self.max_threads,
            });
        }

        Ok(ValidatedConfig {
            table_size: self.table_size,
            percents,
            threads: self.min_threads..=self.max_threads,
            seed: self.seed,
            candidates: registry.select(&self.candidates)?,
            verbose: self.verbose,
        })
    }
}
