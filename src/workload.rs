//! The fill workload: an insert phase followed by a find phase.
//!
//! Worker `t` of `n` owns keys `[t * n_items, (t + 1) * n_items)` of the stream, with
//! `n_items = input_size / n`. Both phases use the same partitions, so every key a
//! worker looks up was inserted by some worker. The last `input_size % n` keys are
//! never touched. At most `n - 1` keys are lost that way, which is negligible next to
//! the stream length.
//!
//! Phase ordering is not enforced here. The orchestrator runs every worker through
//! [`FillTester::run_phase`] with a barrier before each phase.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::error::{BenchError, Result};
use crate::keys::KeyStream;
use crate::tracing_helpers::info_log;

/// One sub-workload of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Every worker inserts its partition, paired with its thread index.
    Insert,
    /// Every worker looks its partition up and requires `count == 1`.
    Find,
}

impl Phase {
    /// Phases in execution order.
    pub const ALL: [Self; 2] = [Self::Insert, Self::Find];

    /// Position in [`Phase::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Insert => 0,
            Self::Find => 1,
        }
    }

    /// Report name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Find => "find",
        }
    }

    /// `true` for the last phase.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Find)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One execution of the fill workload over a shared stream and a shared table.
pub struct FillTester<'a> {
    keys: &'a KeyStream,
    table: &'a dyn Candidate,
    threads: usize,
    n_items: usize,
    verbose: bool,
}

impl<'a> FillTester<'a> {
    /// Prepare an execution for `threads` workers.
    ///
    /// # Errors
    ///
    /// [`BenchError::InvalidThreadRange`] when `threads` is zero.
    pub fn new(keys: &'a KeyStream, table: &'a dyn Candidate, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(BenchError::InvalidThreadRange { min: 0, max: 0 });
        }

        Ok(Self {
            keys,
            table,
            threads,
            n_items: keys.len() / threads,
            verbose: false,
        })
    }

    /// Log fill progress from worker 0 at the start of every phase after the first.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Workers in this execution.
    #[must_use]
    pub const fn threads(&self) -> usize {
        self.threads
    }

    /// Operations each worker performs per phase.
    #[must_use]
    pub const fn n_items(&self) -> usize {
        self.n_items
    }

    /// Operations all workers perform per phase.
    #[must_use]
    pub const fn operations(&self) -> usize {
        self.threads * self.n_items
    }

    /// Keys of the stream no worker touches.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.keys.len() - self.operations()
    }

    /// The table under test.
    #[must_use]
    pub fn table(&self) -> &'a dyn Candidate {
        self.table
    }

    /// Stream range owned by `thread`. The same in every phase.
    #[must_use]
    pub const fn partition(&self, thread: usize) -> Range<usize> {
        thread * self.n_items..(thread + 1) * self.n_items
    }

    /// Called by every worker right after the barrier that opens `phase`.
    ///
    /// Returns the table size worker 0 observed when it logged progress, and `None` for
    /// every other worker, for the first phase, and when verbose output is off.
    pub fn on_phase_start(&self, phase: Phase, thread: usize) -> Option<usize> {
        if !self.verbose || thread != 0 || phase.index() == 0 {
            return None;
        }

        let filled = self.table.len();
        info_log!(
            table = self.table.name(),
            inserted = filled,
            percent_of_operations = format_args!("{:.2}", self.progress(filled, phase)),
            "fill progress"
        );
        Some(filled)
    }

    /// `filled` as a percentage of the operations issued before `phase`.
    fn progress(&self, filled: usize, phase: Phase) -> f64 {
        100.0 * filled as f64 / (self.keys.len() * phase.index()) as f64
    }

    /// Run `phase` for worker `thread`.
    ///
    /// # Errors
    ///
    /// [`BenchError::MissingKey`] when the find phase looks up a key the table does not
    /// hold. The first missing key ends the worker's phase.
    pub fn run_phase(&self, phase: Phase, thread: usize) -> Result<()> {
        let range = self.partition(thread);
        let start = range.start;
        let keys = self.keys.slice(range);

        match phase {
            Phase::Insert => {
                for &key in keys {
                    self.table.insert(key, thread);
                }
            }
            Phase::Find => {
                for (offset, &key) in keys.iter().enumerate() {
                    let count = self.table.count(key);
                    if count != 1 {
                        return Err(BenchError::MissingKey {
                            phase,
                            thread,
                            index: start + offset,
                            key,
                            count,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
