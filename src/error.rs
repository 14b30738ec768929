//! Error taxonomy for the harness.
//!
//! Every variant is fatal. Nothing is retried or recovered mid-run. Failures that happen
//! inside one execution are wrapped in [`BenchError::Execution`] so the diagnostic names
//! the (round, thread count, candidate) triple that failed.

use std::io;

use crate::workload::Phase;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Everything that can abort a benchmark run.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    // ------------------------------------------------------------------
    //  Configuration
    // ------------------------------------------------------------------
    /// Uniqueness percentage outside `1..=30` and not exactly `100`.
    #[error(
        "unsupported uniqueness percentage {0}%: only 1-30% and exactly 100% produce the requested distinct-key ratio"
    )]
    InvalidPercent(u32),

    /// The same percentage was configured twice.
    #[error("uniqueness percentage {0}% is configured more than once")]
    DuplicatePercent(u32),

    /// More percentages than a run supports.
    #[error("{count} uniqueness percentages configured, at most {max} are supported")]
    TooManyPercents {
        /// Number configured.
        count: usize,
        /// Supported ceiling.
        max: usize,
    },

    /// No percentages configured.
    #[error("no uniqueness percentages configured")]
    NoPercents,

    /// Table capacity of zero.
    #[error("table capacity must be positive")]
    ZeroCapacity,

    /// `capacity * 100 / percent` does not fit in `usize`.
    #[error("table capacity {0} is too large to derive an input size")]
    CapacityOverflow(usize),

    /// `TABLE_SIZE` is set but is not a positive integer.
    #[error("TABLE_SIZE={0:?} is not a positive integer")]
    InvalidTableSize(String),

    /// `min_threads` is zero or above `max_threads`.
    #[error("invalid thread range {min}..={max}")]
    InvalidThreadRange {
        /// Lower bound.
        min: usize,
        /// Upper bound.
        max: usize,
    },

    /// A configured candidate is not in the registry.
    #[error("unknown candidate {0:?}")]
    UnknownCandidate(String),

    /// A candidate name was registered twice.
    #[error("candidate {0:?} is already registered")]
    DuplicateCandidate(String),

    /// No candidates selected.
    #[error("no candidates selected")]
    NoCandidates,

    // ------------------------------------------------------------------
    //  Resources
    // ------------------------------------------------------------------
    /// The scalable allocator is not installed.
    #[error("expected the {expected} allocator, found {found}; rebuild with `--features mimalloc`")]
    AllocatorMismatch {
        /// Allocator the harness requires.
        expected: &'static str,
        /// Allocator actually installed.
        found: &'static str,
    },

    /// A candidate could not be built for the requested capacity hint.
    #[error("cannot construct {candidate} with capacity hint {capacity}: {reason}")]
    CandidateConstruction {
        /// Candidate name.
        candidate: String,
        /// Requested capacity hint.
        capacity: usize,
        /// What went wrong.
        reason: String,
    },

    /// The key stream of a round could not be allocated.
    #[error("round {percent}%: cannot allocate a stream of {keys} keys: {reason}")]
    KeyAllocation {
        /// Uniqueness percentage of the round.
        percent: u32,
        /// Requested stream length.
        keys: usize,
        /// What went wrong.
        reason: String,
    },

    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker {thread}: {source}")]
    ThreadSpawn {
        /// Worker index.
        thread: usize,
        /// OS error.
        #[source]
        source: io::Error,
    },

    // ------------------------------------------------------------------
    //  Correctness
    // ------------------------------------------------------------------
    /// A key inserted during the insert phase is not visible during the find phase.
    #[error(
        "{phase} phase: thread {thread} looked up key {key} (stream index {index}) and got count {count}, expected 1"
    )]
    MissingKey {
        /// Phase in which the lookup happened.
        phase: Phase,
        /// Worker index.
        thread: usize,
        /// Position in the key stream.
        index: usize,
        /// The key itself.
        key: u64,
        /// What `count` returned.
        count: usize,
    },

    /// A worker panicked.
    #[error("worker {thread} panicked{}: {message}", during(.phase))]
    WorkerPanicked {
        /// Worker index.
        thread: usize,
        /// Phase that was running, if any.
        phase: Option<Phase>,
        /// Panic payload, if it was a string.
        message: String,
    },

    // ------------------------------------------------------------------
    //  Context and output
    // ------------------------------------------------------------------
    /// Failure inside one (round, thread count, candidate) execution.
    #[error("round {percent}%, {threads} thread(s), candidate {candidate}: {source}")]
    Execution {
        /// Uniqueness percentage of the round.
        percent: u32,
        /// Thread count of the execution.
        threads: usize,
        /// Candidate under test.
        candidate: String,
        /// Underlying failure.
        #[source]
        source: Box<BenchError>,
    },

    /// Writing a report failed.
    #[error("report output failed: {0}")]
    Report(#[from] io::Error),

    /// Formatting a report failed.
    #[error("report formatting failed")]
    Format(#[from] std::fmt::Error),

    /// Serializing a report failed.
    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn during(phase: &Option<Phase>) -> String {
    phase.map_or_else(String::new, |phase| format!(" during the {phase} phase"))
}

impl BenchError {
    /// Attach the execution triple to an error.
    #[must_use]
    pub fn in_execution(self, percent: u32, threads: usize, candidate: &str) -> Self {
        Self::Execution {
            percent,
            threads,
            candidate: candidate.to_string(),
            source: Box::new(self),
        }
    }

    /// `true` for errors that mean a candidate lost or hid an insert.
    #[must_use]
    pub fn is_correctness_violation(&self) -> bool {
        match self {
            Self::MissingKey { .. } => true,
            Self::Execution { source, .. } => source.is_correctness_violation(),
            _ => false,
        }
    }

    /// Innermost error, skipping execution context.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Execution { source, .. } => source.root(),
            other => other,
        }
    }
}
