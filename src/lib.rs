//! # `mapfill`
//!
//! A fill/lookup scalability harness for concurrent key-value maps.
//!
//! Each round fixes a uniqueness percentage `p` and a final table size `N`, generates
//! `N * 100 / p` keys drawn from a range of `N` values (so the filled table holds at
//! most `N` entries), then sweeps thread counts and candidate maps:
//!
//! 1. **Insert phase**: every worker inserts its contiguous slice of the key stream.
//! 2. **Find phase**: after a barrier, every worker looks up the same slice and
//!    requires every key to be present exactly once.
//!
//! The wall clock of each phase is recorded per (round, threads, candidate) and
//! rendered as text, Markdown, JSON or HTML.
//!
//! ## Candidates
//!
//! | Name | Map |
//! |------|-----|
//! | `DashMap` | [`dashmap::DashMap`] |
//! | `SccHashMap` | [`scc::HashMap`] |
//! | `Papaya` | [`papaya::HashMap`] |
//! | `SkipMap` | [`crossbeam_skiplist::SkipMap`] |
//! | `RwLockStd` | `parking_lot::RwLock<HashMap>` baseline |
//!
//! Further maps plug in through [`Registry::register`].
//!
//! ## Library use
//!
//! ```rust
//! use mapfill::{HarnessConfig, Registry, RoundController, StatisticsCollector};
//!
//! let config = HarnessConfig {
//!     table_size: 1_000,
//!     percents: vec![10, 100],
//!     min_threads: 1,
//!     max_threads: 2,
//!     ..HarnessConfig::default()
//! };
//! let config = config.validate(&Registry::with_builtin())?;
//!
//! let mut stats = StatisticsCollector::new("mapfill");
//! RoundController::new(&config).run(&mut stats)?;
//! assert_eq!(stats.len(), 2 * 2 * 5 * 2);
//! # Ok::<(), mapfill::BenchError>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Throughput math converts counts and nanoseconds to f64.
#![allow(clippy::cast_precision_loss)]

mod tracing_helpers;

pub mod allocator;
pub mod candidate;
pub mod config;
pub mod error;
pub mod keys;
pub mod orchestrator;
pub mod report;
pub mod rounds;
pub mod stats;
pub mod workload;

pub use allocator::AllocatorKind;
pub use candidate::{Candidate, CandidateEntry, CandidateFactory, Registry};
pub use config::{HarnessConfig, ValidatedConfig};
pub use error::{BenchError, Result};
pub use keys::{Key, KeyStream, RoundDescriptor, UniquePercent};
pub use orchestrator::{PhaseTimings, RunTimings, ThreadTiming};
pub use report::ReportFormat;
pub use rounds::RoundController;
pub use stats::{StatisticsCollector, TimingSample};
pub use workload::{FillTester, Phase};
