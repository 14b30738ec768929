//! Timing samples and the collector that owns them.
//!
//! One sample is recorded per (round, thread count, candidate, phase). Samples are
//! never modified after recording. Rendering reads them through [`StatisticsCollector::rows`],
//! which groups by round, then thread count, then recording order (the Round Controller
//! records candidates in registration order).

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::keys::UniquePercent;
use crate::orchestrator::RunTimings;
use crate::report::{self, ReportFormat};
use crate::workload::Phase;

/// Report title used when none is set.
pub const DEFAULT_TITLE: &str = "Operations per second";

/// One timed phase of one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSample {
    /// Round index, in execution order.
    pub round: usize,
    /// Uniqueness percentage of the round.
    pub percent: UniquePercent,
    /// Worker count.
    pub threads: usize,
    /// Candidate name.
    pub candidate: String,
    /// Phase.
    pub phase: Phase,
    /// Wall clock of the phase: first worker start to last worker finish.
    pub duration: Duration,
    /// Operations performed across all workers.
    pub operations: u64,
    /// Per-worker durations, in thread order.
    pub thread_durations: Vec<Duration>,
}

impl TimingSample {
    /// Operations per second over the wall clock. `None` for a zero-length phase.
    #[must_use]
    pub fn ops_per_sec(&self) -> Option<f64> {
        let secs = self.duration.as_secs_f64();
        (secs > 0.0).then(|| self.operations as f64 / secs)
    }

    /// Millions of operations per second.
    #[must_use]
    pub fn mops(&self) -> Option<f64> {
        self.ops_per_sec().map(|ops| ops / 1e6)
    }

    /// Average nanoseconds per operation over the wall clock.
    #[must_use]
    pub fn ns_per_op(&self) -> Option<f64> {
        (self.operations > 0).then(|| self.duration.as_nanos() as f64 / self.operations as f64)
    }

    /// Slowest worker's duration.
    #[must_use]
    pub fn slowest_thread(&self) -> Option<Duration> {
        self.thread_durations.iter().max().copied()
    }

    /// Fastest worker's duration.
    #[must_use]
    pub fn fastest_thread(&self) -> Option<Duration> {
        self.thread_durations.iter().min().copied()
    }
}

/// Accumulates samples and report metadata for one run.
#[derive(Debug, Clone)]
pub struct StatisticsCollector {
    name: String,
    title: String,
    run_info: Vec<(String, String)>,
    round_titles: BTreeMap<usize, String>,
    samples: Vec<TimingSample>,
}

impl StatisticsCollector {
    /// Empty collector. `name` becomes the stem of report files.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: DEFAULT_TITLE.to_string(),
            run_info: Vec::new(),
            round_titles: BTreeMap::new(),
            samples: Vec::new(),
        }
    }

    /// Report file stem.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Report title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replace the report title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Set a `key: value` line of run information. Setting a key again replaces it.
    pub fn set_run_info(&mut self, key: impl Into<String>, value: impl Display) {
        let key = key.into();
        let value = value.to_string();
        match self.run_info.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.run_info.push((key, value)),
        }
    }

    /// Run information, in insertion order.
    #[must_use]
    pub fn run_info(&self) -> &[(String, String)] {
        &self.run_info
    }

    /// Label round `round` in reports.
    pub fn set_round_title(&mut self, round: usize, title: impl Into<String>) {
        self.round_titles.insert(round, title.into());
    }

    /// Label of `round`, or `round N` if none was set.
    #[must_use]
    pub fn round_title(&self, round: usize) -> String {
        self.round_titles
            .get(&round)
            .cloned()
            .unwrap_or_else(|| format!("round {round}"))
    }

    /// Store a sample.
    pub fn record(&mut self, sample: TimingSample) {
        self.samples.push(sample);
    }

    /// Store one sample per phase of an execution.
    pub fn record_run(
        &mut self,
        round: usize,
        percent: UniquePercent,
        candidate: &str,
        timings: &RunTimings,
    ) {
        for phase in &timings.phases {
            self.record(TimingSample {
                round,
                percent,
                threads: timings.threads,
                candidate: candidate.to_string(),
                phase: phase.phase,
                duration: phase.wall_clock(),
                operations: timings.operations as u64,
                thread_durations: phase.durations(),
            });
        }
    }

    /// Samples in recording order.
    #[must_use]
    pub fn samples(&self) -> &[TimingSample] {
        &self.samples
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop every sample and round title. Title and run info are kept.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.round_titles.clear();
    }

    /// Samples grouped by round, then thread count. Ties keep recording order.
    #[must_use]
    pub fn rows(&self) -> Vec<&TimingSample> {
        let mut rows: Vec<_> = self.samples.iter().collect();
        rows.sort_by_key(|s| (s.round, s.threads));
        rows
    }

    /// Distinct round indices, ascending.
    #[must_use]
    pub fn rounds(&self) -> Vec<usize> {
        let mut rounds: Vec<_> = self.samples.iter().map(|s| s.round).collect();
        rounds.sort_unstable();
        rounds.dedup();
        rounds
    }

    /// Render the collected samples in `format`.
    ///
    /// # Errors
    ///
    /// [`crate::BenchError::Serialize`] if JSON serialization fails.
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        report::render(self, format)
    }

    /// Write one file per format into `dir` and return their paths.
    ///
    /// # Errors
    ///
    /// [`crate::BenchError::Report`] on I/O failure.
    pub fn report(&self, formats: &[ReportFormat], dir: &Path) -> Result<Vec<PathBuf>> {
        report::write_all(self, formats, dir)
    }
}
