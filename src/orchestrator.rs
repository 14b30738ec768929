//! Runs one execution of the fill workload across `N` worker threads.
//!
//! ```text
//!   spawn worker 0..N ──► start gate ──► barrier ─► insert ─► barrier ─► find ─► join
//!                          (all spawned)  (all arrived)       (all inserts done)
//! ```
//!
//! Workers are scoped threads. The key stream and the table are borrowed and never
//! reference-counted. A worker that fails or panics sets a shared flag. Every worker
//! still passes every barrier, so the run always terminates. Phases after the failure
//! do no work and the first error in thread order is returned.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{BenchError, Result};
use crate::tracing_helpers::{debug_log, error_log, trace_log};
use crate::workload::{FillTester, Phase};

// ============================================================================
//  Timings
// ============================================================================

/// When one worker ran one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadTiming {
    /// Worker index.
    pub thread: usize,
    /// Taken right after the phase barrier released.
    pub started: Instant,
    /// Taken right after the worker's last operation.
    pub finished: Instant,
}

impl ThreadTiming {
    /// Time the worker spent in the phase.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.finished.duration_since(self.started)
    }
}

/// Every worker's timing for one phase.
#[derive(Debug, Clone)]
pub struct PhaseTimings {
    /// Which phase.
    pub phase: Phase,
    /// One entry per worker, in thread order.
    pub threads: Vec<ThreadTiming>,
}

impl PhaseTimings {
    /// From the first worker starting to the last worker finishing.
    #[must_use]
    pub fn wall_clock(&self) -> Duration {
        let first = self.threads.iter().map(|t| t.started).min();
        let last = self.threads.iter().map(|t| t.finished).max();
        match (first, last) {
            (Some(first), Some(last)) => last.duration_since(first),
            _ => Duration::ZERO,
        }
    }

    /// Per-worker durations, in thread order.
    #[must_use]
    pub fn durations(&self) -> Vec<Duration> {
        self.threads.iter().map(ThreadTiming::duration).collect()
    }

    /// Latest start of any worker.
    #[must_use]
    pub fn last_start(&self) -> Option<Instant> {
        self.threads.iter().map(|t| t.started).max()
    }

    /// Earliest start of any worker.
    #[must_use]
    pub fn first_start(&self) -> Option<Instant> {
        self.threads.iter().map(|t| t.started).min()
    }

    /// Latest finish of any worker.
    #[must_use]
    pub fn last_finish(&self) -> Option<Instant> {
        self.threads.iter().map(|t| t.finished).max()
    }
}

/// Result of one execution.
#[derive(Debug, Clone)]
pub struct RunTimings {
    /// Worker count.
    pub threads: usize,
    /// Operations per phase across all workers.
    pub operations: usize,
    /// One entry per phase, in execution order.
    pub phases: Vec<PhaseTimings>,
}

impl RunTimings {
    /// Timings of `phase`, if it ran.
    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseTimings> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}

// ============================================================================
//  Start gate
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Closed,
    Open,
    Aborted,
}

/// Holds spawned workers until the whole crew exists.
///
/// `std::sync::Barrier` cannot be cancelled. Workers only reach the phase barrier
/// once every spawn has succeeded, so a failed spawn cannot strand them there.
struct StartGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl StartGate {
    const fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Closed),
            changed: Condvar::new(),
        }
    }

    /// Block until the gate opens or aborts. `true` means go.
    fn wait(&self) -> bool {
        let mut state = self.state.lock();
        while *state == GateState::Closed {
            self.changed.wait(&mut state);
        }
        *state == GateState::Open
    }

    fn set(&self, next: GateState) {
        *self.state.lock() = next;
        self.changed.notify_all();
    }
}

// ============================================================================
//  Orchestration
// ============================================================================

struct WorkerReport {
    timings: Vec<ThreadTiming>,
    error: Option<BenchError>,
}

/// Run `phases` in order on `tester.threads()` workers.
///
/// # Errors
///
/// [`BenchError::ThreadSpawn`] if a worker cannot be spawned, otherwise the first
/// worker error in thread order ([`BenchError::MissingKey`],
/// [`BenchError::WorkerPanicked`]).
pub fn run(tester: &FillTester<'_>, phases: &[Phase]) -> Result<RunTimings> {
    let threads = tester.threads();
    let gate = StartGate::new();
    let barrier = Barrier::new(threads);
    let failed = AtomicBool::new(false);

    debug_log!(
        threads,
        n_items = tester.n_items(),
        dropped = tester.dropped(),
        table = tester.table().name(),
        "spawning workers"
    );

    let (spawn_error, joined) = thread::scope(|scope| {
        let (gate, barrier, failed) = (&gate, &barrier, &failed);
        let mut handles = Vec::with_capacity(threads);
        let mut spawn_error = None;

        for t in 0..threads {
            let spawned = thread::Builder::new()
                .name(format!("mapfill-worker-{t}"))
                .spawn_scoped(scope, move || {
                    worker(t, tester, phases, gate, barrier, failed)
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    spawn_error = Some(BenchError::ThreadSpawn { thread: t, source });
                    break;
                }
            }
        }

        gate.set(if spawn_error.is_none() {
            GateState::Open
        } else {
            GateState::Aborted
        });

        let joined: Vec<_> = handles.into_iter().map(thread::ScopedJoinHandle::join).collect();
        (spawn_error, joined)
    });

    if let Some(err) = spawn_error {
        error_log!(error = %err, "worker spawn failed");
        return Err(err);
    }

    let mut per_thread = Vec::with_capacity(threads);
    let mut first_error = None;
    for (t, outcome) in joined.into_iter().enumerate() {
        match outcome {
            Ok(report) => {
                if let Some(err) = report.error {
                    first_error.get_or_insert(err);
                }
                per_thread.push(report.timings);
            }
            Err(payload) => {
                first_error.get_or_insert(BenchError::WorkerPanicked {
                    thread: t,
                    phase: None,
                    message: panic_message(payload.as_ref()),
                });
            }
        }
    }

    if let Some(err) = first_error {
        error_log!(error = %err, "execution failed");
        return Err(err);
    }

    let timings = RunTimings {
        threads,
        operations: tester.operations(),
        phases: phases
            .iter()
            .enumerate()
            .map(|(i, &phase)| PhaseTimings {
                phase,
                threads: per_thread.iter().filter_map(|t| t.get(i).copied()).collect(),
            })
            .collect(),
    };

    for phase in &timings.phases {
        debug_log!(
            phase = %phase.phase,
            threads,
            wall_clock_us = phase.wall_clock().as_micros() as u64,
            "phase complete"
        );
    }

    Ok(timings)
}

fn worker(
    t: usize,
    tester: &FillTester<'_>,
    phases: &[Phase],
    gate: &StartGate,
    barrier: &Barrier,
    failed: &AtomicBool,
) -> WorkerReport {
    let mut report = WorkerReport {
        timings: Vec::with_capacity(phases.len()),
        error: None,
    };

    if !gate.wait() {
        return report;
    }

    for &phase in phases {
        barrier.wait();

        // The barrier orders this load after every store made in earlier phases.
        if failed.load(Ordering::Acquire) {
            continue;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            tester.on_phase_start(phase, t);
            let started = Instant::now();
            let result = tester.run_phase(phase, t);
            (started, Instant::now(), result)
        }));

        let error = match outcome {
            Ok((started, finished, result)) => {
                report.timings.push(ThreadTiming {
                    thread: t,
                    started,
                    finished,
                });
                result.err()
            }
            Err(payload) => Some(BenchError::WorkerPanicked {
                thread: t,
                phase: Some(phase),
                message: panic_message(payload.as_ref()),
            }),
        };

        if let Some(err) = error {
            trace_log!(thread = t, phase = %phase, "worker failed");
            failed.store(true, Ordering::Release);
            report.error = Some(err);
        }
    }

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Candidate, SccHashMapBox};
    use crate::keys::{KeyStream, UniquePercent};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn stream(percent: u32, capacity: usize) -> KeyStream {
        KeyStream::for_round(
            UniquePercent::new(percent).unwrap(),
            capacity,
            &mut StdRng::seed_from_u64(10101),
        )
        .unwrap()
    }

    #[test]
    fn one_timing_per_thread_and_phase() {
        let keys = stream(100, 4_000);
        let table = SccHashMapBox::with_capacity(64);
        let tester = FillTester::new(&keys, &table, 4).unwrap();

        let timings = run(&tester, &Phase::ALL).unwrap();

        assert_eq!(timings.threads, 4);
        assert_eq!(timings.operations, 4_000);
        assert_eq!(timings.phases.len(), 2);
        for phase in &timings.phases {
            let threads: Vec<_> = phase.threads.iter().map(|t| t.thread).collect();
            assert_eq!(threads, [0, 1, 2, 3]);
            assert!(phase.wall_clock() >= *phase.durations().iter().max().unwrap());
        }
        assert_eq!(table.len(), keys.distinct());
    }

    #[test]
    fn find_never_starts_before_insert_ends() {
        let keys = stream(10, 2_000);
        let table = SccHashMapBox::with_capacity(128);
        let tester = FillTester::new(&keys, &table, 8).unwrap();

        let timings = run(&tester, &Phase::ALL).unwrap();
        let insert = timings.phase(Phase::Insert).unwrap();
        let find = timings.phase(Phase::Find).unwrap();

        assert!(insert.last_finish().unwrap() <= find.first_start().unwrap());
    }

    #[test]
    fn insert_only_run() {
        let keys = stream(100, 100);
        let table = SccHashMapBox::with_capacity(16);
        let tester = FillTester::new(&keys, &table, 3).unwrap();

        let timings = run(&tester, &[Phase::Insert]).unwrap();
        assert_eq!(timings.phases.len(), 1);
        assert_eq!(table.len(), 99);
    }

    #[test]
    fn gate_abort_releases_waiters() {
        let gate = StartGate::new();
        thread::scope(|s| {
            let waiter = s.spawn(|| gate.wait());
            gate.set(GateState::Aborted);
            assert!(!waiter.join().unwrap());
        });
    }

    #[test]
    fn panic_message_extracts_strings() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
