//! Candidate benchmarks: fill and lookup throughput per built-in map.
//!
//! Each iteration runs the same insert/find workload the harness times, through the
//! same orchestrator, on a fresh table. Useful for comparing one candidate across
//! thread counts without a full `mapfill` sweep.
//!
//! ```bash
//! cargo bench --bench candidates
//! cargo bench --bench candidates -- fill_10pct
//! ```

#![allow(clippy::unwrap_used)]

use divan::counter::ItemsCount;
use divan::{Bencher, black_box};
use mapfill::candidate::{self, Registry};
use mapfill::{Candidate, FillTester, KeyStream, Phase, UniquePercent, orchestrator};
use rand::SeedableRng;
use rand::rngs::StdRng;

const CAPACITY: usize = 50_000;
const THREADS: [usize; 5] = [1, 2, 4, 8, 16];

fn main() {
    divan::main();
}

// =============================================================================
// Setup Helpers
// =============================================================================

fn keys(percent: u32) -> KeyStream {
    KeyStream::for_round(
        UniquePercent::new(percent).unwrap(),
        CAPACITY,
        &mut StdRng::seed_from_u64(mapfill::config::DEFAULT_SEED),
    )
    .unwrap()
}

fn build(name: &str, threads: usize) -> Box<dyn Candidate> {
    let registry = Registry::with_builtin();
    let hint = candidate::capacity_hint(name, threads).unwrap();
    registry.get(name).unwrap().build(hint).unwrap()
}

/// Insert phase only, fresh table per iteration.
fn bench_fill(bencher: Bencher, name: &str, keys: &KeyStream, threads: usize) {
    let operations = keys.len() / threads * threads;

    bencher
        .counter(ItemsCount::new(operations))
        .with_inputs(|| build(name, threads))
        .bench_local_values(|table| {
            let tester = FillTester::new(keys, &*table, threads).unwrap();
            black_box(orchestrator::run(&tester, &[Phase::Insert]).unwrap());
            table
        });
}

/// Find phase only, over a table filled once up front.
fn bench_find(bencher: Bencher, name: &str, keys: &KeyStream, threads: usize) {
    let table = build(name, threads);
    let tester = FillTester::new(keys, &*table, threads).unwrap();
    orchestrator::run(&tester, &[Phase::Insert]).unwrap();

    bencher
        .counter(ItemsCount::new(tester.operations()))
        .bench_local(|| black_box(orchestrator::run(&tester, &[Phase::Find]).unwrap()));
}

// =============================================================================
// 01: FILL - 10% unique (heavy duplicate pressure)
// =============================================================================

#[divan::bench_group(name = "01_fill_10pct", sample_count = 20)]
mod fill_10pct {
    use super::{Bencher, THREADS, bench_fill, keys};

    #[divan::bench(args = THREADS)]
    fn dashmap(bencher: Bencher, threads: usize) {
        bench_fill(bencher, "DashMap", &keys(10), threads);
    }

    #[divan::bench(args = THREADS)]
    fn scc(bencher: Bencher, threads: usize) {
        bench_fill(bencher, "SccHashMap", &keys(10), threads);
    }

    #[divan::bench(args = THREADS)]
    fn papaya(bencher: Bencher, threads: usize) {
        bench_fill(bencher, "Papaya", &keys(10), threads);
    }

    #[divan::bench(args = THREADS)]
    fn skipmap(bencher: Bencher, threads: usize) {
        bench_fill(bencher, "SkipMap", &keys(10), threads);
    }

    #[divan::bench(args = THREADS)]
    fn rwlock_std(bencher: Bencher, threads: usize) {
        bench_fill(bencher, "RwLockStd", &keys(10), threads);
    }
}

// =============================================================================
// 02: FILL - 100% unique (every insert grows the table)
// =============================================================================

#[divan::bench_group(name = "02_fill_unique", sample_count = 20)]
mod fill_unique {
    use super::{Bencher, THREADS, bench_fill, keys};

    #[divan::bench(args = THREADS)]
    fn dashmap(bencher: Bencher, threads: usize) {
        bench_fill(bencher, "DashMap", &keys(100), threads);
    }

    #[divan::bench(args = THREADS)]
    fn scc(bencher: Bencher, threads: usize) {
        bench_fill(bencher, "SccHashMap", &keys(100), threads);
    }

    #[divan::bench(args = THREADS)]
    fn papaya(bencher: Bencher, threads: usize) {
        bench_fill(bencher, "Papaya", &keys(100), threads);
    }

    #[divan::bench(args = THREADS)]
    fn skipmap(bencher: Bencher, threads: usize) {
        bench_fill(bencher, "SkipMap", &keys(100), threads);
    }

    #[divan::bench(args = THREADS)]
    fn rwlock_std(bencher: Bencher, threads: usize) {
        bench_fill(bencher, "RwLockStd", &keys(100), threads);
    }
}

// =============================================================================
// 03: FIND - 10% unique, prefilled
// =============================================================================

#[divan::bench_group(name = "03_find_10pct", sample_count = 20)]
mod find_10pct {
    use super::{Bencher, THREADS, bench_find, keys};

    #[divan::bench(args = THREADS)]
    fn dashmap(bencher: Bencher, threads: usize) {
        bench_find(bencher, "DashMap", &keys(10), threads);
    }

    #[divan::bench(args = THREADS)]
    fn scc(bencher: Bencher, threads: usize) {
        bench_find(bencher, "SccHashMap", &keys(10), threads);
    }

    #[divan::bench(args = THREADS)]
    fn papaya(bencher: Bencher, threads: usize) {
        bench_find(bencher, "Papaya", &keys(10), threads);
    }

    #[divan::bench(args = THREADS)]
    fn skipmap(bencher: Bencher, threads: usize) {
        bench_find(bencher, "SkipMap", &keys(10), threads);
    }

    #[divan::bench(args = THREADS)]
    fn rwlock_std(bencher: Bencher, threads: usize) {
        bench_find(bencher, "RwLockStd", &keys(10), threads);
    }
}
