//! Property-based tests for the key generator.
//!
//! These tests verify invariants that should hold for every percentage, capacity and seed.

use mapfill::keys::MAX_BOUNDED_PERCENT;
use mapfill::{BenchError, FillTester, KeyStream, RoundDescriptor, UniquePercent};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

// ============================================================================
//  Strategies
// ============================================================================

/// Percentages that bound the key range.
fn bounded_percent() -> impl Strategy<Value = UniquePercent> {
    (1..=MAX_BOUNDED_PERCENT).prop_map(|p| UniquePercent::new(p).unwrap())
}

/// Any accepted percentage.
fn any_percent() -> impl Strategy<Value = UniquePercent> {
    prop_oneof![bounded_percent(), Just(UniquePercent::ALL_UNIQUE)]
}

fn stream(percent: UniquePercent, capacity: usize, seed: u64) -> KeyStream {
    KeyStream::for_round(percent, capacity, &mut StdRng::seed_from_u64(seed)).unwrap()
}

// ============================================================================
//  Generator properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Keys of a bounded round never leave `[0, capacity)`.
    #[test]
    fn bounded_keys_stay_in_range(
        percent in bounded_percent(),
        capacity in 1usize..2_000,
        seed in any::<u64>(),
    ) {
        let keys = stream(percent, capacity, seed);
        prop_assert!(keys.iter().all(|&k| k < capacity as u64));
        prop_assert!(keys.distinct() <= capacity);
    }

    /// The stream holds exactly `capacity * 100 / percent` keys.
    #[test]
    fn input_size_follows_percent(
        percent in any_percent(),
        capacity in 1usize..2_000,
        seed in any::<u64>(),
    ) {
        let keys = stream(percent, capacity, seed);
        prop_assert_eq!(keys.len(), capacity * 100 / percent.get() as usize);
        prop_assert_eq!(keys.round().input_size, keys.len());
        prop_assert_eq!(keys.round().capacity, capacity);
    }

    /// Same seed, same stream.
    #[test]
    fn generation_is_deterministic(
        percent in any_percent(),
        capacity in 1usize..1_000,
        seed in any::<u64>(),
    ) {
        prop_assert_eq!(stream(percent, capacity, seed), stream(percent, capacity, seed));
    }

    /// Percentages between the bounded set and 100 are refused.
    #[test]
    fn unsupported_percents_are_rejected(raw in (MAX_BOUNDED_PERCENT + 1)..100u32) {
        prop_assert!(matches!(UniquePercent::new(raw), Err(BenchError::InvalidPercent(p)) if p == raw));
    }

    /// Partitions cover `threads * n_items` keys without overlap.
    #[test]
    fn partitions_tile_the_stream(
        percent in any_percent(),
        capacity in 1usize..500,
        threads in 1usize..16,
    ) {
        let keys = stream(percent, capacity, 10101);
        let table = mapfill::candidate::SkipMapBox::new();
        let tester = FillTester::new(&keys, &table, threads).unwrap();

        let mut next = 0;
        for t in 0..threads {
            let range = tester.partition(t);
            prop_assert_eq!(range.start, next);
            prop_assert_eq!(range.len(), tester.n_items());
            next = range.end;
        }
        prop_assert_eq!(next, tester.operations());
        prop_assert!(tester.dropped() < threads);
    }
}

#[test]
fn capacity_overflow_is_reported() {
    assert!(matches!(
        RoundDescriptor::new(UniquePercent::ALL_UNIQUE, usize::MAX),
        Err(BenchError::CapacityOverflow(usize::MAX))
    ));
}
