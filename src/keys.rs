//! Key stream generation.
//!
//! A round draws `capacity * 100 / percent` keys from a seeded generator. For
//! `percent <= 30` keys are taken modulo `capacity`, so the stream holds at most
//! `capacity` distinct values and the fraction of distinct keys is roughly `percent`.
//! At exactly 100% keys span the full `u64` range and are distinct with overwhelming
//! probability.
//!
//! Percentages between 31 and 99 are rejected. With keys bounded by `capacity`, those
//! ratios would produce far fewer distinct keys than requested.

use std::fmt;
use std::ops::{Deref, Range};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Key type used by every candidate.
pub type Key = u64;

/// Highest percentage below 100 for which the distinct-key ratio holds.
pub const MAX_BOUNDED_PERCENT: u32 = 30;

/// A validated uniqueness percentage: `1..=30` or exactly `100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct UniquePercent(u32);

impl UniquePercent {
    /// Every key distinct.
    pub const ALL_UNIQUE: Self = Self(100);

    /// Validate a raw percentage.
    ///
    /// # Errors
    ///
    /// [`BenchError::InvalidPercent`] for `0`, `31..=99` and anything above `100`.
    pub fn new(percent: u32) -> Result<Self> {
        match percent {
            1..=MAX_BOUNDED_PERCENT | 100 => Ok(Self(percent)),
            _ => Err(BenchError::InvalidPercent(percent)),
        }
    }

    /// Raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// `true` when keys are drawn from the full key range.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        self.0 == 100
    }
}

impl TryFrom<u32> for UniquePercent {
    type Error = BenchError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<UniquePercent> for u32 {
    fn from(value: UniquePercent) -> Self {
        value.0
    }
}

impl fmt::Display for UniquePercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Parameters of one round, derived from the percentage and the table capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundDescriptor {
    /// Uniqueness percentage of the round.
    pub percent: UniquePercent,
    /// Target number of distinct keys in the filled table.
    pub capacity: usize,
    /// Length of the key stream.
    pub input_size: usize,
    /// Keys are drawn from `0..bound`. `None` means the full `u64` range.
    pub distinct_bound: Option<u64>,
}

impl RoundDescriptor {
    /// Derive the round parameters.
    ///
    /// # Errors
    ///
    /// [`BenchError::ZeroCapacity`] for an empty table and
    /// [`BenchError::CapacityOverflow`] when `capacity * 100` overflows.
    pub fn new(percent: UniquePercent, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(BenchError::ZeroCapacity);
        }

        let input_size = capacity
            .checked_mul(100)
            .ok_or(BenchError::CapacityOverflow(capacity))?
            / percent.get() as usize;

        let distinct_bound = if percent.is_unbounded() {
            None
        } else {
            Some(capacity as u64)
        };

        Ok(Self {
            percent,
            capacity,
            input_size,
            distinct_bound,
        })
    }
}

/// Immutable stream of keys shared read-only by every worker in a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStream {
    round: RoundDescriptor,
    keys: Box<[Key]>,
}

impl KeyStream {
    /// Draw `round.input_size` keys from `rng`.
    ///
    /// # Errors
    ///
    /// [`BenchError::KeyAllocation`] when the stream cannot be allocated.
    pub fn generate<R: Rng>(round: RoundDescriptor, rng: &mut R) -> Result<Self> {
        let mut keys: Vec<Key> = Vec::new();
        keys.try_reserve_exact(round.input_size)
            .map_err(|e| BenchError::KeyAllocation {
                percent: round.percent.get(),
                keys: round.input_size,
                reason: e.to_string(),
            })?;

        match round.distinct_bound {
            Some(bound) => keys.extend((0..round.input_size).map(|_| rng.random_range(0..bound))),
            None => keys.extend((0..round.input_size).map(|_| rng.random::<Key>())),
        }

        Ok(Self {
            round,
            keys: keys.into_boxed_slice(),
        })
    }

    /// Validate the parameters, then draw the stream.
    ///
    /// # Errors
    ///
    /// Same as [`RoundDescriptor::new`] and [`KeyStream::generate`].
    pub fn for_round<R: Rng>(
        percent: UniquePercent,
        capacity: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Self::generate(RoundDescriptor::new(percent, capacity)?, rng)
    }

    /// Parameters the stream was generated with.
    #[must_use]
    pub const fn round(&self) -> &RoundDescriptor {
        &self.round
    }

    /// Keys in `range`.
    ///
    /// # Panics
    ///
    /// If `range` is out of bounds. Partitions are derived from the stream length, so
    /// this only fires on a harness bug.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> &[Key] {
        &self.keys[range]
    }

    /// Number of distinct keys in the stream.
    #[must_use]
    pub fn distinct(&self) -> usize {
        let mut sorted = self.keys.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.len()
    }
}

impl Deref for KeyStream {
    type Target = [Key];

    fn deref(&self) -> &[Key] {
        &self.keys
    }
}
