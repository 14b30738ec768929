//! Single `parking_lot::RwLock` around a std `HashMap`.
//!
//! The baseline every sharded or lock-free map should beat once more than one thread
//! writes.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use parking_lot::RwLock;

use super::{Candidate, Value};
use crate::error::{BenchError, Result};
use crate::keys::Key;

/// Globally locked hash map.
pub struct RwLockStdBox {
    map: RwLock<HashMap<Key, Value>>,
}

impl RwLockStdBox {
    /// Registry name.
    pub const NAME: &'static str = "RwLockStd";

    /// Empty map with room for `capacity_hint` entries.
    ///
    /// # Errors
    ///
    /// [`BenchError::CandidateConstruction`] if the reservation fails.
    pub fn try_with_capacity(capacity_hint: usize) -> Result<Self> {
        let mut map = HashMap::new();
        map.try_reserve(capacity_hint)
            .map_err(|e| BenchError::CandidateConstruction {
                candidate: Self::NAME.to_string(),
                capacity: capacity_hint,
                reason: e.to_string(),
            })?;

        Ok(Self {
            map: RwLock::new(map),
        })
    }

    /// Boxed constructor for the registry.
    ///
    /// # Errors
    ///
    /// See [`RwLockStdBox::try_with_capacity`].
    pub fn factory(capacity_hint: usize) -> Result<Box<dyn Candidate>> {
        Ok(Box::new(Self::try_with_capacity(capacity_hint)?))
    }
}

impl Candidate for RwLockStdBox {
    #[inline]
    fn insert(&self, key: Key, value: Value) {
        if let Entry::Vacant(slot) = self.map.write().entry(key) {
            slot.insert(value);
        }
    }

    #[inline]
    fn count(&self, key: Key) -> usize {
        usize::from(self.map.read().contains_key(&key))
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
