//! `dashmap::DashMap`: sharded `RwLock`s over hashbrown tables.

use dashmap::DashMap;

use super::{Candidate, Value};
use crate::error::Result;
use crate::keys::Key;

/// Sharded hash map.
pub struct DashMapBox {
    map: DashMap<Key, Value>,
}

impl DashMapBox {
    /// Registry name.
    pub const NAME: &'static str = "DashMap";

    /// Empty map pre-sized for `capacity_hint` entries.
    #[must_use]
    pub fn with_capacity(capacity_hint: usize) -> Self {
        Self {
            map: DashMap::with_capacity(capacity_hint),
        }
    }

    /// Boxed constructor for the registry.
    ///
    /// # Errors
    ///
    /// Never. The signature matches [`super::CandidateFactory`].
    pub fn factory(capacity_hint: usize) -> Result<Box<dyn Candidate>> {
        Ok(Box::new(Self::with_capacity(capacity_hint)))
    }
}

impl Candidate for DashMapBox {
    #[inline]
    fn insert(&self, key: Key, value: Value) {
        // Keep the first writer, like an insert-if-absent table.
        self.map.entry(key).or_insert(value);
    }

    #[inline]
    fn count(&self, key: Key) -> usize {
        usize::from(self.map.contains_key(&key))
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
