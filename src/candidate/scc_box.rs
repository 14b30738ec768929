//! `scc::HashMap`: lock-free resizing hash map with bucket-level locking.

use scc::HashMap;

use super::{Candidate, Value};
use crate::error::Result;
use crate::keys::Key;

/// Scalable concurrent hash map.
pub struct SccHashMapBox {
    map: HashMap<Key, Value>,
}

impl SccHashMapBox {
    /// Registry name.
    pub const NAME: &'static str = "SccHashMap";

    /// Empty map pre-sized for `capacity_hint` entries.
    #[must_use]
    pub fn with_capacity(capacity_hint: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity_hint),
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

impl Candidate for SccHashMapBox {
    #[inline]
    fn insert(&self, key: Key, value: Value) {
        // `Err` hands back the pair when the key already exists.
        let _ = self.map.insert(key, value);
    }

    #[inline]
    fn count(&self, key: Key) -> usize {
        usize::from(self.map.contains(&key))
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
