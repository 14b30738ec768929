//! `crossbeam_skiplist::SkipMap`: ordered, lock-free, epoch-reclaimed.

use crossbeam_skiplist::SkipMap;

use super::{Candidate, Value};
use crate::error::Result;
use crate::keys::Key;

/// Lock-free skip list. Ordered, so it pays for ordering the hash maps skip.
pub struct SkipMapBox {
    map: SkipMap<Key, Value>,
}

impl SkipMapBox {
    /// Registry name.
    pub const NAME: &'static str = "SkipMap";

    /// Empty skip list. Skip lists have no capacity to pre-size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: SkipMap::new(),
        }
    }

    /// Boxed constructor for the registry.
    ///
    /// # Errors
    ///
    /// Never. The signature matches [`super::CandidateFactory`].
    pub fn factory(_capacity_hint: usize) -> Result<Box<dyn Candidate>> {
        Ok(Box::new(Self::new()))
    }
}

impl Default for SkipMapBox {
    fn default() -> Self {
        Self::new()
    }
}

impl Candidate for SkipMapBox {
    #[inline]
    fn insert(&self, key: Key, value: Value) {
        self.map.get_or_insert(key, value);
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
