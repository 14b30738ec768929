//! `papaya::HashMap`: lock-free reads, incremental resizing.

use papaya::HashMap;

use super::{Candidate, Value};
use crate::error::Result;
use crate::keys::Key;

/// Lock-free hash map. Every call pins its own guard.
pub struct PapayaBox {
    map: HashMap<Key, Value>,
}

impl PapayaBox {
    /// Registry name.
    pub const NAME: &'static str = "Papaya";

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

impl Candidate for PapayaBox {
    #[inline]
    fn insert(&self, key: Key, value: Value) {
        let _ = self.map.pin().try_insert(key, value);
    }

    #[inline]
    fn count(&self, key: Key) -> usize {
        usize::from(self.map.pin().contains_key(&key))
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
