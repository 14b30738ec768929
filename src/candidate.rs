//! Candidate maps ("boxes") and the registry they are selected from.
//!
//! A candidate is any concurrent map that can take inserts from many threads at once
//! and answer lookups from many threads at once. The harness never relies on a
//! candidate supporting inserts and lookups concurrently with each other. The phase
//! barrier separates them.
//!
//! ```rust
//! use mapfill::candidate::Registry;
//!
//! let registry = Registry::with_builtin();
//! let table = registry.get("DashMap").unwrap().build(16).unwrap();
//!
//! table.insert(7, 0);
//! table.insert(7, 1);
//! assert_eq!(table.count(7), 1);
//! assert_eq!(table.len(), 1);
//! ```

mod dashmap_box;
mod locked_box;
mod papaya_box;
mod scc_box;
mod skipmap_box;

use std::fmt;

use crate::error::{BenchError, Result};
use crate::keys::Key;

pub use self::dashmap_box::DashMapBox;
pub use self::locked_box::RwLockStdBox;
pub use self::papaya_box::PapayaBox;
pub use self::scc_box::SccHashMapBox;
pub use self::skipmap_box::SkipMapBox;

/// Value stored next to every key: the index of the inserting thread.
pub type Value = usize;

/// Initial capacity hint per worker thread.
pub const CAPACITY_PER_THREAD: usize = 16;

/// Capability set the workload needs from a concurrent map.
pub trait Candidate: Send + Sync {
    /// Insert `key`. Duplicate keys are expected. Whether the value is replaced or
    /// kept is up to the map.
    fn insert(&self, key: Key, value: Value);

    /// Number of entries stored under `key` (0 or 1 for a map).
    fn count(&self, key: Key) -> usize;

    /// Number of distinct keys stored.
    fn len(&self) -> usize;

    /// `true` if nothing has been inserted.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display name used in reports.
    fn name(&self) -> &str;
}

/// Builds a fresh, empty candidate for a capacity hint.
pub type CandidateFactory = fn(capacity_hint: usize) -> Result<Box<dyn Candidate>>;

/// A named factory.
#[derive(Clone, Copy)]
pub struct CandidateEntry {
    name: &'static str,
    factory: CandidateFactory,
}

impl CandidateEntry {
    /// Registered name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Construct a fresh candidate.
    ///
    /// # Errors
    ///
    /// Whatever the factory reports, typically [`BenchError::CandidateConstruction`].
    pub fn build(&self, capacity_hint: usize) -> Result<Box<dyn Candidate>> {
        (self.factory)(capacity_hint)
    }
}

impl fmt::Debug for CandidateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Candidates in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<CandidateEntry>,
}

impl Registry {
    /// Empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry holding every built-in candidate.
    #[must_use]
    pub fn with_builtin() -> Self {
        Self {
            entries: builtin()
                .into_iter()
                .map(|(name, factory)| CandidateEntry { name, factory })
                .collect(),
        }
    }

    /// Add a candidate.
    ///
    /// # Errors
    ///
    /// [`BenchError::DuplicateCandidate`] if `name` is taken.
    pub fn register(&mut self, name: &'static str, factory: CandidateFactory) -> Result<()> {
        if self.get(name).is_some() {
            return Err(BenchError::DuplicateCandidate(name.to_string()));
        }
        self.entries.push(CandidateEntry { name, factory });
        Ok(())
    }

    /// Builder form of [`Registry::register`].
    ///
    /// # Errors
    ///
    /// See [`Registry::register`].
    pub fn with(mut self, name: &'static str, factory: CandidateFactory) -> Result<Self> {
        self.register(name, factory)?;
        Ok(self)
    }

    /// Look a candidate up by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CandidateEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Registered names, in order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    /// All entries, in order.
    #[must_use]
    pub fn entries(&self) -> &[CandidateEntry] {
        &self.entries
    }

    /// Number of registered candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a selection. An empty selection means every registered candidate.
    /// The result follows registration order, not selection order.
    ///
    /// # Errors
    ///
    /// [`BenchError::UnknownCandidate`] for the first name that does not resolve, and
    /// [`BenchError::NoCandidates`] if the registry is empty.
    pub fn select(&self, names: &[String]) -> Result<Vec<CandidateEntry>> {
        if let Some(unknown) = names.iter().find(|name| self.get(name).is_none()) {
            return Err(BenchError::UnknownCandidate(unknown.clone()));
        }

        let selected: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| {
                names.is_empty() || names.iter().any(|n| entry.name.eq_ignore_ascii_case(n))
            })
            .copied()
            .collect();

        if selected.is_empty() {
            return Err(BenchError::NoCandidates);
        }
        Ok(selected)
    }
}

/// Built-in candidates: hash-based maps first, then the ordered and lock-based baselines.
#[must_use]
pub fn builtin() -> [(&'static str, CandidateFactory); 5] {
    [
        (DashMapBox::NAME, DashMapBox::factory),
        (SccHashMapBox::NAME, SccHashMapBox::factory),
        (PapayaBox::NAME, PapayaBox::factory),
        (SkipMapBox::NAME, SkipMapBox::factory),
        (RwLockStdBox::NAME, RwLockStdBox::factory),
    ]
}

/// Capacity hint for a thread count.
///
/// # Errors
///
/// [`BenchError::CandidateConstruction`] if the hint overflows.
pub fn capacity_hint(candidate: &str, threads: usize) -> Result<usize> {
    threads
        .checked_mul(CAPACITY_PER_THREAD)
        .ok_or_else(|| BenchError::CandidateConstruction {
            candidate: candidate.to_string(),
            capacity: usize::MAX,
            reason: format!("{threads} threads x {CAPACITY_PER_THREAD} overflows"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn builtin_names_are_unique() {
        let registry = Registry::with_builtin();
        assert_eq!(registry.len(), builtin().len());

        // Registering them one by one must also succeed.
        let mut checked = Registry::new();
        for (name, factory) in builtin() {
            checked.register(name, factory).unwrap();
            assert_eq!(registry.get(&name.to_lowercase()).map(CandidateEntry::name), Some(name));
        }
        assert_eq!(checked.names().collect::<Vec<_>>(), registry.names().collect::<Vec<_>>());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let result = Registry::new()
            .with("DashMap", DashMapBox::factory)
            .and_then(|r| r.with("dashmap", DashMapBox::factory));
        assert!(matches!(result, Err(BenchError::DuplicateCandidate(_))));
    }

    #[test]
    fn select_keeps_registration_order() {
        let registry = Registry::with_builtin();
        let picked = registry
            .select(&["RwLockStd".to_string(), "dashmap".to_string()])
            .unwrap();
        let names: Vec<_> = picked.iter().map(CandidateEntry::name).collect();
        assert_eq!(names, ["DashMap", "RwLockStd"]);
    }

    #[test]
    fn select_rejects_unknown() {
        let registry = Registry::with_builtin();
        assert!(matches!(
            registry.select(&["BTreeMap".to_string()]),
            Err(BenchError::UnknownCandidate(name)) if name == "BTreeMap"
        ));
        assert!(matches!(
            Registry::new().select(&[]),
            Err(BenchError::NoCandidates)
        ));
    }

    #[test]
    fn capacity_hint_overflow_is_an_error() {
        assert_eq!(capacity_hint("x", 4).unwrap(), 64);
        assert!(matches!(
            capacity_hint("x", usize::MAX),
            Err(BenchError::CandidateConstruction { .. })
        ));
    }

    /// Every built-in box collapses duplicates and reports `count == 1`.
    #[test]
    fn builtin_boxes_collapse_duplicates() {
        for entry in Registry::with_builtin().entries() {
            let table = entry.build(16).unwrap();
            assert!(table.is_empty(), "{}", entry.name());
            assert_eq!(table.name(), entry.name());

            for t in 0..3 {
                for key in 0..100 {
                    table.insert(key, t);
                }
            }

            assert_eq!(table.len(), 100, "{}", entry.name());
            assert!((0..100).all(|k| table.count(k) == 1), "{}", entry.name());
            assert_eq!(table.count(100), 0, "{}", entry.name());
        }
    }

    #[test]
    fn builtin_boxes_accept_concurrent_inserts() {
        const THREADS: usize = 4;
        const PER_THREAD: u64 = 2_000;

        for entry in Registry::with_builtin().entries() {
            let table: Arc<dyn Candidate> = Arc::from(entry.build(THREADS * 16).unwrap());

            let handles: Vec<_> = (0..THREADS)
                .map(|t| {
                    let table = Arc::clone(&table);
                    thread::spawn(move || {
                        // Overlapping halves so every key is inserted by two threads.
                        let base = (t as u64 / 2) * PER_THREAD;
                        for key in base..base + PER_THREAD {
                            table.insert(key, t);
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }

            assert_eq!(table.len(), 2 * PER_THREAD as usize, "{}", entry.name());
        }
    }
}
