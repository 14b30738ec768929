//! Global allocator selection.
//!
//! Fill throughput at high thread counts is dominated by allocation inside the candidate
//! maps. The system allocator serializes enough of that work to flatten every curve, so
//! the `mimalloc` feature (on by default) installs a thread-scalable allocator for every
//! binary, test and bench linked against this crate.
//!
//! ```bash
//! # Default build: mimalloc installed
//! cargo run --release
//!
//! # System allocator; the harness refuses to time anything
//! cargo run --release --no-default-features --features tracing
//! ```

use std::fmt;

use crate::error::{BenchError, Result};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Which global allocator this build installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocatorKind {
    /// `mimalloc`, thread-scalable.
    MiMalloc,
    /// Whatever the platform provides.
    System,
}

impl AllocatorKind {
    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MiMalloc => "mimalloc",
            Self::System => "system",
        }
    }

    /// `true` if allocation scales with thread count.
    #[must_use]
    pub const fn is_scalable(self) -> bool {
        matches!(self, Self::MiMalloc)
    }
}

impl fmt::Display for AllocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The allocator installed in this build.
#[must_use]
pub const fn active() -> AllocatorKind {
    if cfg!(feature = "mimalloc") {
        AllocatorKind::MiMalloc
    } else {
        AllocatorKind::System
    }
}

/// Refuse to benchmark without a thread-scalable allocator.
///
/// # Errors
///
/// [`BenchError::AllocatorMismatch`] when the build was made without the `mimalloc`
/// feature.
pub fn ensure_scalable() -> Result<()> {
    check(active())
}

fn check(kind: AllocatorKind) -> Result<()> {
    if kind.is_scalable() {
        Ok(())
    } else {
        Err(BenchError::AllocatorMismatch {
            expected: AllocatorKind::MiMalloc.name(),
            found: kind.name(),
        })
    }
}
