//! Zero-cost logging helpers for the harness.
//!
//! With the `tracing` feature (on by default) these macros forward to the `tracing`
//! crate. Without it they expand to nothing, so timing-critical worker loops carry no
//! logging overhead in a stripped-down build.
//!
//! ```bash
//! # Harness progress and phase timings
//! RUST_LOG=mapfill=info cargo run --release -- --verbose
//!
//! # Per-execution detail (thread counts, candidates, capacity hints)
//! RUST_LOG=mapfill::orchestrator=debug,mapfill::rounds=debug cargo run --release
//!
//! # No logging machinery at all
//! cargo run --release --no-default-features --features mimalloc
//! ```
//!
//! Arguments are only evaluated when the feature is enabled. Do not put side effects
//! inside a logging call.

#![allow(unused_macros, unused_imports)]

/// Trace-level logging (most verbose). Compiles to no-op without `tracing` feature.
#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

/// Debug-level logging. Compiles to no-op without `tracing` feature.
#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

/// Info-level logging. Compiles to no-op without `tracing` feature.
#[cfg(feature = "tracing")]
macro_rules! info_log {
    ($($arg:tt)*) => {
        tracing::info!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! info_log {
    ($($arg:tt)*) => {};
}

/// Warn-level logging. Compiles to no-op without `tracing` feature.
#[cfg(feature = "tracing")]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        tracing::warn!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_log {
    ($($arg:tt)*) => {};
}

/// Error-level logging. Compiles to no-op without `tracing` feature.
#[cfg(feature = "tracing")]
macro_rules! error_log {
    ($($arg:tt)*) => {
        tracing::error!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! error_log {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_log;
pub(crate) use error_log;
pub(crate) use info_log;
pub(crate) use trace_log;
pub(crate) use warn_log;
