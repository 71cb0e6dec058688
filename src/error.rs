//! Error types shared by every container.
//!
//! Failures are reported as values. No operation panics on bad input or
//! aborts on a failed allocation; the container is left exactly as it was
//! before the failing call.

use std::collections::TryReserveError;
use thiserror::Error;

/// Construction failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("initial capacity must be non-zero")]
    ZeroCapacity,

    #[error("load factor {0} is outside the accepted range")]
    InvalidLoad(f64),

    #[error("capacity {capacity} at load {load} overflows usize")]
    CapacityOverflow { capacity: usize, load: f64 },

    #[error("table allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

/// A resize request that could not be honoured. The table is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResizeError {
    #[error("requested capacity {requested} overflows usize at the current load")]
    Overflow { requested: usize },

    #[error("capacity {requested} cannot hold {count} entries at the current load")]
    TooSmall { requested: usize, count: usize },

    #[error("table allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    #[error("value already present")]
    Duplicate,

    #[error("key already present")]
    DuplicateKey,

    #[error("value already mapped to another key")]
    DuplicateValue,

    #[error("no free slot left in the table")]
    Full,

    #[error("growth before insert failed: {0}")]
    Resize(#[from] ResizeError),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    #[error("no entry for the given key or value")]
    NotFound,

    #[error("new key already mapped to another value")]
    DuplicateKey,

    #[error("new value already mapped to another key")]
    DuplicateValue,
}
