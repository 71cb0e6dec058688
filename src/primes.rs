//! Prime capacity table and the sizing rules every hash container shares.
//!
//! Table sizes are always taken from `PRIMES` so that `hash % capacity`
//! spreads poorly mixed hashes reasonably well. A request larger than the
//! biggest tabulated prime is used as is.

use crate::error::{ConfigError, ResizeError};

// Roughly doubling primes, grouped by decade.
#[rustfmt::skip]
pub const PRIMES: [u64; 59] = [
    // < 1e3
    53, 97, 191, 383, 769,
    // < 1e4
    1531, 3067, 6143,
    // < 1e5
    12289, 24571, 49157, 98299,
    // < 1e6
    196613, 393209, 786431,
    // < 1e7
    1572869, 3145721, 6291449,
    // < 1e8
    12582917, 25165813, 50331653,
    // < 1e9
    100663291, 201326611, 402653189, 805306357,
    // < 1e10
    1610612741, 3221225473, 6442450939,
    // < 1e11
    12884901893, 25769803799, 51539607551,
    // < 1e12
    103079215111, 206158430209, 412316860441, 824633720831,
    // < 1e13
    1649267441651, 3298534883309, 6597069766657,
    // < 1e14
    13194139533299, 26388279066623, 52776558133303,
    // < 1e15
    105553116266489, 211106232532969, 422212465066001, 844424930131963,
    // < 1e16
    1688849860263953, 3377699720527861, 6755399441055731,
    // < 1e17
    13510798882111483, 27021597764222939, 54043195528445957,
    // < 1e18
    108086391056891903, 216172782113783773, 432345564227567621, 864691128455135207,
    // < 1e19
    1729382256910270481, 3458764513820540933, 6917529027641081903,
    // < 1e20
    13835058055282163729,
];

/// Smallest tabulated prime `>= required`, or `required` itself when it is
/// beyond the table (or beyond `usize` on narrow targets).
pub fn next_prime(required: usize) -> usize {
    let req = required as u64;
    let i = PRIMES.partition_point(|&p| p < req);
    match PRIMES.get(i) {
        Some(&p) => usize::try_from(p).unwrap_or(required),
        None => required,
    }
}

/// Real slot count for a table that must hold `capacity` entries at `load`.
/// `load` is assumed to be validated already.
pub fn table_capacity(capacity: usize, load: f64) -> Result<usize, ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::ZeroCapacity);
    }
    if capacity as f64 >= usize::MAX as f64 * load {
        return Err(ConfigError::CapacityOverflow { capacity, load });
    }
    Ok(next_prime((capacity as f64 / load) as usize))
}

/// `true` once `count` has reached the fill threshold of the table.
#[inline]
pub(crate) fn at_threshold(capacity: usize, load: f64, count: usize) -> bool {
    capacity as f64 * load <= count as f64
}

/// Outcome of checking a resize request against the current table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResizePlan {
    /// The current table already satisfies the request.
    Keep,
    /// Rebuild with this many slots.
    Rehash(usize),
}

/// Sizing rules for `resize(requested)`, identical across containers.
///
/// Tables never shrink: a request the current capacity already covers at
/// `load` is a no-op.
pub(crate) fn plan_resize(
    current: usize,
    requested: usize,
    count: usize,
    load: f64,
) -> Result<ResizePlan, ResizeError> {
    if current == requested || current as f64 > requested as f64 / load {
        return Ok(ResizePlan::Keep);
    }
    if requested as f64 >= usize::MAX as f64 * load {
        return Err(ResizeError::Overflow { requested });
    }
    if (next_prime(requested) as f64) < count as f64 / load {
        return Err(ResizeError::TooSmall { requested, count });
    }
    Ok(ResizePlan::Rehash(next_prime(
        (requested as f64 / load) as usize,
    )))
}
