//! Construction parameters for the hash containers.

use crate::error::ConfigError;
use crate::primes;

/// How a full table picks the capacity it asks `resize` for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrowthPolicy {
    /// Ask for one more entry; the prime rounding does the real growth.
    Increment,
    /// Ask for `capacity * factor` entries. Factors `<= 1.0` act like
    /// `Increment`.
    Factor(f64),
}

impl GrowthPolicy {
    /// Capacity to request from a table of `capacity` slots that is full.
    pub fn request(self, capacity: usize) -> usize {
        match self {
            GrowthPolicy::Factor(f) if f.is_finite() && f > 1.0 => {
                let next = (capacity as f64 * f).ceil();
                if next >= usize::MAX as f64 {
                    usize::MAX
                } else {
                    (next as usize).max(capacity.saturating_add(1))
                }
            }
            _ => capacity.saturating_add(1),
        }
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        GrowthPolicy::Increment
    }
}

/// Capacity, load factor and growth policy of a hash container.
///
/// ```
/// use primehash::{GrowthPolicy, TableConfig};
///
/// let cfg = TableConfig::new(1000).load(0.8).growth(GrowthPolicy::Factor(2.0));
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    pub capacity: usize,
    pub load: f64,
    pub growth: GrowthPolicy,
}

impl TableConfig {
    pub const DEFAULT_CAPACITY: usize = 32;
    pub const DEFAULT_LOAD: f64 = 0.75;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn load(mut self, load: f64) -> Self {
        self.load = load;
        self
    }

    pub fn growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Checks the parameters for an open-addressing table, where the load
    /// factor must lie in `(0, 1)`.
    pub fn validate(&self) -> Result<usize, ConfigError> {
        if !(self.load > 0.0 && self.load < 1.0) {
            return Err(ConfigError::InvalidLoad(self.load));
        }
        primes::table_capacity(self.capacity, self.load)
    }

    /// Checks the parameters for a chained table, where buckets hold any
    /// number of nodes and the load factor may exceed 1.
    pub fn validate_chained(&self) -> Result<usize, ConfigError> {
        if !(self.load > 0.0 && self.load.is_finite()) {
            return Err(ConfigError::InvalidLoad(self.load));
        }
        primes::table_capacity(self.capacity, self.load)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            load: Self::DEFAULT_LOAD,
            growth: GrowthPolicy::Increment,
        }
    }
}
