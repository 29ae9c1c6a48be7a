use serde::{Deserialize, Serialize};

/// Access counters for one cache, as of the last [`clear`](crate::cache::Cache::clear)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub accesses: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.accesses.saturating_sub(self.misses)
    }

    /// Hits over accesses, 0 when nothing has been accessed
    pub fn hit_ratio(&self) -> f64 {
        if self.accesses == 0 {
            return 0.0;
        }
        self.hits() as f64 / self.accesses as f64
    }

    /// Misses over accesses, 0 when nothing has been accessed
    pub fn miss_ratio(&self) -> f64 {
        if self.accesses == 0 {
            return 0.0;
        }
        self.misses as f64 / self.accesses as f64
    }
}

/// The result for an individual cache. Can be serialised to the output format
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CacheResult {
    pub name: String,
    pub id: usize,
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
}
