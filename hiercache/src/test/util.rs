use std::sync::Arc;
use parking_lot::Mutex;
use crate::cache::Cache;
use crate::device::MemorySystemDevice;
use crate::error::DeviceError;
use crate::geometry::CacheGeometry;

/// Terminal device remembering every operation it receives
#[derive(Default)]
pub struct RecordingDevice {
    pub accesses: Mutex<Vec<(u64, bool)>>,
    pub invalidations: Mutex<Vec<u64>>,
}

impl RecordingDevice {
    pub fn accesses(&self) -> Vec<(u64, bool)> {
        self.accesses.lock().clone()
    }
}

impl MemorySystemDevice for RecordingDevice {
    fn access(&self, address: u64, is_write: bool) -> Result<(), DeviceError> {
        self.accesses.lock().push((address, is_write));
        Ok(())
    }

    fn invalidate(&self, address: u64) -> Result<(), DeviceError> {
        self.invalidations.lock().push(address);
        Ok(())
    }
}

pub fn geometry(ways: usize, sets_log2: u32, line_size_log2: u32) -> CacheGeometry {
    CacheGeometry::new(ways, sets_log2, line_size_log2).unwrap()
}

pub fn cache_over(geometry: CacheGeometry, shared: bool) -> (Cache, Arc<RecordingDevice>) {
    let lower = Arc::new(RecordingDevice::default());
    (Cache::new("test", geometry, shared, lower.clone()), lower)
}

/// Accesses `address` and reports whether it hit
pub fn hit(cache: &Cache, address: u64) -> bool {
    let misses = cache.stats().misses;
    cache.access(address, false).unwrap();
    cache.stats().misses == misses
}

/// Small deterministic generator so tests don't depend on a random source
pub fn addresses(seed: u64, count: usize, span: u64) -> Vec<u64> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 16) % span
        })
        .collect()
}
