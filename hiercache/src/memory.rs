use std::sync::atomic::{AtomicU64, Ordering};
use crate::device::MemorySystemDevice;
use crate::error::DeviceError;

/// Terminal device standing in for main memory. It only counts what reaches it
#[derive(Debug, Default)]
pub struct MainMemory {
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MainMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn accesses(&self) -> u64 {
        self.reads() + self.writes()
    }

    pub fn clear(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
    }
}

impl MemorySystemDevice for MainMemory {
    fn access(&self, _address: u64, is_write: bool) -> Result<(), DeviceError> {
        let counter = if is_write { &self.writes } else { &self.reads };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    // Memory holds no copies, nothing to drop
    fn invalidate(&self, _address: u64) -> Result<(), DeviceError> {
        Ok(())
    }
}
