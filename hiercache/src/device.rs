use std::sync::Arc;
use crate::error::DeviceError;

/// Every level in the memory hierarchy is one of these
///
/// Devices are shared between threads and between the levels above them, so both operations take
/// `&self` and implementations manage their own synchronisation
pub trait MemorySystemDevice: Send + Sync {
    /// Reads or writes the line at `address`
    fn access(&self, address: u64, is_write: bool) -> Result<(), DeviceError>;

    /// Drops any copy of the line at `address` held by this device, without forwarding further
    fn invalidate(&self, address: u64) -> Result<(), DeviceError>;
}

/// A parallel set of devices, one per peer of the level above
pub trait MemorySystemDeviceSet {
    fn device(&self, index: usize) -> Option<Arc<dyn MemorySystemDevice>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
