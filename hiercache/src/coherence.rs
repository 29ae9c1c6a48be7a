use crate::cache::Line;

/// Hooks a cache calls while servicing accesses, so a coherence protocol can be attached without
/// changing the cache itself
///
/// Every method has a default which does nothing. `id` is the index of the calling cache within
/// its group, and addresses are always line aligned.
///
/// The call sequence for an access is `lock_addr`, then either `on_hit` or `on_miss` followed by
/// `on_evict`/`remove_addr` for a displaced valid line and `add_addr` for the new one, then
/// `unlock_addr`. An invalidation calls `remove_addr` when a line was actually dropped. The cache
/// holds the lock of the affected set for the whole sequence
pub trait CoherenceProtocol: Send + Sync {
    fn lock_addr(&self, _address: u64) {}

    fn unlock_addr(&self, _address: u64) {}

    /// A line for `address` was installed in cache `id`
    fn add_addr(&self, _address: u64, _id: usize) {}

    /// Cache `id` no longer holds a line for `address`
    fn remove_addr(&self, _address: u64, _id: usize) {}

    /// Cache `id` hit on `line`. The line may be modified, e.g. to drop it on a remote write
    fn on_hit(&self, _id: usize, _address: u64, _line: &mut Line, _is_write: bool) {}

    /// Cache `id` missed, called before the lower level is consulted
    fn on_miss(&self, _id: usize, _address: u64, _is_write: bool) {}

    /// Cache `id` evicted its valid line for `address` to make room
    fn on_evict(&self, _id: usize, _address: u64) {}
}

/// Protocol for levels below the point where coherence matters. Takes no action
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProtocol;

impl CoherenceProtocol for NullProtocol {}

/// Directory based MOESI protocol
///
/// Reserved extension point, currently behaves exactly like [`NullProtocol`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryMoesi;

impl CoherenceProtocol for DirectoryMoesi {}
