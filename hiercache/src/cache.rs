use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use log::{debug, info, trace};
use parking_lot::{Mutex, RwLock};
use crate::coherence::{CoherenceProtocol, NullProtocol};
use crate::config::CacheConfig;
use crate::device::MemorySystemDevice;
use crate::error::{ConfigError, DeviceError};
use crate::geometry::{CacheGeometry, Decomposed};
use crate::group::PeerDirectory;
use crate::replacement::ReplacementTracker;
#[cfg(test)]
use crate::replacement::Timestamp;
use crate::stats::{CacheResult, CacheStats};

/// A single line slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Line {
    tag: u64,
    valid: bool,
}

impl Line {
    #[cfg(test)]
    pub(crate) fn with_state(tag: u64, valid: bool) -> Self {
        Self { tag, valid }
    }

    pub fn tag(&self) -> u64 {
        self.tag
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

/// The lines of one set and their recency, guarded together by the set's lock
struct CacheSet {
    lines: Vec<Line>,
    replacement: ReplacementTracker,
}

impl CacheSet {
    fn new(ways: usize) -> Self {
        Self {
            lines: vec![Line::default(); ways],
            replacement: ReplacementTracker::new(ways),
        }
    }

    fn find(&self, tag: u64) -> Option<usize> {
        self.lines.iter().position(|line| line.valid && line.tag == tag)
    }

    fn reset(&mut self) {
        self.lines.iter_mut().for_each(|line| *line = Line::default());
        self.replacement.reset();
    }
}

/// A set-associative cache, private or shared, of any dimension
///
/// Every set has its own lock, so accesses to distinct sets proceed in parallel. A shared cache
/// additionally serialises every operation behind one whole-cache lock, modelling a single ported
/// structure such as a shared last level cache. The whole-cache lock is always taken before the
/// set lock.
///
/// Misses are forwarded to the lower level as an access to the line aligned address, before the
/// new line is installed. Lines are inserted in the most recently used position and the victim is
/// the first invalid way, or else the least recently used one
pub struct Cache {
    name: String,
    id: usize,
    geometry: CacheGeometry,
    // Only present for shared caches
    access_lock: Option<Mutex<()>>,
    sets: Box<[Mutex<CacheSet>]>,
    lower_level: Arc<dyn MemorySystemDevice>,
    peers: Option<Weak<PeerDirectory>>,
    protocol: Arc<dyn CoherenceProtocol>,
    accesses: AtomicU64,
    misses: AtomicU64,
    // Held exclusively while clear resets the counters, shared while stats reads them
    counters_reset: RwLock<()>,
}

impl Cache {
    /// Creates an empty cache with id 0, no peers and the [`NullProtocol`]
    ///
    /// # Arguments
    ///
    /// * `name`: Diagnostic label used in reports
    /// * `geometry`: The dimensions of the cache
    /// * `shared`: Whether a whole-cache lock serialises all operations
    /// * `lower_level`: The device misses are forwarded to
    ///
    /// returns: Cache
    pub fn new(
        name: impl Into<String>,
        geometry: CacheGeometry,
        shared: bool,
        lower_level: Arc<dyn MemorySystemDevice>,
    ) -> Self {
        let name = name.into();
        debug!(
            "creating cache {name}: {} ways, {} sets, {} byte lines, {} bytes{}",
            geometry.ways(),
            geometry.sets(),
            geometry.line_size(),
            geometry.capacity(),
            if shared { ", shared" } else { "" }
        );
        Self {
            name,
            id: 0,
            geometry,
            access_lock: shared.then(|| Mutex::new(())),
            sets: (0..geometry.sets()).map(|_| Mutex::new(CacheSet::new(geometry.ways()))).collect(),
            lower_level,
            peers: None,
            protocol: Arc::new(NullProtocol),
            accesses: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            counters_reset: RwLock::new(()),
        }
    }

    /// Starts the recency clock of every set at `time`
    #[cfg(test)]
    pub(crate) fn with_recency_start(mut self, time: Timestamp) -> Self {
        let ways = self.geometry.ways();
        for set in self.sets.iter_mut() {
            set.get_mut().replacement = ReplacementTracker::starting_at(ways, time);
        }
        self
    }

    /// Creates a cache from a level configuration, validating its geometry
    pub fn from_config(config: &CacheConfig, lower_level: Arc<dyn MemorySystemDevice>) -> Result<Self, ConfigError> {
        Ok(Self::new(config.name.clone(), config.geometry()?, config.shared, lower_level)
            .with_protocol(config.protocol.build()))
    }

    pub fn with_protocol(mut self, protocol: Arc<dyn CoherenceProtocol>) -> Self {
        self.protocol = protocol;
        self
    }

    pub(crate) fn with_peers(mut self, id: usize, peers: Weak<PeerDirectory>) -> Self {
        self.id = id;
        self.peers = Some(peers);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    pub fn is_shared(&self) -> bool {
        self.access_lock.is_some()
    }

    /// The group this cache belongs to, if it was built by a
    /// [`CacheGroup`](crate::group::CacheGroup) which is still alive
    pub fn peers(&self) -> Option<Arc<PeerDirectory>> {
        self.peers.as_ref().and_then(Weak::upgrade)
    }

    /// Snapshots the counters. Never observes a [`clear`](Cache::clear) half way through
    pub fn stats(&self) -> CacheStats {
        let _reset = self.counters_reset.read();
        // An access counts itself before its miss, so loading misses first keeps misses <= accesses
        let misses = self.misses.load(Ordering::Acquire);
        let accesses = self.accesses.load(Ordering::Relaxed);
        CacheStats { accesses, misses }
    }

    pub fn report(&self) -> CacheResult {
        let stats = self.stats();
        CacheResult {
            name: self.name.clone(),
            id: self.id,
            accesses: stats.accesses,
            hits: stats.hits(),
            misses: stats.misses,
        }
    }

    /// Checks whether the line for `address` is present, without touching recency or counters
    pub fn contains(&self, address: u64) -> bool {
        let Decomposed { tag, set, .. } = self.geometry.decompose(address);
        self.sets[set].lock().find(tag).is_some()
    }

    /// Counts the valid lines across all sets. Useful for analysing cache behaviour or debugging
    pub fn valid_line_count(&self) -> usize {
        self.sets
            .iter()
            .map(|set| set.lock().lines.iter().filter(|line| line.valid).count())
            .sum()
    }

    /// Empties every set and resets both counters
    ///
    /// All set locks are held at once, in ascending order, so no access observes a partially
    /// cleared cache
    pub fn clear(&self) {
        let _whole = self.access_lock.as_ref().map(|lock| lock.lock());
        let mut sets: Vec<_> = self.sets.iter().map(|set| set.lock()).collect();
        sets.iter_mut().for_each(|set| set.reset());
        let _reset = self.counters_reset.write();
        self.accesses.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// The line logged when the cache is dropped, `"<name>, <id>, <accesses>, <misses>"`, or
    /// nothing for a cache which was never accessed
    pub fn drop_report(&self) -> Option<String> {
        let stats = self.stats();
        (stats.accesses > 0).then(|| format!("{}, {}, {}, {}", self.name, self.id, stats.accesses, stats.misses))
    }

    fn touch(&self, state: &mut CacheSet, set: usize, way: usize) {
        // Overflow handling is unimplemented, a set can only see 2^32 - 1 updates
        if let Err(overflow) = state.replacement.touch(way) {
            panic!("cache {} {}: set {set}: {overflow}", self.name, self.id);
        }
    }

    fn lookup_or_fill(&self, state: &mut CacheSet, set: usize, tag: u64, is_write: bool) -> Result<(), DeviceError> {
        let block = self.geometry.block_address(tag);
        if let Some(way) = state.find(tag) {
            self.touch(state, set, way);
            self.protocol.on_hit(self.id, block, &mut state.lines[way], is_write);
            return Ok(());
        }
        self.misses.fetch_add(1, Ordering::Release);
        trace!("{} {}: miss on {block:#x} in set {set}", self.name, self.id);
        self.protocol.on_miss(self.id, block, is_write);

        self.lower_level.access(block, is_write)?;

        let way = state.replacement.victim(&state.lines);
        let victim = state.lines[way];
        if victim.valid {
            let evicted = self.geometry.block_address(victim.tag);
            self.protocol.on_evict(self.id, evicted);
            self.protocol.remove_addr(evicted, self.id);
        }
        state.lines[way] = Line { tag, valid: true };
        // MRU insertion
        self.touch(state, set, way);
        self.protocol.add_addr(block, self.id);
        Ok(())
    }
}

impl MemorySystemDevice for Cache {
    fn access(&self, address: u64, is_write: bool) -> Result<(), DeviceError> {
        let _whole = self.access_lock.as_ref().map(|lock| lock.lock());
        let Decomposed { tag, set, .. } = self.geometry.decompose(address);
        let mut state = self.sets[set].lock();
        // Counted under the set lock so clear can't split an access from its miss
        self.accesses.fetch_add(1, Ordering::Relaxed);

        let block = self.geometry.block_address(tag);
        self.protocol.lock_addr(block);
        let result = self.lookup_or_fill(&mut state, set, tag, is_write);
        self.protocol.unlock_addr(block);
        result
    }

    fn invalidate(&self, address: u64) -> Result<(), DeviceError> {
        let _whole = self.access_lock.as_ref().map(|lock| lock.lock());
        let Decomposed { tag, set, .. } = self.geometry.decompose(address);
        let mut state = self.sets[set].lock();

        let block = self.geometry.block_address(tag);
        self.protocol.lock_addr(block);
        let mut dropped = false;
        for line in state.lines.iter_mut().filter(|line| line.valid && line.tag == tag) {
            line.invalidate();
            dropped = true;
        }
        if dropped {
            self.protocol.remove_addr(block, self.id);
        }
        self.protocol.unlock_addr(block);
        Ok(())
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        if let Some(report) = self.drop_report() {
            info!("{report}");
        }
    }
}
