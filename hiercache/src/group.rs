use std::sync::{Arc, Weak};
use crate::cache::Cache;
use crate::coherence::CoherenceProtocol;
use crate::config::CacheConfig;
use crate::device::{MemorySystemDevice, MemorySystemDeviceSet};
use crate::error::ConfigError;
use crate::geometry::CacheGeometry;

/// The caches of one group, indexed by core id
///
/// Each member holds a weak reference back to its directory, so a coherence protocol can
/// enumerate the siblings of the cache it was called from
pub struct PeerDirectory {
    caches: Vec<Arc<Cache>>,
}

impl PeerDirectory {
    pub fn get(&self, id: usize) -> Option<&Arc<Cache>> {
        self.caches.get(id)
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Cache>> {
        self.caches.iter()
    }
}

/// Group of peer caches at the same level, sharing a lower level and a coherence protocol
pub struct CacheGroup {
    name: String,
    directory: Arc<PeerDirectory>,
}

impl CacheGroup {
    /// Creates `n` caches which all forward misses to `lower_level`
    ///
    /// # Arguments
    ///
    /// * `n`: Number of peers, one per core
    /// * `name`: Label shared by every peer, which are told apart by their id
    /// * `geometry`: The dimensions of each peer
    /// * `shared`: Whether each peer takes a whole-cache lock
    /// * `lower_level`: The device below every peer
    /// * `protocol`: The protocol instance shared by the peers
    ///
    /// returns: CacheGroup
    pub fn new(
        n: usize,
        name: impl Into<String>,
        geometry: CacheGeometry,
        shared: bool,
        lower_level: Arc<dyn MemorySystemDevice>,
        protocol: Arc<dyn CoherenceProtocol>,
    ) -> Self {
        let lower_levels = vec![lower_level; n];
        Self::build(name.into(), geometry, shared, lower_levels, protocol)
    }

    /// Creates `n` caches where peer `i` forwards misses to device `i` of `lower_level`
    ///
    /// Fails if `lower_level` has fewer than `n` devices
    pub fn over_set(
        n: usize,
        name: impl Into<String>,
        geometry: CacheGeometry,
        shared: bool,
        lower_level: &dyn MemorySystemDeviceSet,
        protocol: Arc<dyn CoherenceProtocol>,
    ) -> Result<Self, ConfigError> {
        let lower_levels = (0..n)
            .map(|i| lower_level.device(i))
            .collect::<Option<Vec<_>>>()
            .ok_or(ConfigError::LowerLevelTooSmall { required: n, available: lower_level.len() })?;
        Ok(Self::build(name.into(), geometry, shared, lower_levels, protocol))
    }

    /// Creates a group from a level configuration, every peer sharing `lower_level`
    pub fn from_config(n: usize, config: &CacheConfig, lower_level: Arc<dyn MemorySystemDevice>) -> Result<Self, ConfigError> {
        Ok(Self::new(n, config.name.clone(), config.geometry()?, config.shared, lower_level, config.protocol.build()))
    }

    /// Creates a group from a level configuration, stacked on a parallel set of devices
    pub fn from_config_over_set(n: usize, config: &CacheConfig, lower_level: &dyn MemorySystemDeviceSet) -> Result<Self, ConfigError> {
        Self::over_set(n, config.name.clone(), config.geometry()?, config.shared, lower_level, config.protocol.build())
    }

    fn build(
        name: String,
        geometry: CacheGeometry,
        shared: bool,
        lower_levels: Vec<Arc<dyn MemorySystemDevice>>,
        protocol: Arc<dyn CoherenceProtocol>,
    ) -> Self {
        let directory = Arc::new_cyclic(|peers: &Weak<PeerDirectory>| PeerDirectory {
            caches: lower_levels
                .into_iter()
                .enumerate()
                .map(|(id, lower_level)| {
                    Arc::new(
                        Cache::new(name.clone(), geometry, shared, lower_level)
                            .with_protocol(protocol.clone())
                            .with_peers(id, peers.clone()),
                    )
                })
                .collect(),
        });
        Self { name, directory }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cache(&self, i: usize) -> Option<&Arc<Cache>> {
        self.directory.get(i)
    }

    pub fn caches(&self) -> impl Iterator<Item = &Arc<Cache>> {
        self.directory.iter()
    }

    pub fn directory(&self) -> &Arc<PeerDirectory> {
        &self.directory
    }

    pub fn clear(&self) {
        self.directory.iter().for_each(|cache| cache.clear());
    }
}

impl MemorySystemDeviceSet for CacheGroup {
    fn device(&self, index: usize) -> Option<Arc<dyn MemorySystemDevice>> {
        self.directory.get(index).map(|cache| cache.clone() as Arc<dyn MemorySystemDevice>)
    }

    fn len(&self) -> usize {
        self.directory.len()
    }
}
