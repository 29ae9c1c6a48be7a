use std::sync::Arc;
use serde::Deserialize;
use crate::coherence::{CoherenceProtocol, DirectoryMoesi, NullProtocol};
use crate::error::ConfigError;
use crate::geometry::CacheGeometry;

/// A cache hierarchy, levels listed from the cores down towards memory
#[derive(Debug, Deserialize)]
pub struct HierarchyConfig {
    #[serde(default = "default_cores")]
    pub cores: usize,
    pub levels: Vec<CacheConfig>,
    /// When set, a tracer writing to this path replaces main memory below the last level
    #[serde(default)]
    pub memory_trace: Option<String>,
}

fn default_cores() -> usize {
    1
}

/// A configuration for a single level
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub name: String,
    pub ways: usize,
    pub sets_log2: u32,
    pub line_size_log2: u32,
    /// One cache per core rather than one for all cores
    #[serde(default)]
    pub private: bool,
    /// Serialise every access to a cache behind a whole-cache lock
    #[serde(default)]
    pub shared: bool,
    #[serde(default = "ProtocolConfig::default")]
    pub protocol: ProtocolConfig,
}

impl CacheConfig {
    pub fn geometry(&self) -> Result<CacheGeometry, ConfigError> {
        CacheGeometry::new(self.ways, self.sets_log2, self.line_size_log2)
            .map_err(|source| ConfigError::Geometry { name: self.name.clone(), source })
    }
}

/// The coherence protocol of a level - null or moesi. Defaults to null.
#[derive(Debug, Copy, Clone, Deserialize)]
pub enum ProtocolConfig {
    #[serde(alias = "null")]
    Null,
    #[serde(alias = "moesi")]
    DirectoryMoesi,
}

impl ProtocolConfig {
    pub fn build(&self) -> Arc<dyn CoherenceProtocol> {
        match self {
            ProtocolConfig::Null => Arc::new(NullProtocol),
            ProtocolConfig::DirectoryMoesi => Arc::new(DirectoryMoesi),
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig::Null
    }
}
