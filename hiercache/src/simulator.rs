use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::cache::Cache;
use crate::config::HierarchyConfig;
use crate::device::MemorySystemDevice;
use crate::error::{ConfigError, DeviceError, SimulationError, TraceError};
use crate::group::CacheGroup;
use crate::memory::MainMemory;
use crate::stats::CacheResult;
use crate::trace::TraceRecord;
use crate::tracer::Tracer;

/// One level of a built hierarchy
pub enum Level {
    /// One cache per core
    Private(Arc<CacheGroup>),
    /// One cache for all cores
    Common(Arc<Cache>),
}

impl Level {
    pub fn caches(&self) -> Vec<&Arc<Cache>> {
        match self {
            Level::Private(group) => group.caches().collect(),
            Level::Common(cache) => vec![cache],
        }
    }

    pub fn clear(&self) {
        match self {
            Level::Private(group) => group.clear(),
            Level::Common(cache) => cache.clear(),
        }
    }
}

/// The result of a hierarchy simulation. Can be serialised to the output format
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct HierarchyResult {
    pub main_memory_accesses: u64,
    pub caches: Vec<CacheResult>,
}

/// Builds a hierarchy from its configuration and drives accesses into it on behalf of each core
///
/// It supports replaying multiple times, and will update the time taken and the results
/// accordingly
pub struct Simulator {
    cores: usize,
    // Top (closest to the cores) to bottom
    levels: Vec<Level>,
    memory: Arc<MainMemory>,
    memory_tracer: Option<Arc<Tracer<BufWriter<File>>>>,
    simulation_time: Duration,
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// Levels are built bottom up. A private level stacked on another private level gives each
    /// core its own path down, while a private level above a common one shares it between cores
    ///
    /// # Arguments
    ///
    /// * `config`: A hierarchy configuration, usually resulting from parsing JSON
    ///
    /// returns: Result<Simulator, ConfigError>
    pub fn new(config: &HierarchyConfig) -> Result<Self, ConfigError> {
        if config.cores == 0 {
            return Err(ConfigError::NoCores);
        }
        if config.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        let memory = Arc::new(MainMemory::new());
        let memory_tracer = match &config.memory_trace {
            Some(path) => {
                let file = File::create(path).map_err(|source| ConfigError::MemoryTrace { path: path.clone(), source })?;
                Some(Arc::new(Tracer::new(BufWriter::new(file))))
            }
            None => None,
        };
        let terminal: Arc<dyn MemorySystemDevice> = match &memory_tracer {
            Some(tracer) => tracer.clone(),
            None => memory.clone(),
        };

        let mut levels: Vec<Level> = Vec::with_capacity(config.levels.len());
        for level in config.levels.iter().rev() {
            let built = match (level.private, levels.last()) {
                (true, Some(Level::Private(below))) => {
                    Level::Private(Arc::new(CacheGroup::from_config_over_set(config.cores, level, below.as_ref())?))
                }
                (true, Some(Level::Common(below))) => {
                    Level::Private(Arc::new(CacheGroup::from_config(config.cores, level, below.clone())?))
                }
                (true, None) => Level::Private(Arc::new(CacheGroup::from_config(config.cores, level, terminal.clone())?)),
                (false, Some(Level::Private(below))) => {
                    return Err(ConfigError::PrivateBelowShared { name: below.name().to_string() });
                }
                (false, Some(Level::Common(below))) => Level::Common(Arc::new(Cache::from_config(level, below.clone())?)),
                (false, None) => Level::Common(Arc::new(Cache::from_config(level, terminal.clone())?)),
            };
            debug!("built level {}", level.name);
            levels.push(built);
        }
        levels.reverse();

        Ok(Self {
            cores: config.cores,
            levels,
            memory,
            memory_tracer,
            simulation_time: Duration::new(0, 0),
        })
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn memory(&self) -> &MainMemory {
        &self.memory
    }

    /// The device a core issues its accesses to
    pub fn core_device(&self, core: usize) -> Result<Arc<dyn MemorySystemDevice>, SimulationError> {
        let unknown = || SimulationError::UnknownCore { core, cores: self.cores };
        if core >= self.cores {
            return Err(unknown());
        }
        match &self.levels[0] {
            Level::Private(group) => group.cache(core).map(|cache| cache.clone() as Arc<dyn MemorySystemDevice>).ok_or_else(unknown),
            Level::Common(cache) => Ok(cache.clone() as Arc<dyn MemorySystemDevice>),
        }
    }

    /// Issues one access on behalf of `core`
    pub fn access(&self, core: usize, address: u64, is_write: bool) -> Result<(), SimulationError> {
        self.core_device(core)?.access(address, is_write)?;
        Ok(())
    }

    /// Replays a trace on behalf of `core`, returning the number of records replayed
    pub fn replay<I>(&self, core: usize, records: I) -> Result<u64, SimulationError>
    where
        I: IntoIterator<Item = Result<TraceRecord, TraceError>>,
    {
        let device = self.core_device(core)?;
        let mut replayed = 0;
        for record in records {
            let record = record?;
            device.access(record.address, record.is_write)?;
            replayed += 1;
        }
        debug!("core {core} replayed {replayed} records");
        Ok(replayed)
    }

    /// Replays one trace per core, each on its own thread. Trace `i` belongs to core `i`
    ///
    /// Returns the total number of records replayed
    pub fn replay_concurrently<I>(&mut self, traces: Vec<I>) -> Result<u64, SimulationError>
    where
        I: IntoIterator<Item = Result<TraceRecord, TraceError>> + Send,
    {
        if traces.len() > self.cores {
            return Err(SimulationError::TooManyTraces { traces: traces.len(), cores: self.cores });
        }
        let start = Instant::now();
        let this = &*self;
        let result = thread::scope(|scope| {
            let handles: Vec<_> = traces
                .into_iter()
                .enumerate()
                .map(|(core, trace)| scope.spawn(move || this.replay(core, trace)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .sum::<Result<u64, SimulationError>>()
        });
        self.simulation_time += start.elapsed();
        let replayed = result?;
        info!("replayed {replayed} records in {:?}", self.simulation_time);
        Ok(replayed)
    }

    /// Collects the counters of every cache, top level first
    pub fn result(&self) -> HierarchyResult {
        // Main memory accesses are whatever misses the last level
        let main_memory_accesses = self
            .levels
            .last()
            .map(|level| level.caches().iter().map(|cache| cache.stats().misses).sum::<u64>())
            .unwrap_or(0);
        HierarchyResult {
            main_memory_accesses,
            caches: self.levels.iter().flat_map(|level| level.caches()).map(|cache| cache.report()).collect(),
        }
    }

    /// Gets the number of valid lines for each cache, in the same order as [`Simulator::result`]
    pub fn valid_line_counts(&self) -> Vec<u64> {
        self.levels
            .iter()
            .flat_map(|level| level.caches())
            .map(|cache| cache.valid_line_count() as u64)
            .collect()
    }

    /// Empties every cache and resets all counters, e.g. between simulation phases
    pub fn clear(&self) {
        self.levels.iter().for_each(Level::clear);
        self.memory.clear();
    }

    /// Flushes the memory trace, if there is one
    pub fn finish(&self) -> Result<(), DeviceError> {
        match &self.memory_tracer {
            Some(tracer) => tracer.flush(),
            None => Ok(()),
        }
    }

    /// Gets the wall-clock execution time for replaying
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }
}
