use std::io;
use thiserror::Error;

/// Rejected cache dimensions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("a cache needs at least one way")]
    ZeroWays,
    #[error("{sets_log2} set bits exceed the supported maximum of {max}")]
    TooManySets { sets_log2: u32, max: u32 },
    #[error("{sets_log2} set bits and {line_size_log2} offset bits don't fit in a 64 bit address")]
    AddressTooNarrow { sets_log2: u32, line_size_log2: u32 },
}

/// Errors raised while building a cache or a hierarchy from its configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid geometry for cache {name}: {source}")]
    Geometry {
        name: String,
        #[source]
        source: GeometryError,
    },
    #[error("a hierarchy needs at least one core")]
    NoCores,
    #[error("a hierarchy needs at least one cache level")]
    NoLevels,
    #[error("private level {name} can't sit below a level shared by all cores")]
    PrivateBelowShared { name: String },
    #[error("the lower level provides {available} devices, but {required} peers need one each")]
    LowerLevelTooSmall { required: usize, available: usize },
    #[error("couldn't create the memory trace at {path}: {source}")]
    MemoryTrace {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Errors signalled by a [`MemorySystemDevice`](crate::device::MemorySystemDevice)
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device doesn't support the requested operation, e.g. invalidating a tracer
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    #[error("device I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while reading a trace
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("couldn't read the trace: {0}")]
    Io(#[from] io::Error),
    #[error("malformed trace record on line {line}: {content:?}")]
    Malformed { line: usize, content: String },
}

/// Errors raised while driving a hierarchy
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error("core {core} doesn't exist, the hierarchy has {cores} cores")]
    UnknownCore { core: usize, cores: usize },
    #[error("{traces} traces were given, but the hierarchy only has {cores} cores")]
    TooManyTraces { traces: usize, cores: usize },
}
