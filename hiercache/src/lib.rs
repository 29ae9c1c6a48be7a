//! # hiercache
//!
//! hiercache is a library for multi-level cache hierarchy simulation
//!
//! It provides a set-associative cache which can be private or shared, grouped per core, and
//! stacked on any other device implementing [`device::MemorySystemDevice`], so hierarchies of
//! arbitrary depth can be composed. Caches are safe to access from many threads at once, each set
//! having its own lock.
//!
//! Coherence protocols attach through hooks the caches call on every access, the bundled
//! protocols take no action

/// Contains the implementation of a single cache level
pub mod cache;

/// Contains the coherence protocol hooks and the provided protocols
pub mod coherence;

/// Contains definitions for the JSON hierarchy description
pub mod config;

/// Contains the device traits shared by every level of the hierarchy
pub mod device;

/// Contains the error types of the library
pub mod error;

/// Contains cache dimensions and address decomposition
pub mod geometry;

/// Contains groups of peer caches, one per core
pub mod group;

/// Contains utilities for opening trace files
pub mod io;

/// Contains the main memory terminal device
pub mod memory;

/// Contains the per-set least recently used bookkeeping
pub mod replacement;

/// Contains the simulator used to build a hierarchy from a configuration and replay traces
pub mod simulator;

/// Contains hit and miss accounting
pub mod stats;

/// Contains the trace record format and a lazy reader for it
pub mod trace;

/// Contains the tracer terminal device
pub mod tracer;

#[cfg(test)]
mod test;
