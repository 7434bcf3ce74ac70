//! Error definitions for the simulator.
//!
//! Two layers of failure exist:
//! 1. **Construction:** a [`PolicyError`] names the cache-geometry invariant
//!    that a configuration violates; no cache is built.
//! 2. **Run:** a [`SimError`] covers everything that can abort a simulation
//!    run (bad configuration, malformed trace input, I/O).
//!
//! Engine-internal inconsistencies (a resident block disagreeing with its
//! home set) are programming errors, not user errors, and panic instead.

use std::io;

use thiserror::Error;

/// A violated cache-geometry invariant, detected before any block is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The total cache size must be a power of two.
    #[error("cache size {0} is not a power of two")]
    CacheSizeNotPowerOfTwo(u32),

    /// The block size must be a power of two.
    #[error("block size {0} is not a power of two")]
    BlockSizeNotPowerOfTwo(u32),

    /// The cache must hold a whole number of blocks.
    #[error("cache size {cache_size} is not a multiple of block size {block_size}")]
    SizeNotBlockMultiple {
        /// Total cache size in bytes.
        cache_size: u32,
        /// Block size in bytes.
        block_size: u32,
    },

    /// The declared block count must fill the cache exactly.
    #[error("{block_num} blocks of {block_size} bytes do not fill a {cache_size}-byte cache")]
    BlockCountMismatch {
        /// Declared number of blocks.
        block_num: u32,
        /// Block size in bytes.
        block_size: u32,
        /// Total cache size in bytes.
        cache_size: u32,
    },

    /// The blocks must split evenly into sets of `associativity` ways.
    #[error("{block_num} blocks cannot be split into {associativity}-way sets")]
    AssociativityMismatch {
        /// Declared number of blocks.
        block_num: u32,
        /// Ways per set.
        associativity: u32,
    },
}

/// Any error that terminates a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// A cache level was configured with invalid geometry.
    #[error("invalid cache policy: {0}")]
    Policy(#[from] PolicyError),

    /// A configuration file failed to deserialize.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The multi-level trace dialect only accepts `r` and `w` operations.
    #[error("illegal trace operation {0:?}")]
    IllegalOp(String),

    /// A trace address token was not parseable as 32-bit hex.
    #[error("malformed trace address {0:?}")]
    BadAddress(String),

    /// The trace ended in the middle of a record.
    #[error("trace ends mid-record after token {0:?}")]
    TruncatedTrace(String),

    /// The trace could not be read or a report could not be written.
    #[error(transparent)]
    Io(#[from] io::Error),
}
