//! # Engine Errors
//!
//! Every fallible operation in the crate reports an [`EngineError`]. Most of
//! them never reach the player: background failures are logged where the
//! pending handle is polled and the slot is cleared so the next trigger can
//! retry. Missing blocks are not errors at all and are modelled as `Option`.

use thiserror::Error;

use crate::engine_state::voxels::chunk::ChunkCoord;

/// Errors raised by configuration loading, persistence records and
/// background jobs.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration or record file could not be read.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input could not be parsed into the expected shape.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted record names a block type id the catalog does not know.
    #[error("unknown block type id {0}")]
    UnknownBlockType(u8),

    /// A persisted chunk record does not match the configured chunk size.
    #[error("chunk record {coord} holds {found} blocks, expected {expected}")]
    RecordSize {
        /// The chunk the record belongs to
        coord: ChunkCoord,
        /// Number of blocks in the record
        found: usize,
        /// Number of blocks a chunk of the configured size holds
        expected: usize,
    },

    /// A persisted block record does not sit in the slot its coordinates name.
    #[error("block record {index} of chunk {coord} does not match its slot")]
    MisplacedBlock {
        /// The chunk the record belongs to
        coord: ChunkCoord,
        /// Storage index of the offending record
        index: usize,
    },

    /// A world record lists the same chunk twice.
    #[error("chunk {0} appears twice in the world record")]
    DuplicateChunk(ChunkCoord),

    /// Scene data was requested for a chunk that is not loaded.
    #[error("chunk {0} is not loaded")]
    ChunkNotLoaded(ChunkCoord),

    /// The physics backend refused to build a collision shape.
    #[error("collision shape for chunk {coord} could not be built: {reason}")]
    ShapeBuild {
        /// The chunk whose geometry was being converted
        coord: ChunkCoord,
        /// Backend supplied explanation
        reason: String,
    },

    /// Terrain could not be generated for a chunk.
    #[error("chunk {coord} could not be generated: {reason}")]
    Generation {
        /// The chunk being generated
        coord: ChunkCoord,
        /// What went wrong
        reason: String,
    },

    /// The main thread stopped answering scene requests.
    #[error("main-thread bridge closed")]
    BridgeClosed,
}

/// Shorthand result type used across the crate.
pub type EngineResult<T> = Result<T, EngineError>;
