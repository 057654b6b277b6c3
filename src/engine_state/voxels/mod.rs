//! # Voxel World Core
//!
//! This module contains the core voxel functionality: representing,
//! manipulating and streaming a block world made of fixed-size chunks.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Block**: Defines individual voxel types, prototypes and runtime variants
//! * **Chunk**: Fixed-size columns of blocks that can be compressed into records
//! * **World**: Coordinates chunks and provides a unified, cross-chunk interface
//! * **Generation**: Deterministic layered terrain with ores and trees
//! * **Tasks**: Background work such as generation, collision builds and lighting
//!
//! ## Data Flow
//!
//! 1. The world receives a block change or a chunk load
//! 2. Visibility of the affected blocks and their neighbors is re-evaluated
//! 3. Scene commands, collision rebuilds and a lighting pass are queued
//! 4. The engine drains the queues once per tick
//!
//! ## Thread Safety
//!
//! The world has a single writer, the main thread. Tasks only ever see
//! owned snapshots or answers handed over through the main-thread bridge.

pub mod block;
pub mod chunk;
pub mod generation;
pub mod spawning;
pub mod tasks;
pub mod transitions;
pub mod visibility;
pub mod world;
