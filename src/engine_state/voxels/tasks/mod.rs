//! # Voxel Task System
//!
//! This module contains the background work of the voxel world: terrain
//! generation, collision shape builds and lighting passes. Each task owns
//! its inputs and reports through a [`JobHandle`](crate::engine_state::task_management::task::JobHandle)
//! the main thread polls once per tick.

pub mod chunk_generation_task;
pub mod collision_shape_task;
pub mod lighting_task;
