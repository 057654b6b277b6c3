//! # Core Module
//!
//! Small shared-state primitives used by the engine's collaborators.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking

pub mod mt_resource;

pub use mt_resource::MtResource;
