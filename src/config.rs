//! # World Configuration
//!
//! Tunable parameters of the voxel world, loaded from JSON. Every field has a
//! default so a partial document (or an empty `{}`) is a valid configuration.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::{
    engine_state::voxels::chunk::ChunkDimensions,
    error::{EngineError, EngineResult},
};

/// The strategy used to fill freshly generated chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    /// Bedrock, stone with ores, dirt, grass and trees.
    Layered,
    /// Every block is air.
    Empty,
}

/// Runtime configuration of the world and its background services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Horizontal size of a chunk in blocks (x and z)
    pub chunk_width: usize,
    /// Vertical size of a chunk in blocks
    pub chunk_height: usize,
    /// Number of chunks kept loaded on each side of the player's chunk
    pub view_radius: i32,
    /// Distance in blocks the player may stray past the current chunk before streaming reacts
    pub streaming_margin: f32,
    /// Time the player has to stay outside the margin before a shift is committed
    pub streaming_dwell_ms: u64,
    /// Minimum light level of any block
    pub ambient_light: f32,
    /// Sunlight intensity at noon
    pub sun_intensity: f32,
    /// Sunlight loss per block travelled
    pub sun_decay: f32,
    /// Light emitted by a torch
    pub torch_intensity: f32,
    /// Torch light loss per block travelled
    pub torch_decay: f32,
    /// Number of background worker threads
    pub worker_count: usize,
    /// Seed for terrain generation
    pub seed: u64,
    /// How new chunks are filled
    pub generation: GenerationMethod,
    /// Height of the grass layer; half the chunk height when absent
    pub surface_height: Option<usize>,
    /// Maximum deviation of the surface from `surface_height`
    pub surface_variation: usize,
    /// Real time that passes per in-game hour
    pub hour_duration_ms: u64,
    /// Hour of day the world starts at
    pub start_hour: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_width: 32,
            chunk_height: 64,
            view_radius: 1,
            streaming_margin: 10.0,
            streaming_dwell_ms: 500,
            ambient_light: 1.0,
            sun_intensity: 3.0,
            sun_decay: 0.25,
            torch_intensity: 4.0,
            torch_decay: 0.3,
            worker_count: 4,
            seed: 0,
            generation: GenerationMethod::Layered,
            surface_height: None,
            surface_variation: 2,
            hour_duration_ms: 30_000,
            start_hour: 8,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a configuration from a JSON string.
    ///
    /// # Errors
    /// Returns [`EngineError::Json`] for malformed input and
    /// [`EngineError::InvalidConfig`] when a value is out of range.
    pub fn from_json_str(text: &str) -> EngineResult<Self> {
        let config: WorldConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks the invariants the rest of the engine relies on.
    pub fn validate(&self) -> EngineResult<()> {
        if self.chunk_width == 0 || self.chunk_height == 0 {
            return Err(EngineError::InvalidConfig(
                "chunk dimensions must be non-zero".to_string(),
            ));
        }
        if self.view_radius < 0 {
            return Err(EngineError::InvalidConfig(
                "view_radius must not be negative".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(EngineError::InvalidConfig(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.sun_decay <= 0.0 || self.torch_decay <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "light decay must be positive".to_string(),
            ));
        }
        if self.ambient_light < 0.0 {
            return Err(EngineError::InvalidConfig(
                "ambient_light must not be negative".to_string(),
            ));
        }
        if self.start_hour >= 24 {
            return Err(EngineError::InvalidConfig(format!(
                "start_hour {} is not an hour of the day",
                self.start_hour
            )));
        }
        if let Some(surface) = self.surface_height {
            if surface >= self.chunk_height {
                return Err(EngineError::InvalidConfig(format!(
                    "surface_height {} does not fit in chunks {} blocks tall",
                    surface, self.chunk_height
                )));
            }
        }
        Ok(())
    }

    /// The chunk size described by this configuration.
    pub fn dimensions(&self) -> ChunkDimensions {
        ChunkDimensions::new(self.chunk_width, self.chunk_height)
    }

    /// The grass layer height used by terrain generation.
    pub fn surface_height(&self) -> usize {
        self.surface_height.unwrap_or(self.chunk_height / 2)
    }

    /// Hysteresis delay of the streaming manager.
    pub fn streaming_dwell(&self) -> Duration {
        Duration::from_millis(self.streaming_dwell_ms)
    }

    /// Real time per in-game hour.
    pub fn hour_duration(&self) -> Duration {
        Duration::from_millis(self.hour_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = WorldConfig::from_json_str("{}").unwrap();
        assert_eq!(config, WorldConfig::default());
        assert_eq!(config.surface_height(), 32);
    }

    #[test]
    fn test_partial_document_overrides_fields() {
        let config =
            WorldConfig::from_json_str(r#"{"chunk_width": 16, "generation": "empty"}"#).unwrap();
        assert_eq!(config.chunk_width, 16);
        assert_eq!(config.chunk_height, 64);
        assert_eq!(config.generation, GenerationMethod::Empty);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            WorldConfig::from_json_str(r#"{"chunk_width": 0}"#),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            WorldConfig::from_json_str(r#"{"start_hour": 24}"#),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            WorldConfig::from_json_str(r#"{"worker_count": 0}"#),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            WorldConfig::from_json_str("not json"),
            Err(EngineError::Json(_))
        ));
    }
}
