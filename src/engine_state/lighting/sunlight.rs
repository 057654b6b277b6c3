//! # Sunlight
//!
//! Per-chunk sunlight state: the current intensity after the day/night
//! factor, and the origins found by the last lighting pass. Origins are
//! transient and replaced wholesale on every pass.

use crate::engine_state::lighting::light::Light;

/// Sunlight of one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct Sunlight {
    intensity: f32,
    original_intensity: f32,
    origins: Vec<Light>,
}

impl Sunlight {
    /// Creates sunlight at full `intensity` with no origins.
    pub fn new(intensity: f32) -> Self {
        Sunlight {
            intensity,
            original_intensity: intensity,
            origins: Vec::new(),
        }
    }

    /// Intensity after the current factor.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Intensity at noon.
    pub fn original_intensity(&self) -> f32 {
        self.original_intensity
    }

    /// Rescales the intensity relative to its original value.
    pub fn factor_intensity(&mut self, factor: f32) {
        self.intensity = self.original_intensity * factor;
    }

    /// Origins found by the last lighting pass.
    pub fn origins(&self) -> &[Light] {
        &self.origins
    }

    /// Replaces the origins with the result of a new pass.
    pub fn replace_origins(&mut self, origins: Vec<Light>) {
        self.origins = origins;
    }
}
