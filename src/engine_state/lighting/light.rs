//! # Lights
//!
//! A light is an origin block, an intensity and a per-hop decay. The
//! intensity it was created with is kept apart so a global day/night factor
//! can rescale it without losing the base value.

use std::collections::HashMap;

use cgmath::Point3;

/// Registry key of a permanent light.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LightId(pub u64);

/// A point light placed on a block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Light {
    /// World position of the emitting block
    pub origin: Point3<i32>,
    /// Current intensity
    pub intensity: f32,
    /// Intensity lost per block travelled
    pub decay: f32,
    /// Intensity before any factor was applied
    pub original_intensity: f32,
}

impl Light {
    /// Creates a light at full intensity.
    pub fn new(origin: Point3<i32>, intensity: f32, decay: f32) -> Self {
        Light {
            origin,
            intensity,
            decay,
            original_intensity: intensity,
        }
    }

    /// Scales the light relative to its original intensity.
    pub fn factor_intensity(&mut self, factor: f32) {
        self.intensity = self.original_intensity * factor;
    }
}

/// The permanent lights of one world, such as torches.
///
/// Origins are unique: registering a second light on the same block returns
/// the light that is already there.
#[derive(Debug, Default)]
pub struct LightRegistry {
    lights: HashMap<LightId, Light>,
    by_origin: HashMap<Point3<i32>, LightId>,
    next: u64,
}

impl LightRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `light`, or returns the id of the light already on its origin.
    pub fn register(&mut self, light: Light) -> LightId {
        if let Some(id) = self.by_origin.get(&light.origin) {
            return *id;
        }
        let id = LightId(self.next);
        self.next += 1;
        self.by_origin.insert(light.origin, id);
        self.lights.insert(id, light);
        id
    }

    /// Removes a light. Unknown ids are ignored.
    pub fn unregister(&mut self, id: LightId) -> Option<Light> {
        let light = self.lights.remove(&id)?;
        self.by_origin.remove(&light.origin);
        Some(light)
    }

    /// The light with id `id`.
    pub fn get(&self, id: LightId) -> Option<&Light> {
        self.lights.get(&id)
    }

    /// The light emitted from `origin`, if any.
    pub fn at(&self, origin: Point3<i32>) -> Option<LightId> {
        self.by_origin.get(&origin).copied()
    }

    /// Every registered light.
    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.values()
    }

    /// Number of registered lights.
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// Whether no light is registered.
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Removes every light.
    pub fn clear(&mut self) {
        self.lights.clear();
        self.by_origin.clear();
    }
}
