//! # Light Propagation
//!
//! The pure part of the lighting engine. It runs on a worker thread against a
//! [`LightingSnapshot`] that the main thread captured from the live world.
//!
//! ## Algorithm
//!
//! 1. Every cell of every loaded chunk starts at the ambient level.
//! 2. Sunlight origins are found per column by scanning downwards from the
//!    top of the chunk (see [`sunlight_origins`]).
//! 3. Each source floods outwards. A neighbor takes `level - decay` only if
//!    `round(candidate * 100) > round(current * 105)`, and the flood only
//!    continues through air and light-permeable cells.
//! 4. The per-source results are merged by taking the maximum, so the final
//!    field does not depend on the order sources are visited in.

use std::collections::{HashMap, HashSet, VecDeque};

use bitvec::vec::BitVec;
use cgmath::Point3;

use crate::engine_state::{
    lighting::light::Light,
    voxels::{
        block::{block_side::BlockSide, Block},
        chunk::{ChunkCoord, ChunkDimensions},
    },
};

/// How a cell interacts with light.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LightCell {
    /// Empty space; light passes and sunlight keeps scanning down.
    Air,
    /// A solid that lets light through, such as a torch.
    Permeable,
    /// A solid that takes light but stops it.
    Opaque,
}

/// Light-relevant layout of one chunk.
#[derive(Clone, Debug)]
pub struct ChunkCells {
    non_air: BitVec,
    permeable: BitVec,
    sun_intensity: f32,
}

impl ChunkCells {
    /// A chunk of `volume` air cells under sunlight of `sun_intensity`.
    pub fn new(volume: usize, sun_intensity: f32) -> Self {
        ChunkCells {
            non_air: BitVec::repeat(false, volume),
            permeable: BitVec::repeat(true, volume),
            sun_intensity,
        }
    }

    /// Captures the cells of a loaded chunk's blocks.
    pub fn from_blocks(blocks: &[Block], sun_intensity: f32) -> Self {
        let mut cells = ChunkCells::new(blocks.len(), sun_intensity);
        for (index, block) in blocks.iter().enumerate() {
            let cell = if block.is_air() {
                LightCell::Air
            } else if block.permits_light() {
                LightCell::Permeable
            } else {
                LightCell::Opaque
            };
            cells.set(index, cell);
        }
        cells
    }

    /// Overrides the cell at storage index `index`.
    pub fn set(&mut self, index: usize, cell: LightCell) {
        if index >= self.non_air.len() {
            return;
        }
        self.non_air.set(index, cell != LightCell::Air);
        self.permeable.set(index, cell != LightCell::Opaque);
    }

    fn get(&self, index: usize) -> Option<LightCell> {
        let non_air = *self.non_air.get(index)?;
        let permeable = *self.permeable.get(index)?;
        Some(match (non_air, permeable) {
            (false, _) => LightCell::Air,
            (true, true) => LightCell::Permeable,
            (true, false) => LightCell::Opaque,
        })
    }
}

/// Everything a lighting pass reads, detached from the live world.
#[derive(Clone, Debug)]
pub struct LightingSnapshot {
    dimensions: ChunkDimensions,
    ambient: f32,
    sun_decay: f32,
    chunks: HashMap<ChunkCoord, ChunkCells>,
    lights: Vec<Light>,
}

impl LightingSnapshot {
    /// An empty snapshot.
    pub fn new(dimensions: ChunkDimensions, ambient: f32, sun_decay: f32) -> Self {
        LightingSnapshot {
            dimensions,
            ambient,
            sun_decay,
            chunks: HashMap::new(),
            lights: Vec::new(),
        }
    }

    /// Adds the cells of a loaded chunk.
    pub fn insert_chunk(&mut self, coord: ChunkCoord, cells: ChunkCells) {
        self.chunks.insert(coord, cells);
    }

    /// Adds a permanent light.
    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Permanent lights of the snapshot.
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// The chunk size of the snapshot.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// The ambient light level.
    pub fn ambient(&self) -> f32 {
        self.ambient
    }

    /// The cell at world position `position`, or `None` outside the loaded
    /// chunks.
    pub fn cell(&self, position: Point3<i32>) -> Option<LightCell> {
        let (coord, local) = self.dimensions.split(position)?;
        self.chunks.get(&coord)?.get(self.dimensions.index(local))
    }

    fn sorted_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        coords.sort();
        coords
    }
}

/// Per-chunk light levels in storage order.
#[derive(Clone, Debug, PartialEq)]
pub struct LightField {
    dimensions: ChunkDimensions,
    levels: HashMap<ChunkCoord, Vec<f32>>,
}

impl LightField {
    fn ambient(snapshot: &LightingSnapshot) -> Self {
        let volume = snapshot.dimensions.volume();
        LightField {
            dimensions: snapshot.dimensions,
            levels: snapshot
                .chunks
                .keys()
                .map(|coord| (*coord, vec![snapshot.ambient; volume]))
                .collect(),
        }
    }

    /// The level at world position `position`.
    pub fn level(&self, position: Point3<i32>) -> Option<f32> {
        let (coord, local) = self.dimensions.split(position)?;
        self.levels
            .get(&coord)?
            .get(self.dimensions.index(local))
            .copied()
    }

    fn raise(&mut self, position: Point3<i32>, level: f32) {
        let Some((coord, local)) = self.dimensions.split(position) else {
            return;
        };
        let index = self.dimensions.index(local);
        if let Some(slot) = self.levels.get_mut(&coord).and_then(|l| l.get_mut(index)) {
            *slot = slot.max(level);
        }
    }

    /// The per-chunk level vectors.
    pub fn into_levels(self) -> HashMap<ChunkCoord, Vec<f32>> {
        self.levels
    }
}

/// The result of a full lighting pass.
#[derive(Clone, Debug)]
pub struct LightingOutcome {
    /// Final level of every block of every chunk in the snapshot
    pub levels: HashMap<ChunkCoord, Vec<f32>>,
    /// Sunlight origins found for each chunk
    pub sunlight_origins: HashMap<ChunkCoord, Vec<Light>>,
}

/// Whether `candidate` counts as an improvement over `current`.
///
/// The comparison is deliberately asymmetric and keeps a small margin so
/// nearly equal levels from two sources do not keep re-visiting a cell.
pub fn brightens(candidate: f32, current: f32) -> bool {
    (candidate * 100.0).round() > (current * 105.0).round()
}

/// Finds the sunlight origins of every chunk in the snapshot.
///
/// For each column the scan walks down from the top through air. The air cell
/// right above the first non-air block becomes the origin, so the light floods
/// the open sky and reaches under overhangs and canopies; a column whose top
/// cell is already solid uses that cell, and a column with no solid block
/// uses its top cell. Every non-air block beside a scanned air cell at the
/// same height becomes an origin too, which lights cave mouths. No block is
/// registered twice in one pass.
pub fn sunlight_origins(snapshot: &LightingSnapshot) -> HashMap<ChunkCoord, Vec<Light>> {
    let width = snapshot.dimensions.width as i32;
    let top = snapshot.dimensions.height as i32 - 1;
    let mut seen: HashSet<Point3<i32>> = HashSet::new();
    let mut result = HashMap::new();

    for coord in snapshot.sorted_coords() {
        let Some(cells) = snapshot.chunks.get(&coord) else {
            continue;
        };
        let intensity = cells.sun_intensity;
        let decay = snapshot.sun_decay;
        let base = coord.block_origin(snapshot.dimensions.width);
        let mut origins = Vec::new();

        for x in 0..width {
            for z in 0..width {
                let mut surface = None;
                for y in (0..=top).rev() {
                    let position = Point3::new(base.x + x, y, base.z + z);
                    if snapshot.cell(position) != Some(LightCell::Air) {
                        surface = Some(position);
                        break;
                    }
                    for side in BlockSide::horizontal() {
                        let beside = side.neighbor_of(position);
                        let exposed = matches!(
                            snapshot.cell(beside),
                            Some(LightCell::Permeable | LightCell::Opaque)
                        );
                        if exposed && seen.insert(beside) {
                            origins.push(Light::new(beside, intensity, decay));
                        }
                    }
                }

                let origin = match surface {
                    Some(solid) if solid.y < top => Point3::new(solid.x, solid.y + 1, solid.z),
                    Some(solid) => solid,
                    None => Point3::new(base.x + x, top, base.z + z),
                };
                if seen.insert(origin) {
                    origins.push(Light::new(origin, intensity, decay));
                }
            }
        }
        result.insert(coord, origins);
    }
    result
}

fn propagate_source(snapshot: &LightingSnapshot, light: &Light, field: &mut LightField) {
    let Some(origin_cell) = snapshot.cell(light.origin) else {
        return;
    };
    let start = light.intensity.max(snapshot.ambient);
    field.raise(light.origin, start);
    if origin_cell == LightCell::Opaque {
        return;
    }

    let mut local: HashMap<Point3<i32>, f32> = HashMap::new();
    local.insert(light.origin, start);
    let mut queue = VecDeque::new();
    queue.push_back((light.origin, start));

    while let Some((position, level)) = queue.pop_front() {
        let candidate = level - light.decay;
        for side in BlockSide::all() {
            let neighbor = side.neighbor_of(position);
            let Some(cell) = snapshot.cell(neighbor) else {
                continue;
            };
            let current = local.get(&neighbor).copied().unwrap_or(snapshot.ambient);
            if !brightens(candidate, current) {
                continue;
            }
            local.insert(neighbor, candidate);
            field.raise(neighbor, candidate);
            if cell != LightCell::Opaque {
                queue.push_back((neighbor, candidate));
            }
        }
    }
}

/// Floods every light in `lights` and merges the results.
pub fn propagate_all(snapshot: &LightingSnapshot, lights: &[Light]) -> LightField {
    let mut field = LightField::ambient(snapshot);
    for light in lights {
        propagate_source(snapshot, light, &mut field);
    }
    field
}

/// Runs a complete lighting pass: sunlight first, then permanent lights.
pub fn recalculate_all_lights(snapshot: &LightingSnapshot) -> LightingOutcome {
    let sunlight_origins = sunlight_origins(snapshot);

    let mut coords: Vec<&ChunkCoord> = sunlight_origins.keys().collect();
    coords.sort();
    let mut lights: Vec<Light> = coords
        .into_iter()
        .filter_map(|coord| sunlight_origins.get(coord))
        .flatten()
        .copied()
        .collect();
    lights.extend_from_slice(&snapshot.lights);

    let field = propagate_all(snapshot, &lights);
    log::debug!(
        "Lighting pass over {} chunks with {} sources",
        snapshot.chunks.len(),
        lights.len()
    );

    LightingOutcome {
        levels: field.into_levels(),
        sunlight_origins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn air_snapshot(dimensions: ChunkDimensions, sun: f32) -> LightingSnapshot {
        let mut snapshot = LightingSnapshot::new(dimensions, 1.0, 0.25);
        snapshot.insert_chunk(
            ChunkCoord::new(0, 0),
            ChunkCells::new(dimensions.volume(), sun),
        );
        snapshot
    }

    #[test]
    fn test_brightens_keeps_the_margin() {
        assert!(brightens(1.1, 1.0));
        assert!(!brightens(1.05, 1.0));
        assert!(!brightens(1.0, 1.0));
        assert!(brightens(3.7, 1.0));
    }

    #[test]
    fn test_all_air_column_uses_its_top_cell() {
        let dimensions = ChunkDimensions::new(1, 16);
        let snapshot = air_snapshot(dimensions, 3.0);
        let origins = sunlight_origins(&snapshot);
        let column = &origins[&ChunkCoord::new(0, 0)];
        assert_eq!(column.len(), 1);
        assert_eq!(column[0].origin, Point3::new(0, 15, 0));
        assert_eq!(column[0].intensity, 3.0);

        let outcome = recalculate_all_lights(&snapshot);
        let levels = &outcome.levels[&ChunkCoord::new(0, 0)];
        assert_eq!(levels[dimensions.index(Point3::new(0, 15, 0))], 3.0);
        assert_eq!(levels[dimensions.index(Point3::new(0, 0, 0))], 1.0);
    }

    #[test]
    fn test_surface_and_overhang_become_origins() {
        let dimensions = ChunkDimensions::new(3, 8);
        let mut snapshot = LightingSnapshot::new(dimensions, 1.0, 0.25);
        let mut cells = ChunkCells::new(dimensions.volume(), 3.0);
        for position in dimensions.positions() {
            if position.y <= 2 || (position.x == 0 && position.y == 5) {
                cells.set(dimensions.index(position), LightCell::Opaque);
            }
        }
        snapshot.insert_chunk(ChunkCoord::new(0, 0), cells);

        let origins = sunlight_origins(&snapshot);
        let positions: HashSet<Point3<i32>> = origins[&ChunkCoord::new(0, 0)]
            .iter()
            .map(|light| light.origin)
            .collect();
        assert!(positions.contains(&Point3::new(1, 3, 1)));
        assert!(!positions.contains(&Point3::new(1, 2, 1)));
        assert!(positions.contains(&Point3::new(0, 6, 1)));
        assert!(positions.contains(&Point3::new(0, 5, 1)));
        assert_eq!(positions.len(), origins[&ChunkCoord::new(0, 0)].len());
    }

    #[test]
    fn test_sky_above_a_surface_is_lit() {
        let dimensions = ChunkDimensions::new(2, 12);
        let mut snapshot = LightingSnapshot::new(dimensions, 1.0, 0.25);
        let mut cells = ChunkCells::new(dimensions.volume(), 3.0);
        for position in dimensions.positions() {
            if position.y <= 5 {
                cells.set(dimensions.index(position), LightCell::Opaque);
            }
        }
        snapshot.insert_chunk(ChunkCoord::new(0, 0), cells);

        let outcome = recalculate_all_lights(&snapshot);
        let levels = &outcome.levels[&ChunkCoord::new(0, 0)];
        let level = |y| levels[dimensions.index(Point3::new(1, y, 1))];
        assert_eq!(level(6), 3.0);
        assert!((level(5) - 2.75).abs() < 1e-4);
        assert_eq!(level(4), 1.0);
        assert!((level(9) - 2.25).abs() < 1e-4);
        assert!(level(11) > 1.0);
    }

    #[test]
    fn test_opaque_cells_take_light_but_stop_it() {
        let dimensions = ChunkDimensions::new(8, 8);
        let mut snapshot = LightingSnapshot::new(dimensions, 1.0, 0.25);
        let mut cells = ChunkCells::new(dimensions.volume(), 0.0);
        for position in dimensions.positions() {
            if position.x == 4 {
                cells.set(dimensions.index(position), LightCell::Opaque);
            }
        }
        snapshot.insert_chunk(ChunkCoord::new(0, 0), cells);

        let torch = Light::new(Point3::new(2, 4, 4), 4.0, 0.3);
        let field = propagate_all(&snapshot, &[torch]);
        assert_eq!(field.level(Point3::new(2, 4, 4)), Some(4.0));
        assert!((field.level(Point3::new(4, 4, 4)).unwrap() - 3.4).abs() < 1e-4);
        assert_eq!(field.level(Point3::new(5, 4, 4)), Some(1.0));
    }

    #[test]
    fn test_source_order_does_not_change_the_result() {
        let dimensions = ChunkDimensions::new(8, 12);
        let mut snapshot = LightingSnapshot::new(dimensions, 1.0, 0.25);
        let mut rng = fastrand::Rng::with_seed(7);
        let mut cells = ChunkCells::new(dimensions.volume(), 3.0);
        for position in dimensions.positions() {
            if position.y < 4 || rng.f32() < 0.1 {
                cells.set(dimensions.index(position), LightCell::Opaque);
            }
        }
        snapshot.insert_chunk(ChunkCoord::new(0, 0), cells);

        let mut lights: Vec<Light> = sunlight_origins(&snapshot)
            .into_values()
            .flatten()
            .collect();
        lights.push(Light::new(Point3::new(3, 5, 3), 4.0, 0.3));
        lights.push(Light::new(Point3::new(6, 6, 1), 4.0, 0.3));

        let reference = propagate_all(&snapshot, &lights);
        for _ in 0..5 {
            rng.shuffle(&mut lights);
            assert_eq!(propagate_all(&snapshot, &lights), reference);
        }
    }
}
