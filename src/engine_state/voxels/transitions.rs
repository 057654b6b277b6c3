//! # Block Transitions
//!
//! Changing the type of a block is the one place where visibility, drops,
//! lights and collision all meet. [`World::change_type`] walks through the
//! cases in order:
//!
//! 1. a runtime variant is involved: the whole block is replaced in its slot
//! 2. the block turns into air
//! 3. air turns into a solid block
//! 4. a solid block turns into another solid block
//!
//! Afterwards the owning chunk is queued for a collision rebuild and the
//! lighting is marked dirty.

use cgmath::{Point3, Vector3};
use log::{debug, warn};

use crate::engine_state::{
    events::WorldEvent,
    scene::{BlockNode, SceneCommand},
    voxels::{
        block::{
            block_type::{BlockType, VariantKind},
            Block, BlockVariant,
        },
        chunk::ChunkCoord,
        world::World,
    },
};

impl World {
    /// Changes the type of the block at `position`.
    ///
    /// # Arguments
    /// * `position` - world position of the block
    /// * `new_type` - type the block turns into
    /// * `update_physics` - whether the owning chunk needs a collision
    ///   rebuild and a lighting pass
    ///
    /// # Returns
    /// `false` if nothing changed: the position is not loaded, the type is
    /// the same or `new_type` is a drop-only item.
    pub fn change_type(&mut self, position: Point3<i32>, new_type: BlockType, update_physics: bool) -> bool {
        if !new_type.is_placeable() {
            warn!("{:?} cannot be placed in the world", new_type);
            return false;
        }
        let Some(block) = self.get_block(position) else {
            return false;
        };
        let old_type = block.block_type();
        if old_type == new_type {
            return false;
        }
        let chunk = block.chunk();
        let structural = old_type.variant_kind() != VariantKind::Plain
            || new_type.variant_kind() != VariantKind::Plain;

        if structural {
            self.swap_variant(position, new_type);
        } else if new_type == BlockType::AIR {
            self.clear_block(position);
        } else if old_type == BlockType::AIR {
            self.fill_block(position, new_type, update_physics);
        } else {
            self.replace_solid(position, new_type);
        }

        if update_physics || structural {
            self.rebuild_requests.insert(chunk);
            self.lighting_dirty = true;
        }
        debug!("Block {:?} changed from {:?} to {:?}", position, old_type, new_type);
        true
    }

    /// Replaces the block with a fresh one of `new_type`.
    fn swap_variant(&mut self, position: Point3<i32>, new_type: BlockType) {
        let Some(old) = self.get_block(position) else {
            return;
        };
        let chunk = old.chunk();
        let local = old.local();
        let was_visible = !old.is_hidden();
        let drop = old.drop_type().filter(|_| !old.is_air());
        let light = old.emitted_light();
        let (light_level, actual_light_level) = (old.light_level(), old.actual_light_level());

        if let Some(item) = drop {
            self.events.push(WorldEvent::ItemDropped { item, position });
        }
        if was_visible {
            self.commands.push(SceneCommand::Detach(position));
        }
        if let Some(light) = light {
            self.lights.unregister(light);
        }

        let mut fresh = Block::new(new_type, chunk, local, self.config.ambient_light);
        fresh.light_level = light_level;
        fresh.actual_light_level = actual_light_level;
        fresh.variant = self.variant_for(new_type, position);
        let transparent = fresh.is_transparent();
        if let Some(owner) = self.chunk_mut(chunk) {
            owner.replace_block(local, fresh);
        }

        if new_type != BlockType::AIR && !self.is_covered(position) {
            self.show(position, chunk);
        }
        if transparent {
            self.deoptimize(position);
        } else {
            self.optimize(position);
        }
    }

    /// Turns a solid block into air.
    fn clear_block(&mut self, position: Point3<i32>) {
        let chunk = ChunkCoord::containing(position, self.dimensions().width);
        let Some(block) = self.get_block(position) else {
            return;
        };
        if let Some(item) = block.drop_type() {
            self.events.push(WorldEvent::ItemDropped { item, position });
        }
        self.hide(position, chunk);
        if let Some(block) = self.get_block_mut(position) {
            block.apply_prototype(BlockType::AIR);
        }
        self.deoptimize(position);
    }

    /// Turns air into a solid block.
    fn fill_block(&mut self, position: Point3<i32>, new_type: BlockType, update_physics: bool) {
        let chunk = ChunkCoord::containing(position, self.dimensions().width);
        if let Some(block) = self.get_block_mut(position) {
            block.apply_prototype(new_type);
        }
        if update_physics {
            if !self.is_covered(position) {
                self.show(position, chunk);
            }
            self.optimize(position);
        }
    }

    /// Turns a solid block into a different solid block.
    fn replace_solid(&mut self, position: Point3<i32>, new_type: BlockType) {
        let Some(block) = self.get_block_mut(position) else {
            return;
        };
        let was_transparent = block.transparent;
        block.apply_prototype(new_type);
        let is_transparent = block.transparent;
        let node = (!block.hidden).then(|| BlockNode {
            position,
            block_type: new_type,
            light: block.actual_light_level,
        });

        if let Some(node) = node {
            self.commands.push(SceneCommand::Detach(position));
            self.commands.push(SceneCommand::Attach(node));
        }
        if is_transparent && !was_transparent {
            self.deoptimize(position);
        } else if was_transparent && !is_transparent {
            self.optimize(position);
        }
    }

    /// Places `block_type` against the face `normal` of the block at `target`.
    ///
    /// # Returns
    /// `false` if the slot in front of the face is not loaded air.
    pub fn place_block(&mut self, block_type: BlockType, target: Point3<i32>, normal: Vector3<i32>) -> bool {
        let position = target + normal;
        if !self.get_block(position).is_some_and(|block| block.is_air()) {
            return false;
        }
        self.change_type(position, block_type, true)
    }

    /// Subtracts `damage` from the health of the block at `position`.
    ///
    /// # Returns
    /// `true` if the block broke and turned into air.
    pub fn damage_block(&mut self, position: Point3<i32>, damage: f32) -> bool {
        let Some(block) = self.get_block_mut(position) else {
            return false;
        };
        if block.is_air() {
            return false;
        }
        let health = block.health() - damage;
        block.set_health(health);
        if health <= 0.0 {
            return self.change_type(position, BlockType::AIR, true);
        }
        false
    }

    /// Restores the full health of the block at `position`.
    pub fn reset_health(&mut self, position: Point3<i32>) {
        if let Some(block) = self.get_block_mut(position) {
            block.reset_health();
        }
    }

    /// Clicks the block at `position`.
    ///
    /// # Returns
    /// `true` if the block reacted; crafting stations open the crafting UI.
    pub fn interact(&mut self, position: Point3<i32>) -> bool {
        let Some(block) = self.get_block(position) else {
            return false;
        };
        match block.variant() {
            BlockVariant::CraftingStation => {
                self.events.push(WorldEvent::OpenCraftingUi { position });
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{GenerationMethod, WorldConfig},
        engine_state::voxels::generation::TerrainGenerator,
    };

    fn flat_world() -> World {
        let config = WorldConfig {
            chunk_width: 8,
            chunk_height: 12,
            surface_height: Some(4),
            surface_variation: 0,
            generation: GenerationMethod::Layered,
            ..WorldConfig::default()
        };
        let generator = TerrainGenerator::new(&config);
        let mut world = World::new(&config);
        for x in -1..=1 {
            for z in -1..=1 {
                world.insert_blueprint(&generator.generate(ChunkCoord::new(x, z)).unwrap());
            }
        }
        world.drain_commands();
        world.drain_events();
        world.take_rebuild_requests();
        world.take_lighting_dirty();
        world
    }

    fn drops(world: &mut World) -> Vec<BlockType> {
        world
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                WorldEvent::ItemDropped { item, .. } => Some(item),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_breaking_drops_once_and_exposes_neighbors() {
        let mut world = flat_world();
        let grass = Point3::new(2, 4, 2);
        let below = Point3::new(2, 3, 2);
        assert!(world.get_block(below).unwrap().is_hidden());

        assert!(!world.damage_block(grass, 0.5));
        assert!(world.damage_block(grass, 0.5));
        assert!(world.get_block(grass).unwrap().is_air());
        assert!(!world.get_block(below).unwrap().is_hidden());
        assert_eq!(drops(&mut world), vec![BlockType::GRASS]);
        assert!(!world.damage_block(grass, 10.0));
        assert!(drops(&mut world).is_empty());

        assert_eq!(world.take_rebuild_requests(), vec![ChunkCoord::new(0, 0)]);
        assert!(world.take_lighting_dirty());
    }

    #[test]
    fn test_place_then_remove_restores_visibility() {
        let mut world = flat_world();
        let ground = Point3::new(3, 4, 3);
        let before: Vec<bool> = (0..6)
            .map(|i| world.get_block(Point3::new(3, 4 - i / 2, 3 + i % 2)).unwrap().is_hidden())
            .collect();

        assert!(world.place_block(BlockType::COBBLESTONE, ground, Vector3::new(0, 1, 0)));
        let placed = Point3::new(3, 5, 3);
        assert_eq!(world.get_block(placed).unwrap().block_type(), BlockType::COBBLESTONE);
        assert!(!world.get_block(placed).unwrap().is_hidden());
        assert!(!world.place_block(BlockType::DIRT, ground, Vector3::new(0, 1, 0)));

        assert!(world.change_type(placed, BlockType::AIR, true));
        let after: Vec<bool> = (0..6)
            .map(|i| world.get_block(Point3::new(3, 4 - i / 2, 3 + i % 2)).unwrap().is_hidden())
            .collect();
        assert_eq!(before, after);
        assert_eq!(drops(&mut world), vec![BlockType::COBBLESTONE]);
    }

    #[test]
    fn test_torch_swap_registers_and_releases_its_light() {
        let mut world = flat_world();
        let position = Point3::new(1, 5, 1);
        assert!(world.change_type(position, BlockType::TORCH, false));
        let id = world.get_block(position).unwrap().emitted_light().unwrap();
        assert_eq!(world.lights().get(id).unwrap().origin, position);
        assert!(world.take_lighting_dirty());

        assert!(world.change_type(position, BlockType::AIR, false));
        assert!(world.lights().is_empty());
        assert!(world.get_block(position).unwrap().is_hidden());
        assert_eq!(drops(&mut world), vec![BlockType::TORCH]);
    }

    #[test]
    fn test_workbench_placed_on_a_seam_opens_crafting() {
        let mut world = flat_world();
        // Ground on the chunk seam: (7, 4, 0) belongs to chunk (0, 0),
        // its neighbor (8, 4, 0) to chunk (1, 0).
        let position = Point3::new(7, 4, 0);
        let neighbor = Point3::new(8, 3, 0);
        world.change_type(Point3::new(8, 4, 0), BlockType::AIR, true);
        world.take_rebuild_requests();
        assert!(!world.get_block(neighbor).unwrap().is_hidden());

        assert!(world.change_type(position, BlockType::WORKBENCH, false));
        assert!(world.interact(position));
        assert!(world
            .drain_events()
            .contains(&WorldEvent::OpenCraftingUi { position }));
        assert!(!world.interact(neighbor));
    }

    #[test]
    fn test_drop_only_items_cannot_be_placed() {
        let mut world = flat_world();
        assert!(!world.change_type(Point3::new(0, 6, 0), BlockType::STICK, true));
        assert!(world.get_block(Point3::new(0, 6, 0)).unwrap().is_air());
        assert!(!world.change_type(Point3::new(0, 6, 0), BlockType::AIR, true));
    }
}
