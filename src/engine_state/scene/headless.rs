//! # Headless Backend
//!
//! An in-memory stand-in for the render/physics backend. It keeps the set of
//! attached blocks, their shading levels and the live physics bodies, which
//! is enough to ray cast against and to check the world's visibility
//! bookkeeping from the outside.
//!
//! The state lives in an [`MtResource`] so a test can keep a clone of the
//! backend after handing the original to the engine.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use cgmath::{InnerSpace, Point3, Vector3};

use crate::{
    core::MtResource,
    engine_state::{
        scene::{
            Aabb, BlockNode, BodyId, CollisionShape, GeometrySet, RayHit, SceneBackend,
            ShapeBuilder,
        },
        voxels::chunk::ChunkCoord,
    },
    error::{EngineError, EngineResult},
};

#[derive(Default)]
struct SceneState {
    attached: HashMap<Point3<i32>, BlockNode>,
    bodies: HashMap<BodyId, CollisionShape>,
    next_body: u64,
    bodies_added: usize,
    bodies_removed: usize,
}

/// In-memory [`SceneBackend`].
#[derive(Clone, Default)]
pub struct HeadlessBackend {
    state: MtResource<SceneState>,
}

impl HeadlessBackend {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a block is attached at `position`.
    pub fn is_attached(&self, position: Point3<i32>) -> bool {
        self.state.get().attached.contains_key(&position)
    }

    /// Number of attached blocks.
    pub fn attached_count(&self) -> usize {
        self.state.get().attached.len()
    }

    /// The shading level last pushed to the block at `position`.
    pub fn shade_of(&self, position: Point3<i32>) -> Option<f32> {
        self.state.get().attached.get(&position).map(|node| node.light)
    }

    /// Live bodies standing in for `chunk`.
    pub fn bodies_for(&self, chunk: ChunkCoord) -> Vec<BodyId> {
        let mut bodies: Vec<BodyId> = self
            .state
            .get()
            .bodies
            .iter()
            .filter(|(_, shape)| shape.chunk == chunk)
            .map(|(id, _)| *id)
            .collect();
        bodies.sort();
        bodies
    }

    /// Number of live bodies.
    pub fn body_count(&self) -> usize {
        self.state.get().bodies.len()
    }

    /// Total bodies added and removed since creation.
    pub fn body_churn(&self) -> (usize, usize) {
        let state = self.state.get();
        (state.bodies_added, state.bodies_removed)
    }
}

impl SceneBackend for HeadlessBackend {
    fn attach(&mut self, node: &BlockNode) {
        self.state.get_mut().attached.insert(node.position, *node);
    }

    fn detach(&mut self, position: Point3<i32>) {
        self.state.get_mut().attached.remove(&position);
    }

    fn set_shading(&mut self, position: Point3<i32>, level: f32) {
        if let Some(node) = self.state.get_mut().attached.get_mut(&position) {
            node.light = level;
        }
    }

    fn add_body(&mut self, shape: CollisionShape) -> BodyId {
        let mut state = self.state.get_mut();
        let id = BodyId(state.next_body);
        state.next_body += 1;
        state.bodies_added += 1;
        state.bodies.insert(id, shape);
        id
    }

    fn remove_body(&mut self, body: BodyId) {
        let mut state = self.state.get_mut();
        if state.bodies.remove(&body).is_some() {
            state.bodies_removed += 1;
        }
    }

    /// Walks the grid cells along the ray and returns the first attached one.
    ///
    /// The cell containing the origin is never reported.
    fn raycast(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<RayHit> {
        if direction.magnitude2() == 0.0 {
            return None;
        }
        let direction = direction.normalize();
        let state = self.state.get();

        let mut cell = Point3::new(
            origin.x.floor() as i32,
            origin.y.floor() as i32,
            origin.z.floor() as i32,
        );
        let step = Vector3::new(
            direction.x.signum() as i32,
            direction.y.signum() as i32,
            direction.z.signum() as i32,
        );
        let boundary = |o: f32, d: f32, c: i32| {
            if d > 0.0 {
                ((c + 1) as f32 - o) / d
            } else if d < 0.0 {
                (c as f32 - o) / d
            } else {
                f32::INFINITY
            }
        };
        let mut t_max = Vector3::new(
            boundary(origin.x, direction.x, cell.x),
            boundary(origin.y, direction.y, cell.y),
            boundary(origin.z, direction.z, cell.z),
        );
        let t_delta = Vector3::new(
            (1.0 / direction.x).abs(),
            (1.0 / direction.y).abs(),
            (1.0 / direction.z).abs(),
        );

        loop {
            let (distance, normal) = if t_max.x <= t_max.y && t_max.x <= t_max.z {
                cell.x += step.x;
                let t = t_max.x;
                t_max.x += t_delta.x;
                (t, Vector3::new(-step.x, 0, 0))
            } else if t_max.y <= t_max.z {
                cell.y += step.y;
                let t = t_max.y;
                t_max.y += t_delta.y;
                (t, Vector3::new(0, -step.y, 0))
            } else {
                cell.z += step.z;
                let t = t_max.z;
                t_max.z += t_delta.z;
                (t, Vector3::new(0, 0, -step.z))
            };

            if distance > max_distance {
                return None;
            }
            if state.attached.contains_key(&cell) {
                return Some(RayHit {
                    block: cell,
                    normal,
                    distance,
                });
            }
        }
    }
}

/// [`ShapeBuilder`] that merges runs of cubes along x into boxes.
#[derive(Default)]
pub struct BoxShapeBuilder {
    builds: AtomicUsize,
    failures_left: AtomicUsize,
}

impl BoxShapeBuilder {
    /// Creates a builder that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder whose first `count` builds fail.
    pub fn failing_first(count: usize) -> Self {
        BoxShapeBuilder {
            builds: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(count),
        }
    }

    /// Number of build attempts so far, failed ones included.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ShapeBuilder for BoxShapeBuilder {
    fn build_collision_shape(&self, geometry: &GeometrySet) -> EngineResult<CollisionShape> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(EngineError::ShapeBuild {
                coord: geometry.chunk,
                reason: "backend rejected the shape".to_string(),
            });
        }

        let mut cubes = geometry.cubes.clone();
        cubes.sort_by_key(|cube| (cube.z, cube.y, cube.x));

        let mut boxes: Vec<Aabb> = Vec::new();
        let mut run: Option<(Point3<i32>, i32)> = None;
        for cube in cubes {
            run = match run {
                Some((start, end)) if start.y == cube.y && start.z == cube.z && end == cube.x => {
                    Some((start, end + 1))
                }
                Some((start, end)) => {
                    boxes.push(run_box(start, end));
                    Some((cube, cube.x + 1))
                }
                None => Some((cube, cube.x + 1)),
            };
        }
        if let Some((start, end)) = run {
            boxes.push(run_box(start, end));
        }

        Ok(CollisionShape {
            chunk: geometry.chunk,
            boxes,
        })
    }
}

fn run_box(start: Point3<i32>, end_x: i32) -> Aabb {
    Aabb {
        min: Point3::new(start.x as f32, start.y as f32, start.z as f32),
        max: Point3::new(end_x as f32, (start.y + 1) as f32, (start.z + 1) as f32),
    }
}
