//! Rapier-backed collision queries for the wheel scanner.
//!
//! [`RapierQueryWorld`] holds an immutable static scene built from
//! [`WorldStaticDef`]s. [`RapierCaster`] borrows it and answers the sampler's
//! box casts with `QueryPipeline::cast_shape`.
//!
//! Design goals
//! - Deterministic: given the same inputs (sorted by `id`), build identical in-memory sets.
//! - Query-focused: only what scene queries need is built and kept.
//! - Immutable world: statics do not move after construction.

// Re-export Rapier so downstream crates can use Rapier types without
// depending on `rapier3d` directly.
pub use rapier3d;

use rapier3d::{na::Translation3, parry::query::ShapeCastOptions, prelude::*};

use crate::{
    error::{ScanError, ScanResult},
    query::{BoxCast, CastHit, ShapeCaster},
    rapier::{WorldStaticDef, collider_from_def},
};

/// In-memory Rapier structures needed for scene queries against a static world.
pub struct RapierQueryWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
}

impl RapierQueryWorld {
    /// Build a query world from a list of static collider definitions.
    ///
    /// The input is sorted by `id` before insertion. NaN/invalid values should be
    /// filtered by the caller.
    pub fn build(mut defs: Vec<WorldStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        for def in defs.into_iter() {
            let iso = Isometry::from_parts(Translation3::from(def.translation), def.rotation);

            let rb = RigidBodyBuilder::fixed().pose(iso).build();
            let rb_handle = bodies.insert(rb);

            let collider = collider_from_def(&def);
            colliders.insert_with_parent(collider, rb_handle, &mut bodies);
        }

        // Collision detection only (no dynamics): updates the broad-phase BVH so
        // scene queries can run.
        let mut broad_phase = BroadPhaseBvh::new();
        let mut narrow_phase = NarrowPhase::new();
        let mut collision_pipeline = CollisionPipeline::new();

        let hooks = ();
        let events = ();

        collision_pipeline.step(
            0.0,
            &mut broad_phase,
            &mut narrow_phase,
            &mut bodies,
            &mut colliders,
            &hooks,
            &events,
        );

        log::debug!("built static query world with {} colliders", colliders.len());

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase,
        }
    }

    /// Borrowed `QueryPipeline` view for scene queries.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }
}

/// Surface material reported for a Rapier hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColliderMaterial {
    pub collider: ColliderHandle,
    pub friction: f32,
    pub restitution: f32,
}

/// [`ShapeCaster`] over a [`RapierQueryWorld`].
pub struct RapierCaster<'w> {
    world: &'w RapierQueryWorld,
    exclude_rigid_body: Option<RigidBodyHandle>,
}

impl<'w> RapierCaster<'w> {
    pub fn new(world: &'w RapierQueryWorld) -> Self {
        Self {
            world,
            exclude_rigid_body: None,
        }
    }

    /// Ignore every collider attached to `body` (e.g. the vehicle's own chassis).
    pub fn excluding_body(mut self, body: RigidBodyHandle) -> Self {
        self.exclude_rigid_body = Some(body);
        self
    }
}

impl ShapeCaster for RapierCaster<'_> {
    type Material = ColliderMaterial;

    fn cast_box(&mut self, cast: &BoxCast) -> ScanResult<Option<CastHit<ColliderMaterial>>> {
        if !cast.is_finite() {
            return Err(ScanError::QueryFailed(format!(
                "refusing non-finite box cast from {:?}",
                cast.origin
            )));
        }

        let layers = cast.layers;
        let on_layer = |_: ColliderHandle, collider: &Collider| layers.accepts(collider.user_data as u32);
        let mut filter = QueryFilter::default().predicate(&on_layer);
        if let Some(body) = self.exclude_rigid_body {
            filter = filter.exclude_rigid_body(body);
        }

        let pipeline = self.world.query_pipeline(filter);
        let shape = Cuboid::new(cast.half_extents);
        let shape_pos = Isometry::from_parts(Translation3::from(cast.origin), cast.orientation);
        let options = ShapeCastOptions::with_max_time_of_impact(cast.max_distance);

        let Some((handle, hit)) = pipeline.cast_shape(&shape_pos, &cast.direction, &shape, options)
        else {
            return Ok(None);
        };

        // Report the normal facing back along the cast, like a ground normal.
        let mut normal = hit.normal1.into_inner();
        if normal.dot(&cast.direction) > 0.0 {
            normal = -normal;
        }

        let material = self.world.colliders.get(handle).map(|co| ColliderMaterial {
            collider: handle,
            friction: co.friction(),
            restitution: co.restitution(),
        });

        Ok(Some(CastHit {
            distance: hit.time_of_impact,
            point: hit.witness1.coords,
            normal,
            material,
        }))
    }
}
