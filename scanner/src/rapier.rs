use rapier3d::{na::UnitQuaternion, prelude::*};

use crate::bitmask_flags::LayerMask;

/// Canonical definition of an immutable world collider the wheels can drive on.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - For planes the normal is derived from the pose: `normal = rotation * +Y`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vector<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
    /// Layers this surface belongs to. Stored in the collider's `user_data`.
    pub layers: LayerMask,
    /// Surface friction coefficient, reported back through the scan material.
    pub friction: f32,
    pub restitution: f32,
}

impl WorldStaticDef {
    /// A surface with default material (friction 0.5, no bounce) on every layer.
    pub fn new(
        id: u32,
        translation: Vector<f32>,
        rotation: UnitQuaternion<f32>,
        shape: ColliderShapeDef,
    ) -> Self {
        Self {
            id,
            translation,
            rotation,
            shape,
            layers: LayerMask::all(),
            friction: ColliderBuilder::default_friction(),
            restitution: 0.0,
        }
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space) with normal `rotation * +Y`, shifted along
    /// that normal by `offset_along_normal` (meters).
    Plane { offset_along_normal: f32 },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Y-aligned cone (meters).
    ConeY { radius: f32, half_height: f32 },

    /// Rounded cuboid (meters). `border_radius` rounds all edges/corners.
    RoundCuboid {
        half_extents: Vector<f32>,
        border_radius: f32,
    },
}

/// Build a Rapier collider from a `WorldStaticDef`, relative to a parent body
/// that carries the definition's pose.
///
/// Layer bits go in the low 32 bits of `user_data`; the scan caster filters on them.
pub fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let builder = match &def.shape {
        // In the parent frame the plane normal is +Y; the body rotation turns it.
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => ColliderBuilder::new(SharedShape::new(HalfSpace::new(Vector::y_axis())))
            .translation(Vector::y() * *offset_along_normal),

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),

        ColliderShapeDef::ConeY {
            radius,
            half_height,
        } => ColliderBuilder::cone(*half_height, *radius),

        ColliderShapeDef::RoundCuboid {
            half_extents,
            border_radius,
        } => ColliderBuilder::round_cuboid(
            half_extents.x,
            half_extents.y,
            half_extents.z,
            *border_radius,
        ),
    };

    builder
        .friction(def.friction)
        .restitution(def.restitution)
        .user_data(def.layers.bits as u128)
        .build()
}
