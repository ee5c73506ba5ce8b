/*!
Collision query seam.

The sampler never talks to a physics engine directly. It describes each sweep
as a [`BoxCast`] and hands it to a [`ShapeCaster`], which reports the first
surface hit along the cast (if any). [`crate::rapier_world::RapierCaster`] is
the Rapier implementation; tests use scripted casters.
*/

use crate::{
    bitmask_flags::LayerMask,
    error::ScanResult,
    types::{Quat, Vec3, is_finite_vec},
};

/// One oriented-box sweep in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxCast {
    /// Box center at the start of the sweep.
    pub origin: Vec3,
    pub half_extents: Vec3,
    /// Unit sweep direction.
    pub direction: Vec3,
    /// Box orientation.
    pub orientation: Quat,
    /// Maximum travel along `direction` (meters).
    pub max_distance: f32,
    /// Only surfaces on these layers are reported.
    pub layers: LayerMask,
}

impl BoxCast {
    /// Box center after travelling `distance` along the cast.
    #[inline]
    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    pub fn is_finite(&self) -> bool {
        is_finite_vec(&self.origin)
            && is_finite_vec(&self.half_extents)
            && is_finite_vec(&self.direction)
            && self.orientation.coords.iter().all(|c| c.is_finite())
            && self.max_distance.is_finite()
    }
}

/// First surface struck by a [`BoxCast`].
#[derive(Clone, Debug, PartialEq)]
pub struct CastHit<M> {
    /// Travel along the cast direction before contact (meters).
    pub distance: f32,
    /// World-space contact point reported by the backend.
    pub point: Vec3,
    /// Surface normal, facing against the cast direction.
    pub normal: Vec3,
    /// Opaque handle of the struck surface's material, if it has one.
    pub material: Option<M>,
}

/// Collision query capability consumed by the sampler.
///
/// Implementations must be synchronous: every call returns the final answer for
/// its cast. Errors are propagated unchanged to the sampler's caller.
pub trait ShapeCaster {
    /// Opaque surface material handle. The scanner never interprets it.
    type Material: Clone;

    fn cast_box(&mut self, cast: &BoxCast) -> ScanResult<Option<CastHit<Self::Material>>>;
}

impl<C: ShapeCaster + ?Sized> ShapeCaster for &mut C {
    type Material = C::Material;

    fn cast_box(&mut self, cast: &BoxCast) -> ScanResult<Option<CastHit<Self::Material>>> {
        (**self).cast_box(cast)
    }
}
