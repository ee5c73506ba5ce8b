//! Read-only snapshot of a scan for visualizers.
//!
//! Nothing in here feeds back into simulation; it only repackages the casts and
//! hits of the last pass (or a preview of the casts) with slice tags.

use crate::{
    planner::ScanPlan,
    pose::WheelPose,
    query::BoxCast,
    sampler::{ContactSampler, RawHit},
    settings::DEBUG_HEAT_SCALE,
    types::{Quat, Vec3},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayGizmo {
    pub slice_index: usize,
    pub ray_index: usize,
    pub is_side: bool,
    pub origin: Vec3,
    pub direction: Vec3,
    pub orientation: Quat,
    pub half_extents: Vec3,
    pub max_distance: f32,
    pub hit_distance: Option<f32>,
    pub hit_point: Option<Vec3>,
    pub penetration: f32,
}

impl RayGizmo {
    /// How far to draw the cast: up to the hit, or the full distance on a miss.
    #[inline]
    pub fn draw_length(&self) -> f32 {
        self.hit_distance.unwrap_or(self.max_distance)
    }

    /// Box center at the end of the drawn segment.
    #[inline]
    pub fn end_point(&self) -> Vec3 {
        self.origin + self.direction * self.draw_length()
    }

    /// Penetration mapped to 0..1 for color blending.
    #[inline]
    pub fn heat(&self) -> f32 {
        (self.penetration * DEBUG_HEAT_SCALE).clamp(0.0, 1.0)
    }

    pub fn is_hit(&self) -> bool {
        self.hit_distance.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanDebugFrame {
    pub wheel_position: Vec3,
    pub ground_normal: Vec3,
    pub rays: Vec<RayGizmo>,
}

fn gizmo(plan: &ScanPlan, index: usize, cast: &BoxCast, hit: Option<&RawHit>) -> RayGizmo {
    let ray_count = plan.ray_count().max(1);
    let slice_index = index / ray_count;
    let is_side = plan
        .slices()
        .get(slice_index)
        .is_some_and(|slice| slice.is_side);
    let hit = hit.filter(|h| h.is_hit);

    RayGizmo {
        slice_index,
        ray_index: index % ray_count,
        is_side,
        origin: cast.origin,
        direction: cast.direction,
        orientation: cast.orientation,
        half_extents: cast.half_extents,
        max_distance: cast.max_distance,
        hit_distance: hit.and_then(|h| h.distance),
        hit_point: hit.map(|h| h.point),
        penetration: hit.map_or(0.0, |h| h.penetration),
    }
}

impl<M: Clone> ContactSampler<M> {
    /// Snapshot of the last completed pass.
    pub fn debug_frame(&self, wheel_position: Vec3) -> ScanDebugFrame {
        ScanDebugFrame {
            wheel_position,
            ground_normal: self.result().ground_normal,
            rays: self
                .raw_hits()
                .iter()
                .enumerate()
                .map(|(i, hit)| gizmo(self.plan(), i, &hit.cast, Some(hit)))
                .collect(),
        }
    }

    /// Casts for `pose` with no hit information, for drawing before any pass ran.
    pub fn preview_frame(&self, pose: &WheelPose) -> ScanDebugFrame {
        ScanDebugFrame {
            wheel_position: pose.position,
            ground_normal: self.result().ground_normal,
            rays: self
                .casts_for(pose)
                .iter()
                .enumerate()
                .map(|(i, cast)| gizmo(self.plan(), i, cast, None))
                .collect(),
        }
    }
}
