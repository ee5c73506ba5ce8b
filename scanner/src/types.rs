/*!
Core math aliases and frame helpers shared by the planner and the sampler.

Conventions
- World space is right-handed with +Y up.
- The hub frame looks along +Z (non-spinning forward), +Y is hub up and +X
  is the wheel axle.
- Angles in configuration are degrees; they are converted at the edge.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Local forward of the hub frame. Cached directions are this vector rotated.
#[inline]
pub fn forward() -> Vec3 {
    Vec3::z()
}

/// World "up", used as the fallback ground normal.
#[inline]
pub fn world_up() -> Vec3 {
    Vec3::y()
}

/// Rotation of `degrees` about the hub's lateral (axle, +X) axis.
///
/// Positive pitch turns +Z toward -Y, so 90 degrees points the ray straight down.
#[inline]
pub fn pitch(degrees: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::x_axis(), degrees.to_radians())
}

/// Rotation of `degrees` about the hub's up (+Y) axis. Positive yaw turns +Z toward +X.
#[inline]
pub fn yaw(degrees: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), degrees.to_radians())
}

/// Componentwise finiteness check used before handing values to a query backend.
#[inline]
pub fn is_finite_vec(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}
