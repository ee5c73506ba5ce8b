//! Wheel pose input and the non-spinning hub frame derived from it.

use crate::{
    settings::HUB_DEGENERATE_SQ,
    types::{Iso, Quat, Vec3},
};

/// World-space pose of one wheel for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelPose {
    /// Wheel center.
    pub position: Vec3,
    /// Lateral axle direction (the wheel's local +X in world space).
    pub axle: Vec3,
    /// Chassis up direction.
    pub chassis_up: Vec3,
}

impl WheelPose {
    pub fn new(position: Vec3, axle: Vec3, chassis_up: Vec3) -> Self {
        Self {
            position,
            axle,
            chassis_up,
        }
    }

    /// Pose from the wheel and chassis world isometries.
    ///
    /// The axle is the wheel's local +X, the up direction is the chassis' local +Y.
    /// Wheel spin about the axle changes neither.
    pub fn from_isometries(wheel: &Iso, chassis: &Iso) -> Self {
        Self {
            position: wheel.translation.vector,
            axle: wheel.rotation * Vec3::x(),
            chassis_up: chassis.rotation * Vec3::y(),
        }
    }

    /// Orientation of the wheel hub with spin removed. See [`hub_rotation`].
    #[inline]
    pub fn hub_rotation(&self) -> Quat {
        hub_rotation(&self.axle, &self.chassis_up)
    }
}

/// Supplies the current wheel pose, refreshed by the host before each sample.
pub trait PoseProvider {
    fn wheel_pose(&self) -> WheelPose;
}

impl PoseProvider for WheelPose {
    fn wheel_pose(&self) -> WheelPose {
        *self
    }
}

/// Build the hub rotation from the axle and the chassis up direction.
///
/// - forward = axle x up, hub_up = forward x axle
/// - The result maps local +Z to forward and local +Y to hub_up, so local +X
///   lines up with the axle. It depends only on the axle and up, never on spin.
/// - If the axle is parallel to up (forward is zero) the identity is returned.
pub fn hub_rotation(axle: &Vec3, chassis_up: &Vec3) -> Quat {
    let forward = axle.cross(chassis_up);
    if forward.norm_squared() <= HUB_DEGENERATE_SQ {
        log::trace!("degenerate hub frame (axle parallel to up), using identity");
        return Quat::identity();
    }
    let hub_up = forward.cross(axle);
    Quat::face_towards(&forward, &hub_up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra as na;

    #[test]
    fn level_wheel_gives_identity_frame() {
        let rot = hub_rotation(&Vec3::x(), &Vec3::y());
        assert_relative_eq!(rot.angle(), 0.0, epsilon = 1.0e-6);
    }

    #[test]
    fn hub_frame_axes_follow_axle_and_up() {
        let axle = Vec3::new(1.0, 0.2, -0.3).normalize();
        let up = Vec3::new(0.1, 1.0, 0.05).normalize();
        let rot = hub_rotation(&axle, &up);

        let forward = axle.cross(&up).normalize();
        assert_relative_eq!(rot * Vec3::z(), forward, epsilon = 1.0e-5);
        assert_relative_eq!(rot * Vec3::x(), axle, epsilon = 1.0e-5);
    }

    #[test]
    fn degenerate_axle_falls_back_to_identity() {
        let rot = hub_rotation(&Vec3::y(), &Vec3::y());
        assert_eq!(rot, Quat::identity());
        let rot = hub_rotation(&Vec3::zeros(), &Vec3::y());
        assert_eq!(rot, Quat::identity());
    }

    #[test]
    fn spin_about_axle_does_not_change_hub_frame() {
        let chassis = Iso::identity();
        let base = Iso::from_parts(
            na::Translation3::new(1.0, 0.5, 2.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.3),
        );
        let reference = WheelPose::from_isometries(&base, &chassis).hub_rotation();

        for spin in [0.1_f32, 1.0, 2.5, 4.0] {
            let spun = Iso::from_parts(
                base.translation,
                base.rotation * Quat::from_axis_angle(&Vec3::x_axis(), spin),
            );
            let rot = WheelPose::from_isometries(&spun, &chassis).hub_rotation();
            assert_relative_eq!(rot * Vec3::z(), reference * Vec3::z(), epsilon = 1.0e-5);
            assert_relative_eq!(rot * Vec3::y(), reference * Vec3::y(), epsilon = 1.0e-5);
        }
    }
}
