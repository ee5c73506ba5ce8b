//! Conversions between Bevy's glam types and the scanner's nalgebra types.

use bevy::prelude::*;
use nalgebra as na;
use scanner::types as sc;

#[inline]
pub fn to_na(v: Vec3) -> sc::Vec3 {
    na::Vector3::new(v.x, v.y, v.z)
}

#[inline]
pub fn to_bevy(v: &sc::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn quat_to_na(q: Quat) -> sc::Quat {
    na::UnitQuaternion::from_quaternion(na::Quaternion::new(q.w, q.x, q.y, q.z))
}

#[inline]
pub fn quat_to_bevy(q: &sc::Quat) -> Quat {
    let c = q.quaternion().coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w)
}

/// World isometry of a transform; scale is dropped.
pub fn iso_from_transform(t: &Transform) -> sc::Iso {
    na::Isometry3::from_parts(
        na::Translation3::from(to_na(t.translation)),
        quat_to_na(t.rotation),
    )
}
