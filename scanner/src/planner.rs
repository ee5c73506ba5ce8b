/*!
Scan planner: expands a [`ScannerConfig`] into the slice table and the cached
hub-local ray table.

Layout
- Slice 0 is the center slice. Each side pair then emits its left member
  (signed fields negated) followed by its right member (as authored).
- Rays are stored slice-major: `index = slice_index * ray_count + ray_index`.
- Every cached direction and box orientation is expressed in the hub frame, so
  the tables never depend on wheel spin or world pose. Sampling only has to
  rotate them by the hub rotation.
*/

use crate::{
    config::{BoxSize, ScannerConfig, SliceSettings},
    settings::FULL_CIRCLE_DEGREES,
    types::{Quat, Vec3, forward, pitch, yaw},
};

/// One lateral cross-section of the fan, signed and flattened from configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanSlice {
    /// Signed lateral offset along the axle (meters).
    pub offset: f32,
    pub box_size: BoxSize,
    /// Signed box yaw tilt (degrees).
    pub box_angle: f32,
    /// Signed ray yaw tilt (degrees).
    pub ray_angle: f32,
    pub max_distance: f32,
    pub is_side: bool,
}

impl ScanSlice {
    fn center(settings: &SliceSettings) -> Self {
        Self {
            offset: 0.0,
            box_size: settings.box_size,
            box_angle: settings.box_angle,
            ray_angle: settings.ray_angle,
            max_distance: settings.cast_distance,
            is_side: false,
        }
    }

    /// Left (mirrored) and right (authored) members of a side pair.
    fn side_pair(settings: &SliceSettings) -> [Self; 2] {
        let right = Self {
            offset: settings.offset,
            box_size: settings.box_size,
            box_angle: settings.box_angle,
            ray_angle: settings.ray_angle,
            max_distance: settings.cast_distance,
            is_side: true,
        };
        let left = Self {
            offset: -right.offset,
            box_angle: -right.box_angle,
            ray_angle: -right.ray_angle,
            ..right
        };
        [left, right]
    }
}

/// A cast direction and box orientation in the hub frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CachedRay {
    pub local_direction: Vec3,
    pub local_box_rotation: Quat,
}

/// Pitch angles (degrees) of the `ray_count` rays of one slice.
///
/// - `ray_count <= 1`: a single ray at `center`.
/// - Otherwise rays span `[center - range/2, center + range/2]`. The step is
///   `range / ray_count` for a full 360 degree wrap (so the seam is not cast twice)
///   and `range / (ray_count - 1)` otherwise (both endpoints included).
pub fn pitch_angles(ray_count: u32, range: f32, center: f32) -> Vec<f32> {
    if ray_count == 0 {
        return Vec::new();
    }
    if ray_count == 1 {
        return vec![center];
    }

    let step = if range == FULL_CIRCLE_DEGREES {
        range / ray_count as f32
    } else {
        range / (ray_count - 1) as f32
    };
    let start = center - range * 0.5;

    (0..ray_count).map(|i| start + i as f32 * step).collect()
}

/// Expand the authored slices: center first, then each pair as (left, right).
pub fn build_slices(config: &ScannerConfig) -> Vec<ScanSlice> {
    let mut slices = Vec::with_capacity(config.slice_count());
    slices.push(ScanSlice::center(&config.center_slice));
    for pair in &config.side_slice_pairs {
        slices.extend(ScanSlice::side_pair(pair));
    }
    slices
}

/// Cached slice and ray tables for one configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanPlan {
    ray_count: usize,
    slices: Vec<ScanSlice>,
    rays: Vec<CachedRay>,
}

impl ScanPlan {
    /// Build both tables from `config`. Pure function of the configuration.
    pub fn build(config: &ScannerConfig) -> Self {
        let slices = build_slices(config);
        let angles = pitch_angles(config.ray_count, config.scan_range, config.scan_center_angle);
        let ray_count = angles.len();

        let mut rays = Vec::with_capacity(ray_count * slices.len());
        for slice in &slices {
            let ray_yaw = yaw(slice.ray_angle);
            let box_yaw = yaw(slice.box_angle);
            for &angle in &angles {
                let pitch_rot = pitch(angle);
                rays.push(CachedRay {
                    local_direction: (pitch_rot * ray_yaw) * forward(),
                    local_box_rotation: pitch_rot * box_yaw,
                });
            }
        }

        log::debug!(
            "built scan plan: {} slices x {} rays = {} casts",
            slices.len(),
            ray_count,
            rays.len()
        );

        Self {
            ray_count,
            slices,
            rays,
        }
    }

    #[inline]
    pub fn ray_count(&self) -> usize {
        self.ray_count
    }

    #[inline]
    pub fn slices(&self) -> &[ScanSlice] {
        &self.slices
    }

    #[inline]
    pub fn rays(&self) -> &[CachedRay] {
        &self.rays
    }

    /// Rays belonging to `slice_index`, in ray order.
    pub fn slice_rays(&self, slice_index: usize) -> &[CachedRay] {
        let start = slice_index * self.ray_count;
        &self.rays[start..start + self.ray_count]
    }

    /// Flat index of a (slice, ray) pair.
    #[inline]
    pub fn index(&self, slice_index: usize, ray_index: usize) -> usize {
        slice_index * self.ray_count + ray_index
    }

    /// Whether the tables were built for the same ray and slice counts as `config`.
    ///
    /// A mismatch means the configuration changed under the plan and the tables
    /// must be rebuilt before the next sample.
    pub fn matches(&self, config: &ScannerConfig) -> bool {
        self.ray_count == config.ray_count as usize
            && self.slices.len() == config.slice_count()
            && self.rays.len() == self.ray_count * self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SliceSettings;
    use approx::assert_relative_eq;

    fn config_with_pairs(ray_count: u32, pairs: usize) -> ScannerConfig {
        ScannerConfig {
            ray_count,
            side_slice_pairs: (0..pairs)
                .map(|i| SliceSettings {
                    offset: 0.1 * (i + 1) as f32,
                    ray_angle: 2.0 + i as f32,
                    box_angle: 5.0 + i as f32,
                    cast_distance: 0.5 + 0.01 * i as f32,
                    box_size: BoxSize::new(0.1, 0.2, 0.03 + 0.01 * i as f32),
                })
                .collect(),
            ..ScannerConfig::default()
        }
    }

    #[test]
    fn table_sizes_follow_counts() {
        for ray_count in [1, 2, 7, 15] {
            for pairs in 0..4 {
                let cfg = config_with_pairs(ray_count, pairs);
                let plan = ScanPlan::build(&cfg);
                assert_eq!(plan.slices().len(), 1 + 2 * pairs);
                assert_eq!(plan.rays().len(), ray_count as usize * (1 + 2 * pairs));
                assert!(plan.matches(&cfg));
            }
        }
    }

    #[test]
    fn side_pairs_are_mirrored_left_then_right() {
        let cfg = config_with_pairs(3, 2);
        let plan = ScanPlan::build(&cfg);
        let slices = plan.slices();

        assert!(!slices[0].is_side);
        assert_eq!(slices[0].offset, 0.0);

        for (pair_index, settings) in cfg.side_slice_pairs.iter().enumerate() {
            let left = slices[1 + 2 * pair_index];
            let right = slices[2 + 2 * pair_index];

            assert!(left.is_side && right.is_side);
            assert_eq!(left.box_size, right.box_size);
            assert_eq!(left.max_distance, right.max_distance);
            assert_eq!(left.offset, -right.offset);
            assert_eq!(left.ray_angle, -right.ray_angle);
            assert_eq!(left.box_angle, -right.box_angle);

            assert_eq!(right.offset, settings.offset);
            assert_eq!(right.ray_angle, settings.ray_angle);
            assert_eq!(right.max_distance, settings.cast_distance);
        }
    }

    #[test]
    fn angles_are_evenly_spaced_with_inclusive_endpoints() {
        let angles = pitch_angles(5, 100.0, 90.0);
        let expected = [40.0, 65.0, 90.0, 115.0, 140.0];
        assert_eq!(angles.len(), expected.len());
        for (a, e) in angles.iter().zip(expected) {
            assert_relative_eq!(*a, e, epsilon = 1.0e-4);
        }
    }

    #[test]
    fn full_circle_does_not_duplicate_the_seam() {
        let angles = pitch_angles(4, 360.0, 90.0);
        let expected = [-90.0, 0.0, 90.0, 180.0];
        for (a, e) in angles.iter().zip(expected) {
            assert_relative_eq!(*a, e, epsilon = 1.0e-4);
        }
        // First and last rays are a full step apart, not coincident.
        assert_relative_eq!(angles[3] - angles[0], 270.0, epsilon = 1.0e-4);
    }

    #[test]
    fn single_ray_uses_center_regardless_of_range() {
        for range in [0.0, 45.0, 100.0, 360.0] {
            assert_eq!(pitch_angles(1, range, 73.0), vec![73.0]);
        }
    }

    #[test]
    fn zero_rays_builds_empty_ray_table() {
        let plan = ScanPlan::build(&config_with_pairs(0, 1));
        assert_eq!(plan.slices().len(), 3);
        assert!(plan.is_empty());
        assert_eq!(plan.ray_count(), 0);
    }

    #[test]
    fn center_ray_of_default_fan_points_down() {
        let cfg = ScannerConfig {
            side_slice_pairs: Vec::new(),
            ..ScannerConfig::default()
        };
        let plan = ScanPlan::build(&cfg);
        // Seven rays over 100 degrees centered at 90: the middle one is straight down.
        let mid = plan.rays()[3];
        assert_relative_eq!(mid.local_direction, -Vec3::y(), epsilon = 1.0e-5);
    }

    #[test]
    fn cached_directions_are_unit_and_combine_pitch_then_yaw() {
        let cfg = config_with_pairs(5, 1);
        let plan = ScanPlan::build(&cfg);
        let angles = pitch_angles(5, cfg.scan_range, cfg.scan_center_angle);

        for (s, slice) in plan.slices().iter().enumerate() {
            for (i, ray) in plan.slice_rays(s).iter().enumerate() {
                assert_relative_eq!(ray.local_direction.norm(), 1.0, epsilon = 1.0e-5);
                let expected = pitch(angles[i]) * (yaw(slice.ray_angle) * Vec3::z());
                assert_relative_eq!(ray.local_direction, expected, epsilon = 1.0e-5);
                let expected_box = pitch(angles[i]) * yaw(slice.box_angle);
                for axis in [Vec3::x(), Vec3::y(), Vec3::z()] {
                    assert_relative_eq!(
                        ray.local_box_rotation * axis,
                        expected_box * axis,
                        epsilon = 1.0e-5
                    );
                }
            }
        }
    }

    #[test]
    fn mirrored_slices_tilt_to_opposite_sides() {
        let cfg = config_with_pairs(1, 1);
        let plan = ScanPlan::build(&cfg);
        let left = plan.slice_rays(1)[0].local_direction;
        let right = plan.slice_rays(2)[0].local_direction;
        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert_relative_eq!(left.x, -right.x, epsilon = 1.0e-6);
    }

    #[test]
    fn count_change_is_detected() {
        let cfg = config_with_pairs(5, 1);
        let plan = ScanPlan::build(&cfg);
        assert!(!plan.matches(&config_with_pairs(6, 1)));
        assert!(!plan.matches(&config_with_pairs(5, 2)));
        assert_eq!(plan.index(2, 3), 13);
    }
}
