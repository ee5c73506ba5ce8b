/*!
Authored scanner configuration.

`ScannerConfig` is the static input of the scan planner. It deserializes from
TOML with every field optional (missing fields take the defaults from
[`crate::settings`]), so a file only needs to list what it overrides:

```toml
ray_count = 9
scan_range = 120.0

[center_slice]
box_size = { width = 0.2, height = 0.12, depth = 0.01 }
cast_distance = 0.7

[[side_slice_pairs]]
offset = 0.12
ray_angle = 4.0
box_angle = 8.0
cast_distance = 0.65
```
*/

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    bitmask_flags::LayerMask,
    error::{ScanError, ScanResult},
    settings::*,
    types::Vec3,
};

/// Size of a cast box (meters): width across the axle, height, depth along the cast.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxSize {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl BoxSize {
    pub const fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    const fn from_array(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    /// Half extents in hub-local axes (x = width, y = height, z = depth).
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth) * 0.5
    }

    fn is_valid(&self) -> bool {
        [self.width, self.height, self.depth]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Settings of one authored slice.
///
/// For the center slice `offset` is ignored (the center always sits on the wheel
/// plane). For a side pair, the signed fields (`offset`, `ray_angle`,
/// `box_angle`) describe the right member; the left member mirrors them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceSettings {
    /// Lateral offset along the axle (meters).
    pub offset: f32,
    pub box_size: BoxSize,
    /// Yaw tilt of the cast box about hub up (degrees).
    pub box_angle: f32,
    /// Yaw tilt of the cast direction about hub up (degrees).
    pub ray_angle: f32,
    /// Maximum cast distance (meters).
    pub cast_distance: f32,
}

impl SliceSettings {
    pub fn center_default() -> Self {
        Self {
            offset: 0.0,
            box_size: BoxSize::from_array(DEFAULT_CENTER_BOX),
            box_angle: 0.0,
            ray_angle: 0.0,
            cast_distance: DEFAULT_CENTER_CAST_DISTANCE,
        }
    }

    pub fn side_default() -> Self {
        Self {
            offset: DEFAULT_SIDE_OFFSET,
            box_size: BoxSize::from_array(DEFAULT_SIDE_BOX),
            box_angle: DEFAULT_SIDE_BOX_ANGLE,
            ray_angle: DEFAULT_SIDE_RAY_ANGLE,
            cast_distance: DEFAULT_SIDE_CAST_DISTANCE,
        }
    }
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self::side_default()
    }
}

fn default_center_slice() -> SliceSettings {
    SliceSettings::center_default()
}

/// The center slice fills missing fields from the center defaults rather than
/// the side defaults, and has no offset.
fn deserialize_center_slice<'de, D: Deserializer<'de>>(d: D) -> Result<SliceSettings, D::Error> {
    #[derive(Deserialize)]
    #[serde(default)]
    struct Center {
        box_size: BoxSize,
        box_angle: f32,
        ray_angle: f32,
        cast_distance: f32,
    }

    impl Default for Center {
        fn default() -> Self {
            let c = SliceSettings::center_default();
            Self {
                box_size: c.box_size,
                box_angle: c.box_angle,
                ray_angle: c.ray_angle,
                cast_distance: c.cast_distance,
            }
        }
    }

    let c = Center::deserialize(d)?;
    Ok(SliceSettings {
        offset: 0.0,
        box_size: c.box_size,
        box_angle: c.box_angle,
        ray_angle: c.ray_angle,
        cast_distance: c.cast_distance,
    })
}

/// Complete scanner configuration for one wheel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Extra lateral spacer applied to every slice (meters).
    pub wheel_offset: f32,
    /// Rays per slice. Authored range [1, 15].
    pub ray_count: u32,
    /// Angular spread of the fan (degrees). Authored range [0, 360].
    pub scan_range: f32,
    /// Pitch of the fan center (degrees). Authored range [0, 360].
    pub scan_center_angle: f32,
    /// Layers the casts may hit.
    pub scan_layers: LayerMask,
    #[serde(
        default = "default_center_slice",
        deserialize_with = "deserialize_center_slice"
    )]
    pub center_slice: SliceSettings,
    /// Ordered side pairs; each expands to two mirrored slices.
    pub side_slice_pairs: Vec<SliceSettings>,
    /// Exponential smoothing rate of the ground normal (1/s).
    pub normal_smoothing_rate: f32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            wheel_offset: 0.0,
            ray_count: DEFAULT_RAY_COUNT,
            scan_range: DEFAULT_SCAN_RANGE,
            scan_center_angle: DEFAULT_SCAN_CENTER_ANGLE,
            scan_layers: LayerMask::all(),
            center_slice: SliceSettings::center_default(),
            side_slice_pairs: vec![SliceSettings::side_default()],
            normal_smoothing_rate: DEFAULT_NORMAL_SMOOTHING_RATE,
        }
    }
}

impl ScannerConfig {
    /// Number of slices this configuration expands to: `1 + 2 * pairs`.
    #[inline]
    pub fn slice_count(&self) -> usize {
        1 + 2 * self.side_slice_pairs.len()
    }

    /// Number of casts per sample: `ray_count * slice_count`.
    #[inline]
    pub fn total_rays(&self) -> usize {
        self.ray_count as usize * self.slice_count()
    }

    pub fn from_toml_str(text: &str) -> ScanResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> ScanResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check every option against its authored range.
    ///
    /// The planner never calls this; out-of-range values are accepted as-is.
    /// Callers that load configuration from users decide what to do with the error.
    pub fn validate(&self) -> ScanResult<()> {
        let mut problems: Vec<String> = Vec::new();

        if !(MIN_RAY_COUNT..=MAX_RAY_COUNT).contains(&self.ray_count) {
            problems.push(format!(
                "ray_count {} outside [{MIN_RAY_COUNT}, {MAX_RAY_COUNT}]",
                self.ray_count
            ));
        }
        for (name, value) in [
            ("scan_range", self.scan_range),
            ("scan_center_angle", self.scan_center_angle),
        ] {
            if !value.is_finite() || !(MIN_SCAN_ANGLE..=MAX_SCAN_ANGLE).contains(&value) {
                problems.push(format!(
                    "{name} {value} outside [{MIN_SCAN_ANGLE}, {MAX_SCAN_ANGLE}]"
                ));
            }
        }
        if !self.wheel_offset.is_finite()
            || !(MIN_WHEEL_OFFSET..=MAX_WHEEL_OFFSET).contains(&self.wheel_offset)
        {
            problems.push(format!(
                "wheel_offset {} outside [{MIN_WHEEL_OFFSET}, {MAX_WHEEL_OFFSET}]",
                self.wheel_offset
            ));
        }
        if !self.normal_smoothing_rate.is_finite() || self.normal_smoothing_rate < 0.0 {
            problems.push(format!(
                "normal_smoothing_rate {} must be finite and non-negative",
                self.normal_smoothing_rate
            ));
        }

        let slices = std::iter::once(("center_slice".to_string(), &self.center_slice)).chain(
            self.side_slice_pairs
                .iter()
                .enumerate()
                .map(|(i, s)| (format!("side_slice_pairs[{i}]"), s)),
        );
        for (name, slice) in slices {
            if !slice.box_size.is_valid() {
                problems.push(format!("{name}.box_size must be finite and non-negative"));
            }
            if !slice.cast_distance.is_finite() || slice.cast_distance < 0.0 {
                problems.push(format!(
                    "{name}.cast_distance {} must be finite and non-negative",
                    slice.cast_distance
                ));
            }
            if ![slice.offset, slice.ray_angle, slice.box_angle]
                .iter()
                .all(|v| v.is_finite())
            {
                problems.push(format!("{name} has non-finite offset or angles"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ScanError::InvalidConfig(problems.join("; ")))
        }
    }
}
