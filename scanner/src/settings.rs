/*!
Wheel scanner defaults, limits and tolerances.

These constants centralize the values used by the scan planner, the contact
sampler and configuration validation. Keeping them together makes tuning
easier and keeps the defaults in one place.

Notes
- Distances are in meters, time in seconds, angles in degrees.
- The authored limits are advisory. The planner accepts anything; only
  `ScannerConfig::validate` looks at them.
*/

/// Default number of rays per slice.
pub const DEFAULT_RAY_COUNT: u32 = 7;

/// Authored ray count limits (inclusive).
pub const MIN_RAY_COUNT: u32 = 1;
pub const MAX_RAY_COUNT: u32 = 15;

/// Default angular spread of the fan (degrees).
pub const DEFAULT_SCAN_RANGE: f32 = 100.0;

/// Default fan center pitch (degrees). 90 points straight down the hub.
pub const DEFAULT_SCAN_CENTER_ANGLE: f32 = 90.0;

/// Authored angle limits (degrees, inclusive) for both range and center.
pub const MIN_SCAN_ANGLE: f32 = 0.0;
pub const MAX_SCAN_ANGLE: f32 = 360.0;

/// A range of exactly this many degrees wraps around; the seam ray is not duplicated.
pub const FULL_CIRCLE_DEGREES: f32 = 360.0;

/// Authored wheel spacer limits (meters, inclusive).
pub const MIN_WHEEL_OFFSET: f32 = 0.0;
pub const MAX_WHEEL_OFFSET: f32 = 3.0;

/// Default center slice box (width, height, depth) in meters.
pub const DEFAULT_CENTER_BOX: [f32; 3] = [0.15, 0.12, 0.01];

/// Default center slice cast distance (meters).
pub const DEFAULT_CENTER_CAST_DISTANCE: f32 = 0.66;

/// Default side pair lateral offset (meters).
pub const DEFAULT_SIDE_OFFSET: f32 = 0.15;

/// Default side pair box (width, height, depth) in meters.
pub const DEFAULT_SIDE_BOX: [f32; 3] = [0.15, 0.12, 0.01];

/// Default side pair cast distance (meters).
pub const DEFAULT_SIDE_CAST_DISTANCE: f32 = 0.65;

/// Default side pair ray yaw tilt (degrees).
pub const DEFAULT_SIDE_RAY_ANGLE: f32 = 3.90;

/// Default side pair box yaw tilt (degrees).
pub const DEFAULT_SIDE_BOX_ANGLE: f32 = 10.0;

/// Default exponential smoothing rate of the ground normal (1/s).
/// At a 50 Hz fixed step this blends 30% of the way toward the target per tick.
pub const DEFAULT_NORMAL_SMOOTHING_RATE: f32 = 15.0;

/// Squared length under which the hub forward vector is treated as zero
/// (axle parallel to chassis up).
pub const HUB_DEGENERATE_SQ: f32 = 1.0e-10;

/// Squared length under which the weighted normal sum is treated as zero.
pub const NORMAL_SUM_EPS_SQ: f32 = 1.0e-12;

/// Penetration scale used by visualizers to map depth to a 0..1 heat value.
pub const DEBUG_HEAT_SCALE: f32 = 10.0;
