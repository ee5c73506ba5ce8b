pub mod bitmask_flags;
pub mod config;
pub mod debug;
pub mod error;
pub mod planner;
pub mod pose;
pub mod query;
pub mod rapier;
pub mod rapier_world;
pub mod sampler;
pub mod settings;
pub mod types;

pub use bitmask_flags::{BitmaskFlags, LayerMask};
pub use config::{BoxSize, ScannerConfig, SliceSettings};
pub use debug::{RayGizmo, ScanDebugFrame};
pub use error::{ScanError, ScanResult};
pub use planner::{CachedRay, ScanPlan, ScanSlice, pitch_angles};
pub use pose::{PoseProvider, WheelPose, hub_rotation};
pub use query::{BoxCast, CastHit, ShapeCaster};
pub use rapier::{ColliderShapeDef, WorldStaticDef, collider_from_def};
pub use rapier_world::{ColliderMaterial, RapierCaster, RapierQueryWorld};
pub use sampler::{ContactResult, ContactSampler, RawHit, StepTiming, smooth_normal};
