/*!
Per-tick contact sampling for one wheel.

A [`ContactSampler`] owns everything one wheel needs between ticks: its
configuration, the cached [`ScanPlan`], the raw hit buffer of the last pass and
the [`ContactResult`] with its smoothed ground normal. Nothing is shared across
wheels; each wheel holds its own sampler.

A tick is two steps:
1. [`ContactSampler::sample`] casts every ray and folds the hits into the
   result (grounded flag, nearest distance, max penetration, material).
2. [`ContactSampler::update_ground_normal`] blends the penetration-weighted
   hit normal into the smoothed ground normal.

[`ContactSampler::scan`] runs both.

Failure policy
- The result is committed only after every ray has been folded. If the query
  backend fails part way, the error is returned and the previous tick's result
  and raw hits stay in place.
- Zero rays or zero slices issue no queries and produce an ungrounded result.
- An axle parallel to chassis up uses the identity hub rotation.
*/

use crate::{
    config::ScannerConfig,
    error::{ScanError, ScanResult},
    planner::{CachedRay, ScanPlan, ScanSlice},
    pose::{PoseProvider, WheelPose},
    query::{BoxCast, ShapeCaster},
    settings::NORMAL_SUM_EPS_SQ,
    types::{Quat, Vec3, is_finite_vec, world_up},
};

/// Outcome of one cast in the last completed pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawHit {
    /// The cast that produced this entry.
    pub cast: BoxCast,
    pub is_hit: bool,
    /// Travel before contact; `None` on a miss.
    pub distance: Option<f32>,
    /// Box center at contact (`origin + direction * distance`). Zero on a miss.
    pub point: Vec3,
    /// Surface normal. Zero on a miss.
    pub normal: Vec3,
    /// `max_distance - distance` on a hit, zero on a miss.
    pub penetration: f32,
}

impl RawHit {
    fn miss(cast: BoxCast) -> Self {
        Self {
            cast,
            is_hit: false,
            distance: None,
            point: Vec3::zeros(),
            normal: Vec3::zeros(),
            penetration: 0.0,
        }
    }
}

/// Aggregated wheel contact for the vehicle model.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactResult<M> {
    pub is_grounded: bool,
    /// Time-smoothed unit ground normal. Persists across ticks.
    pub ground_normal: Vec3,
    /// Shortest hit distance of the pass. `f32::INFINITY` when nothing was hit.
    pub nearest_hit_distance: f32,
    /// Largest `max_distance - distance` of the pass, zero when nothing was hit.
    pub max_penetration: f32,
    /// Material of the hit with the largest penetration.
    pub surface_material: Option<M>,
}

impl<M> Default for ContactResult<M> {
    fn default() -> Self {
        Self {
            is_grounded: false,
            ground_normal: world_up(),
            nearest_hit_distance: f32::INFINITY,
            max_penetration: 0.0,
            surface_material: None,
        }
    }
}

impl<M> ContactResult<M> {
    /// Nearest hit distance, only when grounded.
    pub fn nearest_distance(&self) -> Option<f32> {
        self.is_grounded.then_some(self.nearest_hit_distance)
    }
}

/// Time step used for normal smoothing.
///
/// Inside the fixed physics step the fixed delta applies; outside it (e.g. when
/// a visualizer refreshes the normal per frame) the variable frame delta does.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepTiming {
    Fixed(f32),
    Variable(f32),
}

impl StepTiming {
    #[inline]
    pub fn delta(&self) -> f32 {
        match *self {
            StepTiming::Fixed(dt) | StepTiming::Variable(dt) => dt,
        }
    }
}

/// Running accumulators of one pass, committed into [`ContactResult`] on success.
struct Pass<M> {
    is_grounded: bool,
    nearest_hit_distance: f32,
    max_penetration: f32,
    surface_material: Option<M>,
}

impl<M> Pass<M> {
    fn new() -> Self {
        Self {
            is_grounded: false,
            nearest_hit_distance: f32::INFINITY,
            max_penetration: 0.0,
            surface_material: None,
        }
    }
}

/// World-space cast for one cached ray.
///
/// The box starts half its depth behind the wheel-side origin so the sweep
/// begins just outside the wheel envelope.
pub fn cast_for_ray(
    config: &ScannerConfig,
    slice: &ScanSlice,
    ray: &CachedRay,
    pose: &WheelPose,
    hub: &Quat,
) -> BoxCast {
    let direction = hub * ray.local_direction;
    let orientation = hub * ray.local_box_rotation;
    let lateral = pose.axle * (config.wheel_offset + slice.offset);
    let origin = pose.position + lateral - direction * (slice.box_size.depth * 0.5);

    BoxCast {
        origin,
        half_extents: slice.box_size.half_extents(),
        direction,
        orientation,
        max_distance: slice.max_distance,
        layers: config.scan_layers,
    }
}

/// Penetration-weighted average of the hit normals, or world up when the
/// weighted sum vanishes (no hits, or normals cancelling out).
pub fn weighted_target_normal(hits: &[RawHit]) -> Vec3 {
    let sum = hits
        .iter()
        .filter(|h| h.is_hit)
        .fold(Vec3::zeros(), |acc, h| acc + h.normal * h.penetration);

    if sum.norm_squared() <= NORMAL_SUM_EPS_SQ {
        world_up()
    } else {
        sum.normalize()
    }
}

/// One step of exponential smoothing from `previous` toward `target`.
///
/// `blend = min(1, rate * dt)`; the blended vector is renormalized. A zero or
/// non-finite `previous` starts from world up, and an exactly opposite pair
/// (whose blend vanishes) snaps to `target`.
pub fn smooth_normal(previous: &Vec3, target: &Vec3, rate: f32, dt: f32) -> Vec3 {
    let current = if previous.norm_squared() <= NORMAL_SUM_EPS_SQ || !is_finite_vec(previous) {
        world_up()
    } else {
        *previous
    };
    let blend = (rate * dt).clamp(0.0, 1.0);
    let mixed = current.lerp(target, blend);

    if mixed.norm_squared() <= NORMAL_SUM_EPS_SQ {
        *target
    } else {
        mixed.normalize()
    }
}

/// Contact sampler for one wheel.
#[derive(Clone, Debug)]
pub struct ContactSampler<M> {
    config: ScannerConfig,
    plan: ScanPlan,
    raw_hits: Vec<RawHit>,
    scratch: Vec<RawHit>,
    result: ContactResult<M>,
}

impl<M: Clone> ContactSampler<M> {
    pub fn new(config: ScannerConfig) -> Self {
        let plan = ScanPlan::build(&config);
        Self {
            config,
            plan,
            raw_hits: Vec::new(),
            scratch: Vec::new(),
            result: ContactResult::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Replace the configuration and rebuild the tables.
    ///
    /// The smoothed ground normal is kept; raw hits of the old layout are dropped.
    pub fn set_config(&mut self, config: ScannerConfig) {
        self.config = config;
        self.rebuild();
    }

    /// Mutable access for in-place tweaks. Tables are checked and rebuilt, if
    /// the counts changed, at the start of the next sample.
    ///
    /// Edits that keep the counts do not invalidate the tables; follow them with
    /// [`ContactSampler::rebuild`].
    #[inline]
    pub fn config_mut(&mut self) -> &mut ScannerConfig {
        &mut self.config
    }

    /// Regenerate the slice and ray tables from the current configuration.
    pub fn rebuild(&mut self) {
        self.plan = ScanPlan::build(&self.config);
        self.raw_hits.clear();
    }

    #[inline]
    pub fn plan(&self) -> &ScanPlan {
        &self.plan
    }

    /// Result of the last successful pass.
    #[inline]
    pub fn result(&self) -> &ContactResult<M> {
        &self.result
    }

    /// Per-ray entries of the last successful pass, in slice-major order.
    #[inline]
    pub fn raw_hits(&self) -> &[RawHit] {
        &self.raw_hits
    }

    /// Rebuild the tables when their sizes disagree with the configuration.
    fn ensure_plan(&mut self) {
        if !self.plan.matches(&self.config) {
            log::debug!(
                "scan tables out of date ({} rays planned, {} expected), rebuilding",
                self.plan.rays().len(),
                self.config.total_rays()
            );
            self.rebuild();
        }
    }

    /// World-space casts for `pose` without querying anything, in table order.
    pub fn casts_for(&self, pose: &WheelPose) -> Vec<BoxCast> {
        let hub = pose.hub_rotation();
        let ray_count = self.plan.ray_count();
        self.plan
            .slices()
            .iter()
            .enumerate()
            .flat_map(|(s, slice)| {
                self.plan.rays()[s * ray_count..(s + 1) * ray_count]
                    .iter()
                    .map(move |ray| cast_for_ray(&self.config, slice, ray, pose, &hub))
            })
            .collect()
    }

    /// Cast every ray for `pose` and fold the hits into the contact result.
    ///
    /// Ties on maximum penetration keep the first hit in slice/ray order.
    /// The smoothed ground normal is not touched here.
    pub fn sample<P, Q>(&mut self, provider: &P, caster: &mut Q) -> ScanResult<&ContactResult<M>>
    where
        P: PoseProvider + ?Sized,
        Q: ShapeCaster<Material = M> + ?Sized,
    {
        self.ensure_plan();

        let pose = provider.wheel_pose();
        let hub = pose.hub_rotation();
        let ray_count = self.plan.ray_count();
        let mut pass = Pass::new();
        self.scratch.clear();

        for (s, slice) in self.plan.slices().iter().enumerate() {
            for i in 0..ray_count {
                let index = s * ray_count + i;
                let ray = &self.plan.rays()[index];
                let cast = cast_for_ray(&self.config, slice, ray, &pose, &hub);
                if !cast.is_finite() {
                    return Err(ScanError::NonFiniteCast { ray_index: index });
                }

                let Some(hit) = caster.cast_box(&cast)? else {
                    self.scratch.push(RawHit::miss(cast));
                    continue;
                };

                let penetration = slice.max_distance - hit.distance;
                self.scratch.push(RawHit {
                    cast,
                    is_hit: true,
                    distance: Some(hit.distance),
                    point: cast.point_at(hit.distance),
                    normal: hit.normal,
                    penetration,
                });

                pass.is_grounded = true;
                pass.nearest_hit_distance = pass.nearest_hit_distance.min(hit.distance);
                if penetration > pass.max_penetration {
                    pass.max_penetration = penetration;
                    pass.surface_material = hit.material;
                }
            }
        }

        std::mem::swap(&mut self.raw_hits, &mut self.scratch);
        self.result.is_grounded = pass.is_grounded;
        self.result.nearest_hit_distance = pass.nearest_hit_distance;
        self.result.max_penetration = pass.max_penetration;
        self.result.surface_material = pass.surface_material;

        Ok(&self.result)
    }

    /// Blend the penetration-weighted hit normal of the last pass into the
    /// smoothed ground normal and return it.
    pub fn update_ground_normal(&mut self, timing: StepTiming) -> Vec3 {
        let target = weighted_target_normal(&self.raw_hits);
        self.result.ground_normal = smooth_normal(
            &self.result.ground_normal,
            &target,
            self.config.normal_smoothing_rate,
            timing.delta(),
        );
        self.result.ground_normal
    }

    /// Full tick: [`ContactSampler::sample`] then [`ContactSampler::update_ground_normal`].
    pub fn scan<P, Q>(
        &mut self,
        provider: &P,
        caster: &mut Q,
        timing: StepTiming,
    ) -> ScanResult<&ContactResult<M>>
    where
        P: PoseProvider + ?Sized,
        Q: ShapeCaster<Material = M> + ?Sized,
    {
        self.sample(provider, caster)?;
        self.update_ground_normal(timing);
        Ok(&self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bitmask_flags::LayerMask,
        config::{BoxSize, SliceSettings},
        planner::pitch_angles,
        query::CastHit,
    };
    use approx::assert_relative_eq;

    /// Answers casts from a per-call script, recording every cast it sees.
    struct ScriptedCaster {
        answers: Vec<Option<(f32, Vec3, &'static str)>>,
        calls: Vec<BoxCast>,
        fail_at: Option<usize>,
    }

    impl ScriptedCaster {
        fn new(answers: Vec<Option<(f32, Vec3, &'static str)>>) -> Self {
            Self {
                answers,
                calls: Vec::new(),
                fail_at: None,
            }
        }

        fn all_miss() -> Self {
            Self::new(Vec::new())
        }
    }

    impl ShapeCaster for ScriptedCaster {
        type Material = &'static str;

        fn cast_box(&mut self, cast: &BoxCast) -> ScanResult<Option<CastHit<&'static str>>> {
            let n = self.calls.len();
            self.calls.push(*cast);
            if self.fail_at == Some(n) {
                return Err(ScanError::QueryFailed("backend offline".into()));
            }
            Ok(self
                .answers
                .get(n)
                .copied()
                .flatten()
                .map(|(distance, normal, material)| CastHit {
                    distance,
                    point: cast.point_at(distance),
                    normal,
                    material: Some(material),
                }))
        }
    }

    /// Flat infinite ground at `height`, answered analytically for downward casts.
    struct FlatGround {
        height: f32,
        material: u32,
    }

    impl ShapeCaster for FlatGround {
        type Material = u32;

        fn cast_box(&mut self, cast: &BoxCast) -> ScanResult<Option<CastHit<u32>>> {
            // Treat the box as a point; enough for symmetric checks.
            if cast.direction.y >= -1.0e-6 {
                return Ok(None);
            }
            let distance = (self.height - cast.origin.y) / cast.direction.y;
            if distance < 0.0 || distance > cast.max_distance {
                return Ok(None);
            }
            Ok(Some(CastHit {
                distance,
                point: cast.point_at(distance),
                normal: Vec3::y(),
                material: Some(self.material),
            }))
        }
    }

    fn level_pose() -> WheelPose {
        WheelPose::new(Vec3::new(0.0, 0.3, 0.0), Vec3::x(), Vec3::y())
    }

    fn small_config() -> ScannerConfig {
        ScannerConfig {
            ray_count: 3,
            side_slice_pairs: vec![SliceSettings::side_default()],
            ..ScannerConfig::default()
        }
    }

    #[test]
    fn all_miss_leaves_result_ungrounded() {
        let mut sampler = ContactSampler::new(small_config());
        let mut caster = ScriptedCaster::all_miss();
        let result = sampler.sample(&level_pose(), &mut caster).unwrap().clone();

        assert_eq!(caster.calls.len(), 9);
        assert!(!result.is_grounded);
        assert_eq!(result.max_penetration, 0.0);
        assert_eq!(result.surface_material, None);
        assert_eq!(result.nearest_hit_distance, f32::INFINITY);
        assert_eq!(result.nearest_distance(), None);
        assert!(sampler.raw_hits().iter().all(|h| !h.is_hit && h.normal == Vec3::zeros()));
    }

    #[test]
    fn single_hit_sets_every_accumulator() {
        let mut sampler = ContactSampler::new(small_config());
        // Ray 1 of the center slice hits.
        let mut caster = ScriptedCaster::new(vec![None, Some((0.4, Vec3::y(), "asphalt"))]);
        let result = sampler.sample(&level_pose(), &mut caster).unwrap().clone();

        let max = sampler.plan().slices()[0].max_distance;
        assert!(result.is_grounded);
        assert_eq!(result.nearest_hit_distance, 0.4);
        assert_relative_eq!(result.max_penetration, max - 0.4, epsilon = 1.0e-6);
        assert_eq!(result.surface_material, Some("asphalt"));

        let hit = sampler.raw_hits()[1];
        assert!(hit.is_hit);
        assert_relative_eq!(hit.point, hit.cast.origin + hit.cast.direction * 0.4);
    }

    #[test]
    fn deepest_hit_decides_material_and_nearest_is_independent() {
        let cfg = ScannerConfig {
            ray_count: 2,
            side_slice_pairs: vec![SliceSettings {
                cast_distance: 1.0,
                ..SliceSettings::side_default()
            }],
            center_slice: SliceSettings {
                cast_distance: 0.5,
                ..SliceSettings::center_default()
            },
            ..ScannerConfig::default()
        };
        let mut sampler = ContactSampler::new(cfg);
        let mut caster = ScriptedCaster::new(vec![
            // center: nearest distance but shallow penetration (0.5 - 0.2 = 0.3)
            Some((0.2, Vec3::y(), "center")),
            None,
            // left side: deeper penetration (1.0 - 0.3 = 0.7)
            Some((0.3, Vec3::y(), "left")),
            None,
            None,
            None,
        ]);
        let result = sampler.sample(&level_pose(), &mut caster).unwrap();

        assert_eq!(result.nearest_hit_distance, 0.2);
        assert_relative_eq!(result.max_penetration, 0.7, epsilon = 1.0e-6);
        assert_eq!(result.surface_material, Some("left"));
    }

    #[test]
    fn equal_penetration_keeps_first_in_iteration_order() {
        let mut sampler = ContactSampler::new(ScannerConfig {
            ray_count: 3,
            side_slice_pairs: Vec::new(),
            ..ScannerConfig::default()
        });
        let mut caster = ScriptedCaster::new(vec![
            Some((0.3, Vec3::y(), "first")),
            Some((0.5, Vec3::y(), "shallow")),
            Some((0.3, Vec3::y(), "second")),
        ]);
        let result = sampler.sample(&level_pose(), &mut caster).unwrap();
        assert_eq!(result.surface_material, Some("first"));
    }

    #[test]
    fn hit_at_full_distance_grounds_without_material() {
        let mut sampler = ContactSampler::new(ScannerConfig {
            ray_count: 1,
            side_slice_pairs: Vec::new(),
            ..ScannerConfig::default()
        });
        let max = sampler.plan().slices()[0].max_distance;
        let mut caster = ScriptedCaster::new(vec![Some((max, Vec3::y(), "edge"))]);
        let result = sampler.sample(&level_pose(), &mut caster).unwrap();

        assert!(result.is_grounded);
        assert_eq!(result.max_penetration, 0.0);
        assert_eq!(result.surface_material, None);
    }

    #[test]
    fn zero_rays_issue_no_queries() {
        let mut sampler = ContactSampler::<&'static str>::new(ScannerConfig {
            ray_count: 0,
            ..ScannerConfig::default()
        });
        let mut caster = ScriptedCaster::all_miss();
        let result = sampler.sample(&level_pose(), &mut caster).unwrap();
        assert!(caster.calls.is_empty());
        assert!(!result.is_grounded);
    }

    #[test]
    fn cast_geometry_follows_hub_offset_and_pullback() {
        let cfg = ScannerConfig {
            wheel_offset: 0.05,
            ray_count: 1,
            ..ScannerConfig::default()
        };
        let mut sampler = ContactSampler::new(cfg.clone());
        let mut caster = ScriptedCaster::all_miss();
        let pose = level_pose();
        sampler.sample(&pose, &mut caster).unwrap();

        for (cast, slice) in caster.calls.iter().zip(sampler.plan().slices()) {
            // With a single ray at 90 degrees every slice casts (almost) straight down.
            assert!(cast.direction.y < -0.99);
            let expected = pose.position + pose.axle * (cfg.wheel_offset + slice.offset)
                - cast.direction * (slice.box_size.depth * 0.5);
            assert_relative_eq!(cast.origin, expected, epsilon = 1.0e-6);
            assert_relative_eq!(cast.half_extents, slice.box_size.half_extents());
            assert_eq!(cast.max_distance, slice.max_distance);
            assert_eq!(cast.layers, cfg.scan_layers);
        }
    }

    #[test]
    fn backend_error_propagates_and_keeps_previous_result() {
        let mut sampler = ContactSampler::new(small_config());
        let mut good = ScriptedCaster::new(vec![Some((0.3, Vec3::y(), "grass"))]);
        sampler.sample(&level_pose(), &mut good).unwrap();
        let before = sampler.result().clone();
        let hits_before = sampler.raw_hits().to_vec();

        let mut failing = ScriptedCaster::all_miss();
        failing.fail_at = Some(4);
        let err = sampler.sample(&level_pose(), &mut failing).unwrap_err();

        assert!(matches!(err, ScanError::QueryFailed(_)));
        assert_eq!(failing.calls.len(), 5);
        assert_eq!(sampler.result(), &before);
        assert_eq!(sampler.raw_hits(), hits_before.as_slice());
    }

    #[test]
    fn non_finite_pose_is_rejected_before_querying() {
        let mut sampler = ContactSampler::new(small_config());
        let mut caster = ScriptedCaster::all_miss();
        let pose = WheelPose::new(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::x(), Vec3::y());
        let err = sampler.sample(&pose, &mut caster).unwrap_err();
        assert!(matches!(err, ScanError::NonFiniteCast { ray_index: 0 }));
        assert!(caster.calls.is_empty());
    }

    #[test]
    fn degenerate_axle_still_samples() {
        let mut sampler = ContactSampler::new(small_config());
        let mut caster = ScriptedCaster::all_miss();
        let pose = WheelPose::new(Vec3::zeros(), Vec3::y(), Vec3::y());
        assert!(sampler.sample(&pose, &mut caster).is_ok());
        assert_eq!(caster.calls.len(), 9);
    }

    #[test]
    fn wheel_spin_does_not_move_the_fan() {
        let mut sampler = ContactSampler::new(small_config());
        let mut flat = FlatGround {
            height: 0.0,
            material: 7,
        };
        let chassis = crate::types::Iso::identity();
        let base = crate::types::Iso::translation(0.0, 0.3, 0.0);

        sampler.sample(&WheelPose::from_isometries(&base, &chassis), &mut flat).unwrap();
        let reference = sampler.result().clone();
        let reference_casts: Vec<BoxCast> = sampler.raw_hits().iter().map(|h| h.cast).collect();

        for spin in [0.7_f32, 2.0, 5.5] {
            let spun = crate::types::Iso::from_parts(
                base.translation,
                Quat::from_axis_angle(&Vec3::x_axis(), spin),
            );
            sampler.sample(&WheelPose::from_isometries(&spun, &chassis), &mut flat).unwrap();
            assert_eq!(sampler.result().is_grounded, reference.is_grounded);
            assert_relative_eq!(
                sampler.result().nearest_hit_distance,
                reference.nearest_hit_distance,
                epsilon = 1.0e-5
            );
            for (hit, cast) in sampler.raw_hits().iter().zip(&reference_casts) {
                assert_relative_eq!(hit.cast.direction, cast.direction, epsilon = 1.0e-5);
                assert_relative_eq!(hit.cast.origin, cast.origin, epsilon = 1.0e-5);
            }
        }
    }

    #[test]
    fn flat_ground_center_ray_is_nearest() {
        let mut sampler = ContactSampler::new(ScannerConfig {
            side_slice_pairs: Vec::new(),
            ..ScannerConfig::default()
        });
        let mut flat = FlatGround {
            height: 0.0,
            material: 3,
        };
        let result = sampler.sample(&level_pose(), &mut flat).unwrap().clone();

        // Straight-down center ray starts at 0.3 + depth/2 above ground.
        let depth = sampler.plan().slices()[0].box_size.depth;
        assert!(result.is_grounded);
        assert_relative_eq!(result.nearest_hit_distance, 0.3 + depth * 0.5, epsilon = 1.0e-5);
        assert_eq!(result.surface_material, Some(3));
        let angles = pitch_angles(7, 100.0, 90.0);
        assert_eq!(sampler.raw_hits().len(), angles.len());
    }

    #[test]
    fn repeated_sample_is_idempotent() {
        let mut sampler = ContactSampler::new(small_config());
        let mut flat = FlatGround {
            height: 0.0,
            material: 1,
        };
        let timing = StepTiming::Fixed(0.02);
        // Converge the normal first so smoothing has nothing left to do.
        for _ in 0..200 {
            sampler.scan(&level_pose(), &mut flat, timing).unwrap();
        }
        let first = sampler.result().clone();
        let second = sampler.scan(&level_pose(), &mut flat, timing).unwrap().clone();
        assert_eq!(first.is_grounded, second.is_grounded);
        assert_eq!(first.nearest_hit_distance, second.nearest_hit_distance);
        assert_eq!(first.max_penetration, second.max_penetration);
        assert_eq!(first.surface_material, second.surface_material);
        assert_relative_eq!(first.ground_normal, second.ground_normal, epsilon = 1.0e-6);
    }

    #[test]
    fn weighted_normal_prefers_deeper_hits() {
        let cast = BoxCast {
            origin: Vec3::zeros(),
            half_extents: Vec3::repeat(0.05),
            direction: -Vec3::y(),
            orientation: Quat::identity(),
            max_distance: 1.0,
            layers: LayerMask::all(),
        };
        let hit = |normal: Vec3, penetration: f32| RawHit {
            cast,
            is_hit: true,
            distance: Some(1.0 - penetration),
            point: Vec3::zeros(),
            normal,
            penetration,
        };
        let hits = [hit(Vec3::y(), 0.9), hit(Vec3::x(), 0.1), RawHit::miss(cast)];
        let target = weighted_target_normal(&hits);
        assert_relative_eq!(target, Vec3::new(0.1, 0.9, 0.0).normalize(), epsilon = 1.0e-6);

        // Exactly cancelling normals fall back to up.
        let cancelling = [hit(Vec3::x(), 0.5), hit(-Vec3::x(), 0.5)];
        assert_eq!(weighted_target_normal(&cancelling), Vec3::y());
        assert_eq!(weighted_target_normal(&[]), Vec3::y());
    }

    #[test]
    fn smoothing_converges_geometrically() {
        let target = Vec3::new(0.1, 1.0, 0.0).normalize();
        let rate = 15.0;
        let dt = 0.02;
        let factor = 1.0 - rate * dt;

        let mut normal = Vec3::y();
        let mut distance = (normal - target).norm();
        for _ in 0..10 {
            normal = smooth_normal(&normal, &target, rate, dt);
            let next = (normal - target).norm();
            assert!(next < distance);
            assert_relative_eq!(next / distance, factor, epsilon = 1.0e-2);
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1.0e-6);
            distance = next;
        }
    }

    #[test]
    fn smoothing_edge_cases() {
        // Blend clamps at 1: a huge step lands on the target.
        let target = Vec3::x();
        assert_relative_eq!(smooth_normal(&Vec3::y(), &target, 15.0, 10.0), target);
        // Zero previous starts from up; zero dt keeps it.
        assert_eq!(smooth_normal(&Vec3::zeros(), &target, 15.0, 0.0), Vec3::y());
        // Opposite vectors at half blend snap to the target.
        assert_eq!(smooth_normal(&-Vec3::x(), &target, 1.0, 0.5), target);
    }

    #[test]
    fn ground_normal_persists_and_relaxes_to_up_when_airborne() {
        let mut sampler = ContactSampler::new(small_config());
        let mut tilted = ScriptedCaster::new(vec![Some((0.1, Vec3::new(1.0, 1.0, 0.0).normalize(), "ramp"))]);
        sampler.scan(&level_pose(), &mut tilted, StepTiming::Fixed(0.02)).unwrap();
        let tilted_normal = sampler.result().ground_normal;
        assert!(tilted_normal.x > 0.0);

        let mut air = ScriptedCaster::all_miss();
        sampler.scan(&level_pose(), &mut air, StepTiming::Variable(0.01)).unwrap();
        let relaxed = sampler.result().ground_normal;
        assert!(relaxed.x < tilted_normal.x);
        assert!(relaxed.x > 0.0);
    }

    #[test]
    fn count_change_through_config_mut_rebuilds_tables() {
        let mut sampler = ContactSampler::new(small_config());
        sampler.config_mut().ray_count = 4;
        sampler.config_mut().side_slice_pairs.push(SliceSettings {
            offset: 0.3,
            box_size: BoxSize::new(0.1, 0.1, 0.02),
            ..SliceSettings::side_default()
        });
        let mut caster = ScriptedCaster::all_miss();
        sampler.sample(&level_pose(), &mut caster).unwrap();
        assert_eq!(caster.calls.len(), 4 * 5);
        assert_eq!(sampler.plan().rays().len(), 20);
        assert_eq!(sampler.raw_hits().len(), 20);
    }

    #[test]
    fn set_config_rebuilds_even_with_same_counts() {
        let mut sampler = ContactSampler::<&'static str>::new(small_config());
        let before = sampler.plan().clone();
        let mut cfg = small_config();
        cfg.scan_center_angle = 60.0;
        sampler.set_config(cfg);
        assert_eq!(sampler.plan().rays().len(), before.rays().len());
        assert_ne!(sampler.plan().rays()[0], before.rays()[0]);
    }

    #[test]
    fn preview_casts_match_sampled_casts() {
        let mut sampler = ContactSampler::new(small_config());
        let mut caster = ScriptedCaster::all_miss();
        let pose = level_pose();
        let preview = sampler.casts_for(&pose);
        sampler.sample(&pose, &mut caster).unwrap();
        assert_eq!(preview, caster.calls);
    }

    /// Wheel mounted on a chassis isometry, resolved on demand.
    struct Mount {
        chassis: crate::types::Iso,
        offset: Vec3,
    }

    impl PoseProvider for Mount {
        fn wheel_pose(&self) -> WheelPose {
            let wheel = self.chassis * crate::types::Iso::translation(
                self.offset.x,
                self.offset.y,
                self.offset.z,
            );
            WheelPose::from_isometries(&wheel, &self.chassis)
        }
    }

    #[test]
    fn sample_reads_pose_from_provider() {
        let mount = Mount {
            chassis: crate::types::Iso::translation(2.0, 0.3, -1.0),
            offset: Vec3::new(0.8, 0.0, 0.0),
        };
        let mut sampler = ContactSampler::new(small_config());
        let mut caster = ScriptedCaster::all_miss();
        sampler.sample(&mount, &mut caster).unwrap();

        let expected = sampler.casts_for(&mount.wheel_pose());
        assert_eq!(expected, caster.calls);
        assert_relative_eq!(
            sampler.debug_frame(mount.wheel_pose().position).wheel_position,
            Vec3::new(2.8, 0.3, -1.0),
            epsilon = 1.0e-6
        );
    }
}
