//! A chassis driving back and forth over the scene with one scanned wheel.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use leafwing_input_manager::prelude::ActionState;
use scanner::{ColliderMaterial, ContactSampler, RapierCaster, StepTiming, WheelPose};

use crate::{
    config::ScannerSettings,
    convert::iso_from_transform,
    input::InputAction,
    world::{LANE_X, StaticWorld},
};

const WHEEL_RADIUS: f32 = 0.35;
const WHEEL_WIDTH: f32 = 0.25;
const DRIVE_SPEED: f32 = 2.5;
const HALF_TRAVEL: f32 = 10.0;
/// Fraction of the ride-height error corrected per second.
const RIDE_STIFFNESS: f32 = 12.0;
const FALL_SPEED: f32 = 3.0;

#[derive(Component, Debug)]
pub struct Chassis {
    pub speed: f32,
    pub half_travel: f32,
    /// +1 driving toward +Z, -1 toward -Z.
    pub heading: f32,
    pub paused: bool,
}

#[derive(Component)]
pub struct Wheel {
    pub radius: f32,
    pub sampler: ContactSampler<ColliderMaterial>,
}

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_vehicle);
    app.add_systems(Update, toggle_pause);
    app.add_systems(
        FixedUpdate,
        (drive_chassis, spin_wheels, scan_wheels, follow_ground)
            .chain()
            .run_if(resource_exists::<StaticWorld>),
    );
}

fn spawn_vehicle(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<ScannerSettings>,
) {
    let tire = Cylinder::new(WHEEL_RADIUS, WHEEL_WIDTH)
        .mesh()
        .build()
        .rotated_by(Quat::from_rotation_z(FRAC_PI_2));

    commands.spawn((
        Name::new("Chassis"),
        Chassis {
            speed: DRIVE_SPEED,
            half_travel: HALF_TRAVEL,
            heading: 1.0,
            paused: false,
        },
        Transform::from_xyz(0.0, WHEEL_RADIUS, 0.0),
        Mesh3d(meshes.add(Cuboid::new(1.2, 0.2, 2.0))),
        MeshMaterial3d(materials.add(Color::srgba(0.8, 0.8, 0.85, 0.4))),
        children![(
            Name::new("Wheel"),
            Wheel {
                radius: WHEEL_RADIUS,
                sampler: ContactSampler::new(settings.config.clone()),
            },
            Transform::from_xyz(LANE_X, 0.0, 0.0),
            Mesh3d(meshes.add(tire)),
            MeshMaterial3d(materials.add(Color::srgb(0.1, 0.1, 0.12))),
        )],
    ));
}

fn toggle_pause(actions: Res<ActionState<InputAction>>, mut chassis_q: Query<&mut Chassis>) {
    if !actions.just_pressed(&InputAction::TogglePause) {
        return;
    }
    for mut chassis in &mut chassis_q {
        chassis.paused = !chassis.paused;
    }
}

/// Move `z` by `step` along `heading`, bouncing between `-half_travel` and
/// `half_travel`. Returns the new position and heading.
fn advance(z: f32, heading: f32, step: f32, half_travel: f32) -> (f32, f32) {
    let next = z + heading * step;
    if next.abs() >= half_travel {
        (next.clamp(-half_travel, half_travel), -heading)
    } else {
        (next, heading)
    }
}

fn drive_chassis(time: Res<Time>, mut chassis_q: Query<(&mut Transform, &mut Chassis)>) {
    let dt = time.delta_secs();
    for (mut tf, mut chassis) in &mut chassis_q {
        if chassis.paused {
            continue;
        }
        let (z, heading) = advance(
            tf.translation.z,
            chassis.heading,
            chassis.speed * dt,
            chassis.half_travel,
        );
        tf.translation.z = z;
        chassis.heading = heading;
    }
}

fn spin_wheels(
    time: Res<Time>,
    chassis_q: Query<&Chassis>,
    mut wheels: Query<(&ChildOf, &mut Transform, &Wheel)>,
) {
    let dt = time.delta_secs();
    for (parent, mut tf, wheel) in &mut wheels {
        let Ok(chassis) = chassis_q.get(parent.parent()) else {
            continue;
        };
        if chassis.paused {
            continue;
        }
        // Rolling toward +Z turns the tire positively about its +X axle.
        tf.rotate_local_x(chassis.heading * chassis.speed * dt / wheel.radius);
    }
}

fn scan_wheels(
    time: Res<Time>,
    world: Res<StaticWorld>,
    settings: Res<ScannerSettings>,
    chassis_q: Query<&Transform, With<Chassis>>,
    mut wheels: Query<(&ChildOf, &Transform, &mut Wheel), Without<Chassis>>,
) {
    let timing = StepTiming::Fixed(time.delta_secs());
    let mut caster = RapierCaster::new(&world.0);

    for (parent, local, mut wheel) in &mut wheels {
        if settings.is_changed() {
            wheel.sampler.set_config(settings.config.clone());
        }
        let Ok(chassis_tf) = chassis_q.get(parent.parent()) else {
            continue;
        };

        // Composed from local transforms: GlobalTransform lags a frame in FixedUpdate.
        let wheel_tf = chassis_tf.mul_transform(*local);
        let pose = WheelPose::from_isometries(
            &iso_from_transform(&wheel_tf),
            &iso_from_transform(chassis_tf),
        );

        if let Err(err) = wheel.sampler.scan(&pose, &mut caster, timing) {
            warn!("wheel scan failed, keeping previous contact: {err}");
        }
    }
}

/// Keep the hub one wheel radius above the nearest hit, or drop when airborne.
fn follow_ground(
    time: Res<Time>,
    mut chassis_q: Query<(&mut Transform, &Children), With<Chassis>>,
    wheels: Query<&Wheel>,
) {
    let dt = time.delta_secs();
    for (mut tf, children) in &mut chassis_q {
        let lift = children
            .iter()
            .filter_map(|child| wheels.get(child).ok())
            .filter_map(|wheel| {
                let nearest = wheel.sampler.result().nearest_distance()?;
                Some(wheel.radius - nearest)
            })
            .reduce(f32::max);

        match lift {
            Some(lift) => tf.translation.y += lift * (RIDE_STIFFNESS * dt).min(1.0),
            None => tf.translation.y -= FALL_SPEED * dt,
        }
    }
}
