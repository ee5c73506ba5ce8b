use bevy::prelude::*;
use scanner::{ColliderShapeDef, LayerMask, RapierQueryWorld, WorldStaticDef};

use crate::convert::{quat_to_bevy, quat_to_na, to_bevy, to_na};

scanner::define_bitmask_flags!(SurfaceLayer, u32, { Ground, Props });

/// Static collision scene the wheel scanner queries. Mirrors the spawned meshes.
#[derive(Resource)]
pub struct StaticWorld(pub RapierQueryWorld);

/// Lane the wheel drives along (world x of the wheel), shared with the props.
pub const LANE_X: f32 = 0.8;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, setup);
}

/// One static prop: its render mesh and its collider, kept side by side so the
/// drawn scene and the queried scene never drift apart.
struct Prop {
    def: WorldStaticDef,
    mesh: Mesh,
    color: Color,
}

fn props() -> Vec<Prop> {
    let ground = LayerMask::from_layers(&[SurfaceLayer::Ground]);
    let props = LayerMask::from_layers(&[SurfaceLayer::Props]);

    let ramp_rot = Quat::from_rotation_x(-0.2);
    let ramp_half = Vec3::new(1.5, 0.25, 2.5);
    let bump_radius = 1.2;

    vec![
        Prop {
            def: WorldStaticDef::new(
                1,
                to_na(Vec3::ZERO),
                quat_to_na(Quat::IDENTITY),
                ColliderShapeDef::Plane {
                    offset_along_normal: 0.0,
                },
            )
            .with_layers(ground)
            .with_material(0.9, 0.0),
            mesh: Plane3d::default().mesh().size(60., 60.).build(),
            color: Color::linear_rgb(0.2, 0.3, 0.25),
        },
        Prop {
            def: WorldStaticDef::new(
                2,
                to_na(Vec3::new(LANE_X, 0.0, 4.0)),
                quat_to_na(ramp_rot),
                ColliderShapeDef::Cuboid {
                    half_extents: to_na(ramp_half),
                },
            )
            .with_layers(props)
            .with_material(0.7, 0.05),
            mesh: Cuboid::from_size(ramp_half * 2.0).into(),
            color: Color::srgb_u8(124, 144, 255),
        },
        Prop {
            def: WorldStaticDef::new(
                3,
                to_na(Vec3::new(LANE_X, -0.9, -5.0)),
                quat_to_na(Quat::IDENTITY),
                ColliderShapeDef::Sphere {
                    radius: bump_radius,
                },
            )
            .with_layers(props)
            .with_material(0.6, 0.2),
            mesh: Sphere::new(bump_radius).mesh().build(),
            color: Color::srgb_u8(200, 140, 90),
        },
    ]
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let props = props();
    let mut defs = Vec::with_capacity(props.len());

    for prop in props {
        let transform = Transform {
            translation: to_bevy(&prop.def.translation),
            rotation: quat_to_bevy(&prop.def.rotation),
            ..default()
        };
        commands.spawn((
            transform,
            Mesh3d(meshes.add(prop.mesh)),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: prop.color,
                perceptual_roughness: 1.0,
                metallic: 0.0,
                ..default()
            })),
        ));
        defs.push(prop.def);
    }

    info!("built static scene with {} props", defs.len());
    commands.insert_resource(StaticWorld(RapierQueryWorld::build(defs)));

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
