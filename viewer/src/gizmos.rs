//! Scan visualization: one line and box per cast, hit markers and the
//! smoothed ground normal.

use bevy::{
    color::palettes::css::{AQUA, LIME, ORANGE, RED, YELLOW},
    prelude::*,
};
use leafwing_input_manager::prelude::ActionState;
use scanner::{RayGizmo, ScanDebugFrame};

use crate::{
    convert::{quat_to_bevy, to_bevy, to_na},
    input::InputAction,
    wheel::Wheel,
};

const HIT_MARKER_RADIUS: f32 = 0.02;
const NORMAL_LENGTH: f32 = 0.6;

#[derive(Resource, Debug)]
pub struct ShowScanGizmos(pub bool);

pub(super) fn plugin(app: &mut App) {
    app.insert_resource(ShowScanGizmos(true));
    app.add_systems(
        Update,
        (
            toggle_gizmos,
            draw_scans.run_if(|show: Res<ShowScanGizmos>| show.0),
        )
            .chain(),
    );
}

fn toggle_gizmos(actions: Res<ActionState<InputAction>>, mut show: ResMut<ShowScanGizmos>) {
    if actions.just_pressed(&InputAction::ToggleGizmos) {
        show.0 = !show.0;
    }
}

/// Miss colors tell center from side slices; hits go yellow to red with depth.
fn ray_color(ray: &RayGizmo) -> Color {
    if ray.is_hit() {
        YELLOW.mix(&RED, ray.heat()).into()
    } else if ray.is_side {
        AQUA.into()
    } else {
        LIME.into()
    }
}

fn draw_scans(mut gizmos: Gizmos, wheels: Query<(&Wheel, &GlobalTransform)>) {
    for (wheel, gt) in &wheels {
        let frame = wheel.sampler.debug_frame(to_na(gt.translation()));
        draw_frame(&mut gizmos, &frame);
    }
}

fn draw_frame(gizmos: &mut Gizmos, frame: &ScanDebugFrame) {
    for ray in &frame.rays {
        let color = ray_color(ray);
        let origin = to_bevy(&ray.origin);
        let end = to_bevy(&ray.end_point());

        gizmos.line(origin, end, color);
        gizmos.cuboid(
            Transform {
                translation: end,
                rotation: quat_to_bevy(&ray.orientation),
                scale: to_bevy(&ray.half_extents) * 2.0,
            },
            color,
        );
        if let Some(point) = ray.hit_point {
            gizmos.sphere(
                Isometry3d::from_translation(to_bevy(&point)),
                HIT_MARKER_RADIUS,
                ORANGE,
            );
        }
    }

    let hub = to_bevy(&frame.wheel_position);
    gizmos.arrow(hub, hub + to_bevy(&frame.ground_normal) * NORMAL_LENGTH, ORANGE);
}
