//! Dev-only overlays: frame diagnostics plus a text readout of the wheel contact.

use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use iyes_perf_ui::prelude::*;

use crate::wheel::Wheel;

#[derive(Component)]
struct ContactReadout;

/// Add debug/perf tooling (intended for `dev_native` builds only).
pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
        PerfUiPlugin,
    ));

    app.add_systems(Startup, spawn_overlays);
    app.add_systems(Update, update_readout);
}

fn spawn_overlays(mut commands: Commands) {
    commands.spawn(PerfUiDefaultEntries::default());
    commands.spawn((
        ContactReadout,
        Text::new(""),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
    ));
}

fn update_readout(wheels: Query<&Wheel>, mut readout: Single<&mut Text, With<ContactReadout>>) {
    let mut lines = Vec::new();
    for wheel in &wheels {
        let result = wheel.sampler.result();
        let line = match (result.nearest_distance(), result.surface_material) {
            (Some(nearest), Some(material)) => format!(
                "grounded  nearest {nearest:.3} m  penetration {:.3} m  friction {:.2}",
                result.max_penetration, material.friction
            ),
            (Some(nearest), None) => format!(
                "grounded  nearest {nearest:.3} m  penetration {:.3} m",
                result.max_penetration
            ),
            (None, _) => "airborne".to_string(),
        };
        lines.push(format!(
            "{line}\nnormal ({:.2}, {:.2}, {:.2})  casts {}",
            result.ground_normal.x,
            result.ground_normal.y,
            result.ground_normal.z,
            wheel.sampler.raw_hits().len()
        ));
    }
    readout.0 = lines.join("\n");
}
