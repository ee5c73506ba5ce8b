use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    /// Re-read the scanner TOML and rebuild the scan tables.
    ReloadConfig,
    /// Stop/start the chassis.
    TogglePause,
    ToggleGizmos,
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    let mut input_map = InputMap::<InputAction>::default();
    input_map.insert(InputAction::ReloadConfig, KeyCode::F5);
    input_map.insert(InputAction::TogglePause, KeyCode::Space);
    input_map.insert(InputAction::ToggleGizmos, KeyCode::KeyG);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<InputAction>::default());
}
