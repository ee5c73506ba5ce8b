use std::path::{Path, PathBuf};

use bevy::prelude::*;
use leafwing_input_manager::prelude::ActionState;
use scanner::{ScanError, ScannerConfig};

use crate::input::InputAction;

const CONFIG_FILE: &str = "config/wheel_scanner.toml";

/// Scanner configuration shared by every wheel. Change detection on this
/// resource is what triggers a table rebuild in the wheels.
#[derive(Resource, Debug, Clone)]
pub struct ScannerSettings {
    pub path: PathBuf,
    pub config: ScannerConfig,
}

pub(super) fn plugin(app: &mut App) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(CONFIG_FILE);
    let config = load_or_default(&path);
    app.insert_resource(ScannerSettings { path, config });

    app.add_systems(Update, reload_on_request);
}

/// Startup load: a missing file means defaults, a broken one is logged and
/// also falls back to defaults.
fn load_or_default(path: &Path) -> ScannerConfig {
    if !path.exists() {
        info!("no scanner config at {}, using defaults", path.display());
        return ScannerConfig::default();
    }
    match read_validated(path) {
        Ok(config) => {
            info!(
                "loaded scanner config from {} ({} rays)",
                path.display(),
                config.total_rays()
            );
            config
        }
        Err(err) => {
            warn!("{}: {err}; using defaults", path.display());
            ScannerConfig::default()
        }
    }
}

fn read_validated(path: &Path) -> Result<ScannerConfig, ScanError> {
    let config = ScannerConfig::from_toml_file(path)?;
    config.validate()?;
    Ok(config)
}

fn reload_on_request(actions: Res<ActionState<InputAction>>, mut settings: ResMut<ScannerSettings>) {
    if !actions.just_pressed(&InputAction::ReloadConfig) {
        return;
    }

    // On failure the running configuration stays in place.
    match read_validated(&settings.path) {
        Ok(config) => {
            info!("reloaded scanner config ({} rays)", config.total_rays());
            settings.config = config;
        }
        Err(err) => warn!("config reload failed, keeping current: {err}"),
    }
}
