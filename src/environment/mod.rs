pub mod components;
pub mod setup;
pub mod systems;

use bevy::prelude::*;

pub use components::{
    Environment, EnvironmentId, EnvironmentRegistry, ExitRule, Face, FaceSet, GateRule,
    SkyboxFace, Trigger,
};

use crate::navigation::NavigationSet;
use setup::setup_skybox;
use systems::show_active_environment;

/// Shared skybox cube and per-environment face materials.
pub struct EnvironmentPlugin;

impl Plugin for EnvironmentPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_skybox)
            .add_systems(Update, show_active_environment.after(NavigationSet));
    }
}
