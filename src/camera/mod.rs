pub mod components;
pub mod systems;

use bevy::prelude::*;

pub use components::{OrbitController, OrbitLimits, OrbitPose, ViewportSize, PITCH_LIMIT};

use crate::navigation::NavigationSet;
use systems::{
    apply_orbit, orbit_drag, orbit_zoom, reset_on_key, reset_on_transition, setup_camera,
    track_viewport,
};

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewportSize>()
            .add_systems(Startup, setup_camera)
            .add_systems(PreUpdate, track_viewport)
            .add_systems(
                Update,
                (
                    reset_on_transition,
                    (orbit_drag, orbit_zoom, reset_on_key),
                    apply_orbit,
                )
                    .chain()
                    .after(NavigationSet),
            );
    }
}
