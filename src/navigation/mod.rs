pub mod detection;
pub mod gate;
pub mod input;
pub mod pick;
pub mod systems;
pub mod transition;

use bevy::prelude::*;

pub use detection::{Detector, DetectorLoader};
pub use input::{ClickTracker, PointerGesture};
pub use transition::TransitionController;

use input::recognise_gestures;
use systems::{handle_pointer_gestures, poll_pending_authorizations, preload_detector};

/// Systems that may change the active environment.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigationSet;

/// Picking, gating and scene transitions. Expects `ViewerConfig`,
/// `EnvironmentRegistry`, `TransitionController`, `Detector` and
/// `ClickTracker` to be inserted by the app.
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PointerGesture>()
            .add_systems(Startup, preload_detector)
            .add_systems(
                Update,
                (
                    recognise_gestures,
                    handle_pointer_gestures,
                    poll_pending_authorizations,
                )
                    .chain()
                    .in_set(NavigationSet),
            );
    }
}
