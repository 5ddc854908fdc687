use std::sync::Arc;

use bevy::{
    diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin},
    prelude::*,
    window::PrimaryWindow,
};

use crate::camera::{CameraPlugin, OrbitController};
use crate::config::ViewerConfig;
use crate::environment::{EnvironmentPlugin, EnvironmentRegistry};
use crate::navigation::{ClickTracker, Detector, DetectorLoader, NavigationPlugin, TransitionController};

/// Loads the configuration, builds the shared resources and adds the
/// viewer's plugins. Must be added after `DefaultPlugins` so configuration
/// problems reach the log.
pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        let (config, registry) = load_environments(ViewerConfig::from_env());

        let orbit = OrbitController::from_config(&config.camera);
        let controller = TransitionController::new(
            registry.default_environment().clone(),
            orbit.default_pose,
            orbit.default_limits,
        );
        let detector = match &config.detector.annotations {
            Some(path) => DetectorLoader::annotations(config.resolve_asset(path), config.detector.min_score),
            None => DetectorLoader::unavailable("no detection model configured"),
        };

        add_frame_stats(app, &config);

        app.insert_resource(ClearColor(Color::BLACK))
            .insert_resource(ClickTracker::new(&config.input))
            .insert_resource(Detector(Arc::new(detector)))
            .insert_resource(controller)
            .insert_resource(registry)
            .insert_resource(config)
            .add_plugins((EnvironmentPlugin, CameraPlugin, NavigationPlugin))
            .add_systems(Startup, apply_window_title);
    }
}

/// Builds the registry, falling back to the built-in scenes when the
/// configured ones are inconsistent.
fn load_environments(config: ViewerConfig) -> (ViewerConfig, EnvironmentRegistry) {
    match EnvironmentRegistry::from_config(&config) {
        Ok(registry) => (config, registry),
        Err(e) => {
            error!("{}; using built-in scenes", e);
            let config = ViewerConfig::default();
            let registry = EnvironmentRegistry::from_config(&config)
                .expect("built-in scenes are consistent");
            (config, registry)
        }
    }
}

/// Frame time and FPS, logged periodically.
fn add_frame_stats(app: &mut App, config: &ViewerConfig) {
    if !config.frame_stats || app.is_plugin_added::<FrameTimeDiagnosticsPlugin>() {
        return;
    }
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        LogDiagnosticsPlugin::default(),
    ));
}

fn apply_window_title(config: Res<ViewerConfig>, mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = windows.get_single_mut() {
        window.title = config.title.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_stats_are_on_by_default() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        add_frame_stats(&mut app, &ViewerConfig::default());
        assert!(app.is_plugin_added::<FrameTimeDiagnosticsPlugin>());
        assert!(app.is_plugin_added::<LogDiagnosticsPlugin>());

        // Adding twice must not panic on duplicate plugins.
        add_frame_stats(&mut app, &ViewerConfig::default());
    }

    #[test]
    fn frame_stats_can_be_disabled() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        let config = ViewerConfig {
            frame_stats: false,
            ..default()
        };
        add_frame_stats(&mut app, &config);
        assert!(!app.is_plugin_added::<FrameTimeDiagnosticsPlugin>());
    }

    #[test]
    fn invalid_scenes_fall_back_to_built_in() {
        let mut config = ViewerConfig::default();
        config.default_environment = "nowhere".to_string();
        let (config, registry) = load_environments(config);
        assert_eq!(config.default_environment, "first");
        assert_eq!(registry.default_environment().as_str(), "first");
    }
}
