use bevy::{
    log::{Level, LogPlugin},
    prelude::*,
    window::PresentMode,
};

use panoview::viewer::ViewerPlugin;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Panoview".to_string(),
                        present_mode: PresentMode::AutoVsync,
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    level: Level::INFO,
                    filter: "info,wgpu=error,naga=warn,panoview=debug".to_string(),
                    ..default()
                }),
        )
        .add_plugins(ViewerPlugin)
        .run();
}
