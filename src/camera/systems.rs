use bevy::{
    input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel},
    prelude::*,
    window::{PrimaryWindow, WindowResized},
};

use super::components::{OrbitController, ViewportSize};
use crate::config::ViewerConfig;
use crate::navigation::TransitionController;

/// Pixels of smooth scrolling treated as one wheel line.
const PIXELS_PER_LINE: f32 = 50.0;

pub fn setup_camera(
    mut commands: Commands,
    config: Res<ViewerConfig>,
    mut viewport: ResMut<ViewportSize>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if let Ok(window) = windows.get_single() {
        viewport.0 = Vec2::new(window.width(), window.height());
    }

    let orbit = OrbitController::from_config(&config.camera);
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: config.camera.fov_degrees.to_radians(),
            near: config.camera.near,
            far: config.camera.far,
            aspect_ratio: viewport.0.x / viewport.0.y.max(1.0),
            ..default()
        }),
        orbit.pose.transform(),
        orbit,
    ));
}

pub fn orbit_drag(
    mouse_input: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut query: Query<&mut OrbitController>,
) {
    if !mouse_input.pressed(MouseButton::Left) {
        mouse_motion.clear();
        return;
    }
    let delta: Vec2 = mouse_motion.read().map(|event| event.delta).sum();
    if delta == Vec2::ZERO {
        return;
    }
    for mut orbit in query.iter_mut() {
        orbit.rotate(delta);
    }
}

pub fn orbit_zoom(mut wheel: EventReader<MouseWheel>, mut query: Query<&mut OrbitController>) {
    let lines: f32 = wheel
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / PIXELS_PER_LINE,
        })
        .sum();
    if lines == 0.0 {
        return;
    }
    for mut orbit in query.iter_mut() {
        orbit.dolly(lines);
    }
}

pub fn reset_on_key(keyboard_input: Res<ButtonInput<KeyCode>>, mut query: Query<&mut OrbitController>) {
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        for mut orbit in query.iter_mut() {
            orbit.reset();
        }
    }
}

/// Puts the orbit controls back to the pose and limits chosen by the last
/// transition.
pub fn reset_on_transition(
    controller: Res<TransitionController>,
    mut last_epoch: Local<Option<u64>>,
    mut query: Query<&mut OrbitController>,
) {
    let active = controller.active();
    if *last_epoch == Some(active.epoch()) {
        return;
    }
    *last_epoch = Some(active.epoch());
    for mut orbit in query.iter_mut() {
        orbit.set(active.camera(), active.limits());
    }
}

pub fn apply_orbit(
    mut query: Query<(&OrbitController, &mut Transform), Changed<OrbitController>>,
    mut controller: ResMut<TransitionController>,
) {
    for (orbit, mut transform) in query.iter_mut() {
        *transform = orbit.pose.transform();
        if controller.active().camera() != orbit.pose {
            controller.record_camera_pose(orbit.pose);
        }
    }
}

/// Keeps the viewport size current. Bevy adjusts the projection aspect and
/// the surface itself and renders the resized frame right away.
pub fn track_viewport(
    mut resized: EventReader<WindowResized>,
    mut viewport: ResMut<ViewportSize>,
    windows: Query<(), With<PrimaryWindow>>,
) {
    for event in resized.read() {
        if windows.get(event.window).is_err() {
            continue;
        }
        let size = Vec2::new(event.width, event.height);
        if viewport.0 != size {
            debug!("Viewport resized to {}x{}", size.x, size.y);
            viewport.0 = size;
        }
    }
}
