use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future, AsyncComputeTaskPool, Task};

use super::detection::Detector;
use super::gate::{Authorization, GateJob};
use super::input::PointerGesture;
use super::pick::{resolve_pick, PickCamera, SkyboxCube};
use super::transition::{TransitionController, TransitionOutcome, TransitionRequest};
use crate::camera::{OrbitController, ViewportSize};
use crate::config::ViewerConfig;
use crate::environment::EnvironmentRegistry;
use crate::error::Result;

/// A gated request whose detection is still running.
#[derive(Component)]
pub struct PendingAuthorization {
    pub request: TransitionRequest,
    pub task: Task<Result<Authorization>>,
}

/// Warms the detection model up in the background so the first gated click
/// does not pay for loading it.
pub fn preload_detector(detector: Res<Detector>) {
    let loader = detector.0.clone();
    AsyncComputeTaskPool::get()
        .spawn(async move {
            let _ = loader.model();
        })
        .detach();
}

/// Resolves each gesture to a face and starts the matching transition.
#[allow(clippy::too_many_arguments)]
pub fn handle_pointer_gestures(
    mut commands: Commands,
    mut gestures: EventReader<PointerGesture>,
    cameras: Query<(&GlobalTransform, &Projection), With<OrbitController>>,
    viewport: Res<ViewportSize>,
    config: Res<ViewerConfig>,
    registry: Res<EnvironmentRegistry>,
    detector: Res<Detector>,
    mut controller: ResMut<TransitionController>,
) {
    let Ok((transform, projection)) = cameras.get_single() else {
        gestures.clear();
        return;
    };
    let Projection::Perspective(perspective) = projection else {
        gestures.clear();
        return;
    };
    let camera = PickCamera::from_view(transform, perspective);
    let cube = SkyboxCube::new(config.cube_size);

    for gesture in gestures.read() {
        let Some(hit) = resolve_pick(gesture.position, viewport.0, &camera, &cube) else {
            continue;
        };
        let Some(request) = controller.begin(&registry, hit.face, hit.pointer, gesture.kind) else {
            continue;
        };

        let Some(gate) = request.rule.gate.clone() else {
            let outcome = controller.complete(&request, Authorization::Granted);
            log_outcome(&request, &outcome);
            continue;
        };

        let Some(environment) = registry.get(&request.from) else {
            continue;
        };
        let image_key = environment.images[request.face].clone();
        let job = GateJob {
            image_path: config.resolve_asset(&image_key),
            image_key,
            label: gate.label,
            pointer: hit.pointer,
            viewport: viewport.0,
            detector: detector.0.clone(),
        };

        debug!(
            "Request #{}: checking for '{}' on {} face of '{}'",
            request.sequence, job.label, request.face, request.from
        );
        let task = AsyncComputeTaskPool::get().spawn(job.authorize());
        commands.spawn(PendingAuthorization { request, task });
    }
}

/// Applies detection results as they finish, in completion order.
pub fn poll_pending_authorizations(
    mut commands: Commands,
    mut pending: Query<(Entity, &mut PendingAuthorization)>,
    mut controller: ResMut<TransitionController>,
) {
    for (entity, mut pending) in pending.iter_mut() {
        let Some(result) = block_on(future::poll_once(&mut pending.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        match result {
            Ok(authorization) => {
                let outcome = controller.complete(&pending.request, authorization);
                log_outcome(&pending.request, &outcome);
            }
            Err(e) => {
                warn!("Request #{} denied: {}", pending.request.sequence, e);
            }
        }
    }
}

fn log_outcome(request: &TransitionRequest, outcome: &TransitionOutcome) {
    match outcome {
        TransitionOutcome::Transitioned { from, to } => {
            info!("Moved from '{}' to '{}' via the {} face", from, to, request.face);
        }
        TransitionOutcome::Denied => {
            debug!("Request #{} denied: nothing under the pointer", request.sequence);
        }
        TransitionOutcome::Discarded => {}
    }
}
