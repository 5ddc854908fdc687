use bevy::prelude::*;

use super::components::SkyboxFace;
use super::setup::EnvironmentMaterials;
use crate::navigation::TransitionController;

/// Swaps the cube's face materials to the active environment's after a
/// transition. The geometry itself never changes.
pub fn show_active_environment(
    controller: Res<TransitionController>,
    materials: Option<Res<EnvironmentMaterials>>,
    mut last_epoch: Local<Option<u64>>,
    mut faces: Query<(&SkyboxFace, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    let Some(materials) = materials else {
        return;
    };
    let active = controller.active();
    if *last_epoch == Some(active.epoch()) {
        return;
    }

    let Some(face_materials) = materials.0.get(active.environment()) else {
        error!("No materials for environment '{}'", active.environment());
        return;
    };
    for (SkyboxFace(face), mut material) in faces.iter_mut() {
        material.0 = face_materials[*face].clone();
    }
    *last_epoch = Some(active.epoch());
    debug!("Showing environment '{}'", active.environment());
}
