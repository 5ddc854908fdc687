use std::collections::HashMap;

use bevy::prelude::*;
use bevy::render::mesh::Indices;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::PrimitiveTopology;

use super::components::{EnvironmentId, EnvironmentRegistry, Face, FaceSet, SkyboxFace};
use crate::config::ViewerConfig;

/// Face materials of every environment, created once at startup.
#[derive(Resource, Default)]
pub struct EnvironmentMaterials(pub HashMap<EnvironmentId, FaceSet<Handle<StandardMaterial>>>);

/// Builds the quad covering one face of a cube of the given half extent,
/// textured so the image reads upright from outside the cube.
pub fn face_mesh(face: Face, half_extent: f32) -> Mesh {
    let center = face.outward() * half_extent;
    let (u, v) = face.texture_axes();
    let u = u * half_extent;
    let v = v * half_extent;

    let positions: Vec<[f32; 3]> = vec![
        (center - u - v).to_array(),
        (center + u - v).to_array(),
        (center - u + v).to_array(),
        (center + u + v).to_array(),
    ];
    let normal = (-face.outward()).to_array();
    let normals = vec![normal; 4];
    let uvs: Vec<[f32; 2]> = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(vec![0, 2, 1, 1, 2, 3]))
}

/// Loads every environment's face textures and spawns the shared cube
/// showing the default environment.
pub fn setup_skybox(
    mut commands: Commands,
    config: Res<ViewerConfig>,
    registry: Res<EnvironmentRegistry>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut environment_materials = EnvironmentMaterials::default();

    for env in registry.iter() {
        let face_materials = env.images.map(|_, path| {
            materials.add(StandardMaterial {
                base_color_texture: Some(asset_server.load(path.clone())),
                unlit: true,
                double_sided: true,
                cull_mode: None,
                ..default()
            })
        });
        environment_materials.0.insert(env.id.clone(), face_materials);
        debug!("Prepared materials for environment '{}'", env.id);
    }

    let Some(initial) = environment_materials.0.get(registry.default_environment()) else {
        error!(
            "No materials for default environment '{}'",
            registry.default_environment()
        );
        return;
    };

    let half_extent = config.cube_size / 2.0;
    for face in Face::ALL {
        commands.spawn((
            SkyboxFace(face),
            Mesh3d(meshes.add(face_mesh(face, half_extent))),
            MeshMaterial3d(initial[face].clone()),
            Transform::default(),
        ));
    }

    info!(
        "Skybox ready: {} environments, starting in '{}'",
        registry.iter().count(),
        registry.default_environment()
    );
    commands.insert_resource(environment_materials);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;

    #[test]
    fn face_mesh_lies_on_its_face() {
        for face in Face::ALL {
            let mesh = face_mesh(face, 50.0);
            let Some(VertexAttributeValues::Float32x3(positions)) =
                mesh.attribute(Mesh::ATTRIBUTE_POSITION)
            else {
                panic!("missing positions");
            };
            assert_eq!(positions.len(), 4);
            for p in positions {
                let p = Vec3::from_array(*p);
                assert!((p.dot(face.outward()) - 50.0).abs() < 1e-4);
                assert!(p.abs().max_element() <= 50.0 + 1e-4);
            }
        }
    }

    #[test]
    fn face_mesh_has_two_triangles() {
        let mesh = face_mesh(Face::Right, 1.0);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(6));
    }
}
