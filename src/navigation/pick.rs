//! Pointer-to-face resolution.
//!
//! A pointer position is normalized to device coordinates, turned into a ray
//! from the camera, and intersected with the skybox cube. From inside the
//! cube only the interior surfaces are visible, so the face reported is the
//! one through which the ray leaves the cube.

use bevy::prelude::*;

use crate::environment::Face;

/// Below this a ray component counts as parallel to a slab.
const PARALLEL_EPSILON: f32 = 1e-8;

/// Face under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceHit {
    pub face: Face,
    /// World-space point on the face.
    pub point: Vec3,
    /// Distance along the ray.
    pub distance: f32,
    /// Pointer position in viewport pixels.
    pub pointer: Vec2,
}

/// Maps viewport pixels (origin top-left, y down) to [-1, 1] device
/// coordinates (origin centre, y up).
pub fn normalize_pointer(pointer: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        pointer.x / viewport.x * 2.0 - 1.0,
        -(pointer.y / viewport.y) * 2.0 + 1.0,
    )
}

/// Perspective camera as far as picking is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickCamera {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
}

impl PickCamera {
    pub fn from_view(transform: &GlobalTransform, projection: &PerspectiveProjection) -> Self {
        let (_, rotation, position) = transform.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            fov_y: projection.fov,
            aspect: projection.aspect_ratio,
        }
    }

    /// Ray from the camera through a point in device coordinates.
    pub fn ray_through(&self, ndc: Vec2) -> Ray3d {
        let half_height = (self.fov_y * 0.5).tan();
        let local = Vec3::new(ndc.x * half_height * self.aspect, ndc.y * half_height, -1.0);
        Ray3d {
            origin: self.position,
            direction: Dir3::new(self.rotation * local).unwrap_or(Dir3::NEG_Z),
        }
    }
}

/// The cube geometry shared by every environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyboxCube {
    pub center: Vec3,
    pub half_extent: f32,
}

impl SkyboxCube {
    pub fn new(size: f32) -> Self {
        Self {
            center: Vec3::ZERO,
            half_extent: size / 2.0,
        }
    }

    /// Where `ray` leaves the cube, or `None` if that lies behind the origin
    /// or the ray misses the cube entirely.
    pub fn intersect(&self, ray: Ray3d) -> Option<(Face, Vec3, f32)> {
        let origin = ray.origin - self.center;
        let direction = *ray.direction;
        let h = self.half_extent;

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut exit_face = None;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < PARALLEL_EPSILON {
                if o.abs() > h {
                    return None;
                }
                continue;
            }
            let t_low = (-h - o) / d;
            let t_high = (h - o) / d;
            let (near, far) = if t_low < t_high {
                (t_low, t_high)
            } else {
                (t_high, t_low)
            };
            t_enter = t_enter.max(near);
            if far < t_exit {
                t_exit = far;
                let mut axis_dir = Vec3::ZERO;
                axis_dir[axis] = d.signum();
                exit_face = Some(Face::from_direction(axis_dir));
            }
        }

        if t_enter > t_exit || t_exit < 0.0 {
            return None;
        }
        let face = exit_face?;
        Some((face, ray.origin + direction * t_exit, t_exit))
    }
}

/// Resolves a pointer position to the cube face under it.
pub fn resolve_pick(
    pointer: Vec2,
    viewport: Vec2,
    camera: &PickCamera,
    cube: &SkyboxCube,
) -> Option<FaceHit> {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return None;
    }
    let ray = camera.ray_through(normalize_pointer(pointer, viewport));
    let (face, point, distance) = cube.intersect(ray)?;
    Some(FaceHit {
        face,
        point,
        distance,
        pointer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    fn camera_looking_at(position: Vec3, target: Vec3) -> PickCamera {
        let forward = (target - position).normalize();
        let up = if forward.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
        let transform = Transform::from_translation(position).looking_at(target, up);
        PickCamera {
            position,
            rotation: transform.rotation,
            fov_y: 50f32.to_radians(),
            aspect: VIEWPORT.x / VIEWPORT.y,
        }
    }

    #[test]
    fn normalizes_corners_and_centre() {
        assert_eq!(normalize_pointer(Vec2::ZERO, VIEWPORT), Vec2::new(-1.0, 1.0));
        assert_eq!(normalize_pointer(VIEWPORT, VIEWPORT), Vec2::new(1.0, -1.0));
        assert_eq!(normalize_pointer(VIEWPORT / 2.0, VIEWPORT), Vec2::ZERO);
        assert_eq!(
            normalize_pointer(Vec2::new(200.0, 150.0), VIEWPORT),
            Vec2::new(-0.5, 0.5)
        );
    }

    #[test]
    fn centre_of_each_face_picks_that_face() {
        let cube = SkyboxCube::new(100.0);
        let eye = Vec3::new(0.0, 0.0, 25.0);
        for face in Face::ALL {
            let camera = camera_looking_at(eye, face.outward() * 50.0);
            let hit = resolve_pick(VIEWPORT / 2.0, VIEWPORT, &camera, &cube)
                .unwrap_or_else(|| panic!("no hit for {}", face));
            assert_eq!(hit.face, face);
            assert!((hit.point.dot(face.outward()) - 50.0).abs() < 1e-3);
        }
    }

    #[test]
    fn centre_of_each_face_from_cube_centre() {
        let cube = SkyboxCube::new(100.0);
        for face in Face::ALL {
            let camera = camera_looking_at(Vec3::ZERO, face.outward());
            let hit = resolve_pick(VIEWPORT / 2.0, VIEWPORT, &camera, &cube).unwrap();
            assert_eq!(hit.face, face);
            assert!((hit.distance - 50.0).abs() < 1e-3);
            assert!(hit.point.distance(face.outward() * 50.0) < 1e-3);
        }
    }

    #[test]
    fn default_view_faces_the_right_face() {
        let cube = SkyboxCube::new(100.0);
        let camera = camera_looking_at(Vec3::new(0.0, 0.0, 25.0), Vec3::ZERO);
        let hit = resolve_pick(VIEWPORT / 2.0, VIEWPORT, &camera, &cube).unwrap();
        assert_eq!(hit.face, Face::Right);
        assert!((hit.distance - 75.0).abs() < 1e-3);
        assert_eq!(hit.pointer, VIEWPORT / 2.0);
    }

    #[test]
    fn pointer_offset_moves_hit_in_screen_direction() {
        let cube = SkyboxCube::new(100.0);
        let camera = camera_looking_at(Vec3::ZERO, Vec3::NEG_Z);
        let left = resolve_pick(Vec2::new(100.0, 300.0), VIEWPORT, &camera, &cube).unwrap();
        let up = resolve_pick(Vec2::new(400.0, 50.0), VIEWPORT, &camera, &cube).unwrap();
        assert!(left.point.x < 0.0);
        assert!(up.point.y > 0.0);
    }

    #[test]
    fn ray_outside_cube_pointing_away_misses() {
        let cube = SkyboxCube::new(100.0);
        let ray = Ray3d {
            origin: Vec3::new(0.0, 0.0, 100.0),
            direction: Dir3::Z,
        };
        assert!(cube.intersect(ray).is_none());

        let parallel = Ray3d {
            origin: Vec3::new(0.0, 80.0, 100.0),
            direction: Dir3::NEG_Z,
        };
        assert!(cube.intersect(parallel).is_none());
    }

    #[test]
    fn ray_from_outside_hits_far_interior_face() {
        let cube = SkyboxCube::new(100.0);
        let ray = Ray3d {
            origin: Vec3::new(0.0, 0.0, 100.0),
            direction: Dir3::NEG_Z,
        };
        let (face, _, distance) = cube.intersect(ray).unwrap();
        assert_eq!(face, Face::Right);
        assert!((distance - 150.0).abs() < 1e-3);
    }

    #[test]
    fn empty_viewport_never_picks() {
        let cube = SkyboxCube::new(100.0);
        let camera = camera_looking_at(Vec3::ZERO, Vec3::NEG_Z);
        assert!(resolve_pick(Vec2::ZERO, Vec2::ZERO, &camera, &cube).is_none());
    }
}
