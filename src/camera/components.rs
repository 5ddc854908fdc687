use bevy::prelude::*;

use crate::config::CameraConfig;

/// Keeps the orbit just short of the poles so `looking_at` never degenerates.
pub const PITCH_LIMIT: f32 = 1.55;

/// Camera placement on a sphere around a target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitPose {
    pub target: Vec3,
    /// Rotation around +Y, zero looking down -Z.
    pub yaw: f32,
    /// Elevation above the target's horizontal plane.
    pub pitch: f32,
    pub distance: f32,
}

impl OrbitPose {
    pub fn from_position(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return Self {
                target,
                yaw: 0.0,
                pitch: 0.0,
                distance: 0.0,
            };
        }
        Self {
            target,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + Vec3::new(sin_yaw * cos_pitch, sin_pitch, cos_yaw * cos_pitch) * self.distance
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitLimits {
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitLimits {
    pub fn clamp(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }
}

/// Orbit controls attached to the viewer camera.
#[derive(Component, Debug, Clone)]
pub struct OrbitController {
    pub pose: OrbitPose,
    pub limits: OrbitLimits,
    pub default_pose: OrbitPose,
    pub default_limits: OrbitLimits,
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// Fraction of the distance per wheel line.
    pub zoom_speed: f32,
}

impl OrbitController {
    pub fn new(pose: OrbitPose, limits: OrbitLimits) -> Self {
        let mut pose = pose;
        pose.distance = limits.clamp(pose.distance);
        Self {
            pose,
            limits,
            default_pose: pose,
            default_limits: limits,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let pose = OrbitPose::from_position(
            Vec3::from_array(config.position),
            Vec3::from_array(config.target),
        );
        let limits = OrbitLimits {
            min_distance: config.min_distance,
            max_distance: config.max_distance,
        };
        Self {
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            ..Self::new(pose, limits)
        }
    }

    /// Orbits by a pointer drag of `delta` pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.pose.yaw -= delta.x * self.rotate_speed;
        self.pose.pitch = (self.pose.pitch + delta.y * self.rotate_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Moves toward the target for positive `lines`, away for negative.
    pub fn dolly(&mut self, lines: f32) {
        let scale = (1.0 - self.zoom_speed).powf(lines);
        self.pose.distance = self.limits.clamp(self.pose.distance * scale);
    }

    /// Replaces pose and limits, keeping the distance inside the new limits.
    pub fn set(&mut self, pose: OrbitPose, limits: OrbitLimits) {
        self.limits = limits;
        self.pose = pose;
        self.pose.distance = limits.clamp(pose.distance);
    }

    pub fn reset(&mut self) {
        self.set(self.default_pose, self.default_limits);
    }
}

/// Logical size of the primary window, kept current across resizes.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize(pub Vec2);

impl Default for ViewportSize {
    fn default() -> Self {
        Self(Vec2::new(1280.0, 720.0))
    }
}
