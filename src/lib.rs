//! Panoramic scene viewer: cube-mapped environments linked by clickable
//! faces, optionally gated by object detection on the face image.

pub mod camera;
pub mod config;
pub mod environment;
pub mod error;
pub mod navigation;
pub mod viewer;
