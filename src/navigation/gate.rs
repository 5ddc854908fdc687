//! Detection-gated authorization of exits.
//!
//! Detected boxes are mapped to the screen by scaling image pixels to
//! viewport pixels independently per axis. This treats the face image as if
//! it filled the viewport, which is only an approximation of where the face
//! actually appears under perspective.

use std::path::PathBuf;
use std::sync::Arc;

use bevy::prelude::*;

use super::detection::{DetectedRegion, DetectorLoader, FaceImage};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Denied,
}

impl Authorization {
    pub fn is_granted(self) -> bool {
        self == Authorization::Granted
    }
}

/// Maps a box in image pixels to viewport pixels.
pub fn scale_to_screen(bbox: Rect, image_size: Vec2, viewport: Vec2) -> Rect {
    let scale = viewport / image_size;
    Rect {
        min: bbox.min * scale,
        max: bbox.max * scale,
    }
}

/// First region carrying `label` whose scaled box contains `pointer`
/// (edges included).
pub fn region_under_pointer<'a>(
    regions: &'a [DetectedRegion],
    label: &str,
    image_size: Vec2,
    viewport: Vec2,
    pointer: Vec2,
) -> Option<&'a DetectedRegion> {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return None;
    }
    regions
        .iter()
        .filter(|region| region.label == label)
        .find(|region| scale_to_screen(region.bbox, image_size, viewport).contains(pointer))
}

/// Everything a gated authorization needs, detached from the ECS so it can
/// run on a task pool.
pub struct GateJob {
    /// Asset-relative path of the face image.
    pub image_key: String,
    pub image_path: PathBuf,
    pub label: String,
    pub pointer: Vec2,
    pub viewport: Vec2,
    pub detector: Arc<DetectorLoader>,
}

impl GateJob {
    /// Loads the face image, runs detection and checks the pointer against
    /// the matching regions. The image is decoded on every call.
    pub async fn authorize(self) -> Result<Authorization> {
        let face = FaceImage::open(self.image_key, self.image_path)?;
        let model = self.detector.model()?;
        let regions = model.detect(&face)?;
        debug!(
            "{} regions detected in {}",
            regions.len(),
            face.path.display()
        );
        for region in &regions {
            debug!("Detected {}", region);
        }

        match region_under_pointer(&regions, &self.label, face.size(), self.viewport, self.pointer) {
            Some(region) => {
                debug!(
                    "Pointer {:?} inside '{}' at {:?}",
                    self.pointer, region.label, region.bbox
                );
                Ok(Authorization::Granted)
            }
            None => Ok(Authorization::Denied),
        }
    }
}
