//! Object-detection capability consumed by the region gate.
//!
//! The detector itself is opaque: it receives a decoded face image and
//! returns labelled bounding boxes in image pixels.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use bevy::prelude::*;
use image::DynamicImage;
use serde::Deserialize;

use crate::error::{Result, ViewerError};

/// A region found by the detector, in source-image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedRegion {
    pub label: String,
    pub bbox: Rect,
    pub score: f32,
}

impl DetectedRegion {
    /// Builds a region from an `[x, y, width, height]` box.
    pub fn from_xywh(label: impl Into<String>, [x, y, width, height]: [f32; 4], score: f32) -> Self {
        Self {
            label: label.into(),
            bbox: Rect::new(x, y, x + width, y + height),
            score,
        }
    }
}

impl fmt::Display for DetectedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.bbox.size();
        write!(
            f,
            "{} at [{}, {}, {}, {}] score {:.2}",
            self.label, self.bbox.min.x, self.bbox.min.y, size.x, size.y, self.score
        )
    }
}

/// Decoded face image handed to the detector.
pub struct FaceImage {
    /// Asset-relative path, used as the image's identity.
    pub key: String,
    pub path: PathBuf,
    pub image: DynamicImage,
}

impl FaceImage {
    pub fn open(key: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let image = image::open(&path).map_err(|source| ViewerError::AssetLoad {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            key: key.into(),
            path,
            image,
        })
    }

    /// Width and height in pixels.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.image.width() as f32, self.image.height() as f32)
    }
}

pub trait ObjectDetector: Send + Sync {
    fn detect(&self, image: &FaceImage) -> Result<Vec<DetectedRegion>>;
}

type LoadFn = Box<dyn Fn() -> Result<Arc<dyn ObjectDetector>> + Send + Sync>;

/// Loads the detection model on first use and shares it afterwards.
///
/// A failed load is remembered; every later request reports the same error.
pub struct DetectorLoader {
    load: LoadFn,
    model: OnceLock<std::result::Result<Arc<dyn ObjectDetector>, String>>,
}

impl DetectorLoader {
    pub fn new(load: impl Fn() -> Result<Arc<dyn ObjectDetector>> + Send + Sync + 'static) -> Self {
        Self {
            load: Box::new(load),
            model: OnceLock::new(),
        }
    }

    /// A loader whose model is already available.
    pub fn ready(detector: Arc<dyn ObjectDetector>) -> Self {
        let loader = Self::new(|| {
            Err(ViewerError::DetectorLoad {
                reason: "model already set".to_string(),
            })
        });
        let _ = loader.model.set(Ok(detector));
        loader
    }

    /// A loader that always fails, for setups without a model.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(move || {
            Err(ViewerError::DetectorLoad {
                reason: reason.clone(),
            })
        })
    }

    /// Precomputed detections read from a JSON annotation file.
    pub fn annotations(path: PathBuf, min_score: f32) -> Self {
        Self::new(move || {
            let detector = AnnotationDetector::load(&path)?.with_min_score(min_score);
            Ok(Arc::new(detector) as Arc<dyn ObjectDetector>)
        })
    }

    pub fn model(&self) -> Result<Arc<dyn ObjectDetector>> {
        let model = self.model.get_or_init(|| {
            let loaded = (self.load)();
            match &loaded {
                Ok(_) => info!("Detection model loaded"),
                Err(e) => error!("{}", e),
            }
            loaded.map_err(|e| e.to_string())
        });
        match model {
            Ok(detector) => Ok(Arc::clone(detector)),
            Err(reason) => Err(ViewerError::DetectorLoad {
                reason: reason.clone(),
            }),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.model.get(), Some(Ok(_)))
    }
}

/// Shared handle to the process-wide detector.
#[derive(Resource, Clone)]
pub struct Detector(pub Arc<DetectorLoader>);

/// One prediction as stored in an annotation file: `class`, `bbox` as
/// `[x, y, width, height]` and `score`.
#[derive(Deserialize, Debug, Clone)]
struct Prediction {
    class: String,
    bbox: [f32; 4],
    #[serde(default = "full_score")]
    score: f32,
}

fn full_score() -> f32 {
    1.0
}

/// Detector backed by predictions computed ahead of time, keyed by the
/// face image's asset path.
pub struct AnnotationDetector {
    predictions: HashMap<String, Vec<Prediction>>,
    min_score: f32,
}

impl AnnotationDetector {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ViewerError::DetectorLoad {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json(&text).map_err(|e| ViewerError::DetectorLoad {
            reason: format!("{}: {}", path.display(), e),
        })
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        Ok(Self {
            predictions: serde_json::from_str(text)?,
            min_score: 0.0,
        })
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

impl ObjectDetector for AnnotationDetector {
    fn detect(&self, image: &FaceImage) -> Result<Vec<DetectedRegion>> {
        let Some(predictions) = self.predictions.get(&image.key) else {
            return Ok(Vec::new());
        };
        Ok(predictions
            .iter()
            .filter(|p| p.score >= self.min_score)
            .map(|p| DetectedRegion::from_xywh(p.class.clone(), p.bbox, p.score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed(Vec<DetectedRegion>);

    impl ObjectDetector for Fixed {
        fn detect(&self, _image: &FaceImage) -> Result<Vec<DetectedRegion>> {
            Ok(self.0.clone())
        }
    }

    fn blank_image(key: &str) -> FaceImage {
        FaceImage {
            key: key.to_string(),
            path: PathBuf::from(key),
            image: DynamicImage::new_rgb8(100, 80),
        }
    }

    #[test]
    fn region_from_xywh() {
        let region = DetectedRegion::from_xywh("car", [10.0, 20.0, 30.0, 40.0], 0.9);
        assert_eq!(region.bbox.min, Vec2::new(10.0, 20.0));
        assert_eq!(region.bbox.max, Vec2::new(40.0, 60.0));
    }

    #[test]
    fn region_displays_as_xywh() {
        let region = DetectedRegion::from_xywh("car", [10.0, 20.0, 30.0, 40.0], 0.9);
        assert_eq!(region.to_string(), "car at [10, 20, 30, 40] score 0.90");
    }

    #[test]
    fn model_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let loader = DetectorLoader::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Fixed(Vec::new())) as Arc<dyn ObjectDetector>)
        });
        assert!(!loader.is_loaded());
        loader.model().unwrap();
        loader.model().unwrap();
        assert!(loader.is_loaded());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_is_reported_every_time() {
        let loader = DetectorLoader::unavailable("no model configured");
        for _ in 0..2 {
            let err = loader.model().err().unwrap();
            assert!(matches!(err, ViewerError::DetectorLoad { .. }));
        }
        assert!(!loader.is_loaded());
    }

    #[test]
    fn ready_loader_returns_its_detector() {
        let region = DetectedRegion::from_xywh("door", [0.0, 0.0, 1.0, 1.0], 1.0);
        let loader = DetectorLoader::ready(Arc::new(Fixed(vec![region.clone()])));
        let regions = loader.model().unwrap().detect(&blank_image("a.jpg")).unwrap();
        assert_eq!(regions, vec![region]);
    }

    #[test]
    fn annotations_filter_by_image_and_score() {
        let detector = AnnotationDetector::from_json(
            r#"{
                "model/first/right.jpg": [
                    { "class": "car", "bbox": [10, 10, 50, 50], "score": 0.92 },
                    { "class": "person", "bbox": [0, 0, 5, 5], "score": 0.2 }
                ],
                "model/first/left.jpg": [ { "class": "door", "bbox": [1, 2, 3, 4] } ]
            }"#,
        )
        .unwrap()
        .with_min_score(0.5);

        let regions = detector.detect(&blank_image("model/first/right.jpg")).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].label, "car");

        let regions = detector.detect(&blank_image("model/first/left.jpg")).unwrap();
        assert_eq!(regions[0].score, 1.0);

        assert!(detector.detect(&blank_image("other.jpg")).unwrap().is_empty());
    }

    #[test]
    fn shipped_annotations_gate_the_built_in_scenes() {
        let config = crate::config::ViewerConfig::default();
        let path = config.resolve_asset(config.detector.annotations.as_deref().unwrap());
        let loader = DetectorLoader::annotations(path, config.detector.min_score);
        let model = loader.model().unwrap();

        let gated = &config.environments[0];
        let regions = model.detect(&blank_image(&gated.faces.right)).unwrap();
        let label = gated.exits[0].gate.as_deref().unwrap();
        assert!(regions.iter().any(|r| r.label == label));
    }

    #[test]
    fn missing_annotation_file_fails_to_load() {
        let loader = DetectorLoader::annotations(
            std::env::temp_dir().join("panoview-missing-detections.json"),
            0.5,
        );
        assert!(loader.model().is_err());
    }

    #[test]
    fn opening_missing_image_is_asset_error() {
        let path = std::env::temp_dir().join("panoview-missing-face.jpg");
        let err = FaceImage::open("missing.jpg", path).err().unwrap();
        assert!(matches!(err, ViewerError::AssetLoad { .. }));
    }
}
