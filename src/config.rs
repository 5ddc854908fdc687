use std::path::{Path, PathBuf};

use bevy::asset::io::file::FileAssetReader;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::environment::{Face, FaceSet, Trigger};
use crate::error::{Result, ViewerError};

/// Environment variable naming an alternative configuration file.
pub const CONFIG_ENV_VAR: &str = "PANOVIEW_CONFIG";

/// Configuration file looked up inside the asset directory when
/// `PANOVIEW_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "panoview.json";

/// Asset directory, relative to the Bevy asset base path. Matches the
/// asset server's default so textures and detection inputs agree.
pub const ASSET_DIR: &str = "assets";

/// Top-level viewer configuration.
#[derive(Resource, Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ViewerConfig {
    pub title: String,
    pub default_environment: String,
    /// Edge length of the skybox cube.
    pub cube_size: f32,
    /// Logs frame time and FPS once a second.
    pub frame_stats: bool,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub detector: DetectorConfig,
    pub environments: Vec<EnvironmentConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians of orbit per pixel of mouse drag.
    pub rotate_speed: f32,
    /// Fraction of the current distance per wheel line.
    pub zoom_speed: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum delay between two clicks of a double-click.
    pub double_click_ms: u64,
    /// Maximum pointer travel (px) between two clicks of a double-click.
    pub double_click_slop: f32,
    /// Pointer travel (px) after which a press is an orbit drag, not a click.
    pub drag_threshold: f32,
}

/// Gated exits stay closed unless the annotations file loads and lists a
/// region of the gate's class for the face image. The shipped
/// `assets/model/detections.json` covers the built-in scenes.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DetectorConfig {
    /// Precomputed detections file, relative to the asset root.
    pub annotations: Option<String>,
    /// Predictions scoring below this are ignored.
    pub min_score: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnvironmentConfig {
    pub id: String,
    pub faces: FaceImages,
    #[serde(default)]
    pub exits: Vec<ExitConfig>,
}

/// One image per cube face. Every field is required, so a parsed
/// environment always has exactly six faces.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FaceImages {
    pub front: String,
    pub back: String,
    pub top: String,
    pub bottom: String,
    pub left: String,
    pub right: String,
}

impl FaceImages {
    pub fn into_face_set(self) -> FaceSet<String> {
        FaceSet::new([
            self.front,
            self.back,
            self.top,
            self.bottom,
            self.left,
            self.right,
        ])
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExitConfig {
    pub face: Face,
    pub target: String,
    /// Class label the detector must find under the pointer. Absent for
    /// plain navigation.
    #[serde(default)]
    pub gate: Option<String>,
    #[serde(default)]
    pub trigger: Option<Trigger>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Panoview".to_string(),
            default_environment: "first".to_string(),
            cube_size: 100.0,
            frame_stats: true,
            camera: CameraConfig::default(),
            input: InputConfig::default(),
            detector: DetectorConfig::default(),
            environments: vec![
                EnvironmentConfig {
                    id: "first".to_string(),
                    faces: FaceImages {
                        front: "model/MarriottMadisonWest/front.jpg".to_string(),
                        back: "model/MarriottMadisonWest/back.jpg".to_string(),
                        top: "model/MarriottMadisonWest/top.jpg".to_string(),
                        bottom: "model/MarriottMadisonWest/bottom.jpg".to_string(),
                        left: "model/MarriottMadisonWest/left.jpg".to_string(),
                        right: "model/MarriottMadisonWest/right.jpg".to_string(),
                    },
                    exits: vec![ExitConfig {
                        face: Face::Right,
                        target: "second".to_string(),
                        gate: Some("car".to_string()),
                        trigger: None,
                    }],
                },
                EnvironmentConfig {
                    id: "second".to_string(),
                    faces: FaceImages {
                        front: "model/heaven/front.jpg".to_string(),
                        back: "model/heaven/back.jpg".to_string(),
                        top: "model/heaven/top.jpg".to_string(),
                        bottom: "model/heaven/bottom.jpg".to_string(),
                        left: "model/Vasa/left.jpg".to_string(),
                        right: "model/heaven/right.jpg".to_string(),
                    },
                    exits: vec![ExitConfig {
                        face: Face::Left,
                        target: "first".to_string(),
                        gate: None,
                        trigger: None,
                    }],
                },
            ],
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 25.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 50.0,
            near: 0.1,
            far: 1000.0,
            min_distance: 10.0,
            max_distance: 40.0,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            double_click_ms: 400,
            double_click_slop: 6.0,
            drag_threshold: 4.0,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            annotations: Some("model/detections.json".to_string()),
            min_score: 0.5,
        }
    }
}

impl ViewerConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ViewerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ViewerError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Loads the configuration named by `PANOVIEW_CONFIG`, or the default
    /// file in the asset directory. Falls back to the built-in two-scene
    /// setup when no file exists or it cannot be used.
    pub fn from_env() -> Self {
        let path = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => PathBuf::from(path),
            None => {
                let path = asset_dir().join(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    info!("No configuration at {}, using built-in scenes", path.display());
                    return Self::default();
                }
                path
            }
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                error!("{}; using built-in scenes", e);
                Self::default()
            }
        }
    }

    /// Resolves an asset-relative path to a filesystem path.
    pub fn resolve_asset(&self, relative: &str) -> PathBuf {
        asset_dir().join(relative)
    }
}

/// Filesystem directory the asset server reads from.
pub fn asset_dir() -> PathBuf {
    FileAssetReader::get_base_path().join(ASSET_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_config_has_two_linked_scenes() {
        let config = ViewerConfig::default();
        assert_eq!(config.environments.len(), 2);
        assert_eq!(config.default_environment, "first");

        let first = &config.environments[0];
        assert_eq!(first.exits[0].face, Face::Right);
        assert_eq!(first.exits[0].gate.as_deref(), Some("car"));

        let second = &config.environments[1];
        assert_eq!(second.exits[0].face, Face::Left);
        assert!(second.exits[0].gate.is_none());
    }

    #[test]
    fn parses_partial_json_with_defaults() {
        let json = r#"{
            "default_environment": "lobby",
            "camera": { "min_distance": 5.0 },
            "environments": [{
                "id": "lobby",
                "faces": {
                    "front": "f.jpg", "back": "b.jpg", "top": "t.jpg",
                    "bottom": "d.jpg", "left": "l.jpg", "right": "r.jpg"
                },
                "exits": [{ "face": "front", "target": "lobby", "gate": "door", "trigger": "click" }]
            }]
        }"#;
        let config = ViewerConfig::from_json(json).unwrap();
        assert_eq!(config.default_environment, "lobby");
        assert_eq!(config.camera.min_distance, 5.0);
        assert_eq!(config.camera.max_distance, 40.0);
        assert_eq!(config.cube_size, 100.0);
        assert!(config.frame_stats);

        let exit = &config.environments[0].exits[0];
        assert_eq!(exit.face, Face::Front);
        assert_eq!(exit.trigger, Some(Trigger::Click));
    }

    #[test]
    fn rejects_environment_missing_a_face() {
        let json = r#"{
            "environments": [{
                "id": "broken",
                "faces": { "front": "f.jpg", "back": "b.jpg", "top": "t.jpg", "bottom": "d.jpg", "left": "l.jpg" }
            }]
        }"#;
        assert!(ViewerConfig::from_json(json).is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("panoview-does-not-exist.json");
        let err = ViewerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ViewerError::Io { .. }));
    }

    #[test]
    fn face_images_keep_face_order() {
        let faces = ViewerConfig::default().environments[1]
            .faces
            .clone()
            .into_face_set();
        assert_eq!(faces.left(), "model/Vasa/left.jpg");
        assert_eq!(faces.right(), "model/heaven/right.jpg");
        assert_eq!(faces[Face::Front], "model/heaven/front.jpg");
    }
}
