use std::fmt;
use std::ops::{Index, IndexMut};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};

/// The six faces of the skybox cube, in their fixed index order.
///
/// The placement follows the box layout the panoramas were authored for:
/// front/back on ±X, top/bottom on ±Y, left/right on ±Z.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Front = 0,
    Back = 1,
    Top = 2,
    Bottom = 3,
    Left = 4,
    Right = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Front,
        Face::Back,
        Face::Top,
        Face::Bottom,
        Face::Left,
        Face::Right,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Face> {
        Self::ALL.get(index).copied()
    }

    /// Unit vector from the cube centre through the centre of this face.
    pub fn outward(self) -> Vec3 {
        match self {
            Face::Front => Vec3::X,
            Face::Back => Vec3::NEG_X,
            Face::Top => Vec3::Y,
            Face::Bottom => Vec3::NEG_Y,
            Face::Left => Vec3::Z,
            Face::Right => Vec3::NEG_Z,
        }
    }

    /// Directions on the face along which the texture's u and v grow
    /// (v grows down the image).
    pub fn texture_axes(self) -> (Vec3, Vec3) {
        match self {
            Face::Front => (Vec3::NEG_Z, Vec3::NEG_Y),
            Face::Back => (Vec3::Z, Vec3::NEG_Y),
            Face::Top => (Vec3::X, Vec3::Z),
            Face::Bottom => (Vec3::X, Vec3::NEG_Z),
            Face::Left => (Vec3::X, Vec3::NEG_Y),
            Face::Right => (Vec3::NEG_X, Vec3::NEG_Y),
        }
    }

    /// Face whose outward axis dominates `direction`.
    pub fn from_direction(direction: Vec3) -> Face {
        let abs = direction.abs();
        if abs.x >= abs.y && abs.x >= abs.z {
            if direction.x >= 0.0 {
                Face::Front
            } else {
                Face::Back
            }
        } else if abs.y >= abs.z {
            if direction.y >= 0.0 {
                Face::Top
            } else {
                Face::Bottom
            }
        } else if direction.z >= 0.0 {
            Face::Left
        } else {
            Face::Right
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Face::Front => "front",
            Face::Back => "back",
            Face::Top => "top",
            Face::Bottom => "bottom",
            Face::Left => "left",
            Face::Right => "right",
        };
        f.write_str(name)
    }
}

/// Exactly one value per cube face, indexed by [`Face`].
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSet<T>([T; 6]);

impl<T> FaceSet<T> {
    pub fn new(values: [T; 6]) -> Self {
        Self(values)
    }

    pub fn from_fn(mut f: impl FnMut(Face) -> T) -> Self {
        Self(Face::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Face, &T)> {
        Face::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(Face, &T) -> U) -> FaceSet<U> {
        FaceSet::from_fn(|face| f(face, &self.0[face.index()]))
    }

    pub fn front(&self) -> &T {
        &self.0[Face::Front.index()]
    }

    pub fn back(&self) -> &T {
        &self.0[Face::Back.index()]
    }

    pub fn top(&self) -> &T {
        &self.0[Face::Top.index()]
    }

    pub fn bottom(&self) -> &T {
        &self.0[Face::Bottom.index()]
    }

    pub fn left(&self) -> &T {
        &self.0[Face::Left.index()]
    }

    pub fn right(&self) -> &T {
        &self.0[Face::Right.index()]
    }
}

impl<T: Default> Default for FaceSet<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Face> for FaceSet<T> {
    type Output = T;

    fn index(&self, face: Face) -> &T {
        &self.0[face.index()]
    }
}

impl<T> IndexMut<Face> for FaceSet<T> {
    fn index_mut(&mut self, face: Face) -> &mut T {
        &mut self.0[face.index()]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentId(pub String);

impl EnvironmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pointer gesture that fires an exit rule.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Click,
    DoubleClick,
}

/// Detection requirement of a gated exit.
#[derive(Debug, Clone, PartialEq)]
pub struct GateRule {
    /// Detected class that must lie under the pointer.
    pub label: String,
}

/// Navigation configured on one face of an environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitRule {
    pub target: EnvironmentId,
    pub gate: Option<GateRule>,
    pub trigger: Trigger,
}

impl ExitRule {
    pub fn plain(target: EnvironmentId) -> Self {
        Self {
            target,
            gate: None,
            trigger: Trigger::Click,
        }
    }

    pub fn gated(target: EnvironmentId, label: impl Into<String>) -> Self {
        Self {
            target,
            gate: Some(GateRule {
                label: label.into(),
            }),
            trigger: Trigger::DoubleClick,
        }
    }

    pub fn is_gated(&self) -> bool {
        self.gate.is_some()
    }
}

/// A cube-mapped scene.
#[derive(Debug, Clone)]
pub struct Environment {
    pub id: EnvironmentId,
    /// Asset-relative image path per face.
    pub images: FaceSet<String>,
    pub exits: FaceSet<Option<ExitRule>>,
}

impl Environment {
    pub fn exit_rule(&self, face: Face) -> Option<&ExitRule> {
        self.exits[face].as_ref()
    }
}

/// Every navigable environment. Read-only after startup.
#[derive(Resource, Debug, Clone)]
pub struct EnvironmentRegistry {
    environments: Vec<Environment>,
    default: EnvironmentId,
}

impl EnvironmentRegistry {
    pub fn new(environments: Vec<Environment>, default: EnvironmentId) -> Result<Self> {
        for (i, env) in environments.iter().enumerate() {
            if environments[..i].iter().any(|other| other.id == env.id) {
                return Err(ViewerError::config(format!(
                    "environment '{}' is defined twice",
                    env.id
                )));
            }
        }

        if !environments.iter().any(|env| env.id == default) {
            return Err(ViewerError::config(format!(
                "default environment '{}' is not defined",
                default
            )));
        }

        for env in &environments {
            for (face, rule) in env.exits.iter() {
                let Some(rule) = rule else {
                    continue;
                };
                if !environments.iter().any(|other| other.id == rule.target) {
                    return Err(ViewerError::config(format!(
                        "exit on {} face of '{}' targets unknown environment '{}'",
                        face, env.id, rule.target
                    )));
                }
            }
        }

        Ok(Self {
            environments,
            default,
        })
    }

    pub fn from_config(config: &ViewerConfig) -> Result<Self> {
        let mut environments = Vec::with_capacity(config.environments.len());

        for env in &config.environments {
            let mut exits: FaceSet<Option<ExitRule>> = FaceSet::default();
            for exit in &env.exits {
                if exits[exit.face].is_some() {
                    return Err(ViewerError::config(format!(
                        "{} face of '{}' has more than one exit",
                        exit.face, env.id
                    )));
                }
                let target = EnvironmentId::new(exit.target.clone());
                let mut rule = match &exit.gate {
                    Some(label) => ExitRule::gated(target, label.clone()),
                    None => ExitRule::plain(target),
                };
                if let Some(trigger) = exit.trigger {
                    rule.trigger = trigger;
                }
                exits[exit.face] = Some(rule);
            }

            environments.push(Environment {
                id: EnvironmentId::new(env.id.clone()),
                images: env.faces.clone().into_face_set(),
                exits,
            });
        }

        Self::new(
            environments,
            EnvironmentId::new(config.default_environment.clone()),
        )
    }

    pub fn get(&self, id: &EnvironmentId) -> Option<&Environment> {
        self.environments.iter().find(|env| &env.id == id)
    }

    pub fn exit_rule(&self, id: &EnvironmentId, face: Face) -> Option<&ExitRule> {
        self.get(id).and_then(|env| env.exit_rule(face))
    }

    pub fn default_environment(&self) -> &EnvironmentId {
        &self.default
    }

    pub fn iter(&self) -> impl Iterator<Item = &Environment> {
        self.environments.iter()
    }
}

/// Marker for one quad of the shared skybox cube.
#[derive(Component)]
pub struct SkyboxFace(pub Face);
