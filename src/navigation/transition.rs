use bevy::prelude::*;

use super::gate::Authorization;
use crate::camera::{OrbitLimits, OrbitPose};
use crate::environment::{EnvironmentId, EnvironmentRegistry, ExitRule, Face, FaceSet, Trigger};

/// What the viewer is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveState {
    environment: EnvironmentId,
    camera: OrbitPose,
    limits: OrbitLimits,
    epoch: u64,
}

impl ActiveState {
    pub fn environment(&self) -> &EnvironmentId {
        &self.environment
    }

    pub fn camera(&self) -> OrbitPose {
        self.camera
    }

    pub fn limits(&self) -> OrbitLimits {
        self.limits
    }

    /// Number of accepted transitions so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// A navigation attempt awaiting authorization.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    pub sequence: u64,
    pub epoch: u64,
    pub from: EnvironmentId,
    pub face: Face,
    pub pointer: Vec2,
    pub rule: ExitRule,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Transitioned {
        from: EnvironmentId,
        to: EnvironmentId,
    },
    Denied,
    /// Superseded by a newer request or by a transition since issue.
    Discarded,
}

/// Owns [`ActiveState`] and is the only place it changes.
#[derive(Resource, Debug)]
pub struct TransitionController {
    active: ActiveState,
    default_pose: OrbitPose,
    default_limits: OrbitLimits,
    next_sequence: u64,
    /// Latest sequence issued per face; 0 when none.
    latest: FaceSet<u64>,
}

impl TransitionController {
    pub fn new(initial: EnvironmentId, default_pose: OrbitPose, default_limits: OrbitLimits) -> Self {
        Self {
            active: ActiveState {
                environment: initial,
                camera: default_pose,
                limits: default_limits,
                epoch: 0,
            },
            default_pose,
            default_limits,
            next_sequence: 1,
            latest: FaceSet::default(),
        }
    }

    pub fn active(&self) -> &ActiveState {
        &self.active
    }

    /// Tracks the live orbit pose between transitions.
    pub fn record_camera_pose(&mut self, pose: OrbitPose) {
        self.active.camera = pose;
    }

    /// Starts a transition for a `gesture` on `face` of the active
    /// environment. Returns `None` when the face has no exit or the exit
    /// reacts to a different gesture.
    pub fn begin(
        &mut self,
        registry: &EnvironmentRegistry,
        face: Face,
        pointer: Vec2,
        gesture: Trigger,
    ) -> Option<TransitionRequest> {
        let rule = registry.exit_rule(&self.active.environment, face)?;
        if rule.trigger != gesture {
            return None;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.latest[face] = sequence;

        Some(TransitionRequest {
            sequence,
            epoch: self.active.epoch,
            from: self.active.environment.clone(),
            face,
            pointer,
            rule: rule.clone(),
        })
    }

    /// A request is stale once a newer one was issued for its face or any
    /// transition happened since it was issued. The active environment only
    /// changes together with the epoch.
    pub fn is_stale(&self, request: &TransitionRequest) -> bool {
        self.latest[request.face] != request.sequence || request.epoch != self.active.epoch
    }

    /// Applies the authorization of `request`.
    pub fn complete(
        &mut self,
        request: &TransitionRequest,
        authorization: Authorization,
    ) -> TransitionOutcome {
        if self.is_stale(request) {
            debug!(
                "Discarding stale request #{} on {} face of '{}'",
                request.sequence, request.face, request.from
            );
            return TransitionOutcome::Discarded;
        }

        if !authorization.is_granted() {
            return TransitionOutcome::Denied;
        }

        let from = std::mem::replace(&mut self.active.environment, request.rule.target.clone());
        self.active.camera = self.default_pose;
        self.active.limits = self.default_limits;
        self.active.epoch += 1;

        TransitionOutcome::Transitioned {
            from,
            to: self.active.environment.clone(),
        }
    }
}
