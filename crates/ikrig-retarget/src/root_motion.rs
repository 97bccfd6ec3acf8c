//! Ground-plane locomotion extracted from the source skeleton.
//!
//! Whole-body motion is estimated as a weighted blend of four anchor joints
//! (hips, chest, both upper legs). The facing direction is constrained to the
//! ground plane and smoothed over a three-frame moving average; the
//! translation keeps only its horizontal components, expressed relative to
//! the rest ground position.

use nalgebra::{Isometry3, Translation3, Vector3};

use ikrig_core::joints::{JointId, JointMap};
use ikrig_core::transform::{ground_basis, normalize_or};

use crate::delta::PoseDelta;

/// Anchor joints and blend weights for root-motion estimation. Sum to 1.
const ANCHOR_WEIGHTS: [(JointId, f32); 4] = [
    (JointId::Hips, 0.5),
    (JointId::Chest, 0.3),
    (JointId::LeftUpLeg, 0.1),
    (JointId::RightUpLeg, 0.1),
];

// ---------------------------------------------------------------------------
// ForwardHistory
// ---------------------------------------------------------------------------

/// FIFO history of the two previous raw forward directions.
///
/// The smoothed forward for a frame is `normalize(raw + prev0 + prev1)`, a
/// plain moving average over the current and two prior frames. This is the
/// only state a [`crate::Retargeter`] keeps between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardHistory {
    entries: [Vector3<f32>; 2],
}

impl ForwardHistory {
    /// History seeded with the world forward (+Z).
    pub fn new() -> Self {
        Self {
            entries: [Vector3::z(), Vector3::z()],
        }
    }

    /// Sum of the stored directions.
    pub fn sum(&self) -> Vector3<f32> {
        self.entries[0] + self.entries[1]
    }

    /// Most recently pushed direction.
    pub fn latest(&self) -> Vector3<f32> {
        self.entries[1]
    }

    /// Push the newest raw direction, evicting the oldest.
    pub fn push(&mut self, forward: Vector3<f32>) {
        self.entries[0] = self.entries[1];
        self.entries[1] = forward;
    }
}

impl Default for ForwardHistory {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// RootMotion
// ---------------------------------------------------------------------------

/// Ground transforms for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RootMotion {
    /// Delta ground motion (facing + horizontal translation) relative to the
    /// rest ground position.
    pub ground: Isometry3<f32>,
    /// `ground` with its horizontal translation rescaled by the root-motion
    /// scale. This is the transform emitted to the host.
    pub scaled: Isometry3<f32>,
    /// Correction mapping ground space into rescaled ground space:
    /// `scaled * ground⁻¹`. Applied to every final output transform.
    pub to_scaled: Isometry3<f32>,
}

/// Extract this frame's root motion and advance the forward history.
///
/// Reads the prior history contents for smoothing, then pushes the new raw
/// forward exactly once. If the weighted forward degenerates to zero (which
/// valid rest poses never produce), the newest history entry is reused.
pub fn extract_root_motion(
    current: &JointMap<Isometry3<f32>>,
    rest: &JointMap<Isometry3<f32>>,
    deltas: &JointMap<PoseDelta>,
    root_motion_scale: f32,
    history: &mut ForwardHistory,
) -> RootMotion {
    let mut forward = Vector3::zeros();
    let mut translate = Vector3::zeros();
    let mut rest_translate = Vector3::zeros();
    for (id, weight) in ANCHOR_WEIGHTS {
        forward += (deltas[id].rotation * Vector3::z()) * weight;
        translate += current[id].translation.vector * weight;
        rest_translate += rest[id].translation.vector * weight;
    }

    // Facing lives in the ground plane
    forward.y = 0.0;
    let raw = normalize_or(forward, history.latest());

    // Moving average with the two previous raw directions
    let smoothed = normalize_or(raw + history.sum(), raw);
    history.push(raw);

    let ground = Isometry3::from_parts(
        Translation3::new(
            translate.x - rest_translate.x,
            0.0,
            translate.z - rest_translate.z,
        ),
        ground_basis(&smoothed),
    );

    let mut scaled = ground;
    scaled.translation.vector.x *= root_motion_scale;
    scaled.translation.vector.z *= root_motion_scale;

    RootMotion {
        to_scaled: scaled * ground.inverse(),
        ground,
        scaled,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
