//! Per-character frame evaluation.
//!
//! [`Retargeter`] validates the frame's inputs, extracts root motion, then
//! runs the chain solvers in dependency order: hips, legs, chest, arms, neck
//! and head. Every resolved transform is corrected into rescaled root-motion
//! space before being decomposed for the host.

use nalgebra::{Isometry3, Vector3};

use ikrig_core::error::EvalError;
use ikrig_core::joints::{JointId, JointMap};
use ikrig_core::params::RigParams;
use ikrig_core::transform::{euler_xyz, is_finite, DIR_EPS};

use crate::chains::{
    solve_arm, solve_chest, solve_head, solve_hips, solve_leg, ChainContext,
};
use crate::delta::compute_deltas;
use crate::root_motion::{extract_root_motion, ForwardHistory};

/// One frame of input, all transforms in world space.
///
/// `params` is expected to be validated ([`RigParams::validate`] or
/// [`RigParams::from_file`]) before evaluation.
pub struct RigInput<'a> {
    /// Source skeleton, current frame.
    pub current: &'a JointMap<Isometry3<f32>>,
    /// Source skeleton, rest pose.
    pub rest: &'a JointMap<Isometry3<f32>>,
    /// Target skeleton, rest pose.
    pub target_rest: &'a JointMap<Isometry3<f32>>,
    pub params: &'a RigParams,
}

/// Decomposed world transform for one output joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPose {
    pub translation: Vector3<f32>,
    /// Euler XYZ angles in radians (X applied first).
    pub rotation_xyz: Vector3<f32>,
}

impl Default for JointPose {
    fn default() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation_xyz: Vector3::zeros(),
        }
    }
}

/// One frame of output.
#[derive(Debug, Clone, PartialEq)]
pub struct RigOutput {
    pub joints: JointMap<JointPose>,
    /// Rescaled ground-plane root motion.
    pub root_motion: Isometry3<f32>,
}

// ---------------------------------------------------------------------------
// Retargeter
// ---------------------------------------------------------------------------

/// Per-character evaluation unit.
///
/// The only state carried across frames is the forward-direction history used
/// to smooth the root-motion facing, so one value per character; characters
/// may be evaluated in parallel by the caller.
#[derive(Debug, Clone, Default)]
pub struct Retargeter {
    history: ForwardHistory,
}

impl Retargeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the smoothing history, e.g. after teleporting the character.
    pub fn reset(&mut self) {
        self.history = ForwardHistory::new();
    }

    /// Evaluate one frame.
    ///
    /// # Errors
    ///
    /// Fails without touching the smoothing history when an input transform
    /// is non-finite or the input rest pose has degenerate proportions.
    pub fn evaluate(&mut self, input: &RigInput) -> Result<RigOutput, EvalError> {
        validate(input)?;

        let deltas = compute_deltas(input.rest, input.current);
        let root = extract_root_motion(
            input.current,
            input.rest,
            &deltas,
            input.params.root_motion_scale,
            &mut self.history,
        );

        let ctx = ChainContext {
            current: input.current,
            rest: input.rest,
            target_rest: input.target_rest,
            deltas: &deltas,
            root: &root,
            hip_scale: input.target_rest[JointId::Hips].translation.vector.y
                / input.rest[JointId::Hips].translation.vector.y,
        };

        let hips = solve_hips(&ctx);
        let left_leg = solve_leg(
            &ctx,
            JointId::LeftUpLeg,
            JointId::LeftLoLeg,
            JointId::LeftFoot,
            &hips,
            input.params.left_leg_twist,
            input.params.stride_scale,
        );
        let right_leg = solve_leg(
            &ctx,
            JointId::RightUpLeg,
            JointId::RightLoLeg,
            JointId::RightFoot,
            &hips,
            input.params.right_leg_twist,
            input.params.stride_scale,
        );
        let chest = solve_chest(&ctx, &hips);
        let left_arm = solve_arm(
            &ctx,
            JointId::LeftClavicle,
            JointId::LeftShoulder,
            JointId::LeftElbow,
            JointId::LeftHand,
            &chest,
            0.0,
            &input.params.left_hand_offset(),
        );
        let right_arm = solve_arm(
            &ctx,
            JointId::RightClavicle,
            JointId::RightShoulder,
            JointId::RightElbow,
            JointId::RightHand,
            &chest,
            0.0,
            &Isometry3::identity(),
        );
        let head = solve_head(&ctx, &chest);

        let world = JointMap::from_fn(|id| match id {
            JointId::Hips => hips,
            JointId::Chest => chest,
            JointId::Neck => head.neck,
            JointId::Head => head.head,
            JointId::LeftUpLeg => left_leg.upper,
            JointId::LeftLoLeg => left_leg.lower,
            JointId::LeftFoot => left_leg.foot,
            JointId::RightUpLeg => right_leg.upper,
            JointId::RightLoLeg => right_leg.lower,
            JointId::RightFoot => right_leg.foot,
            JointId::LeftClavicle => left_arm.clavicle,
            JointId::LeftShoulder => left_arm.upper,
            JointId::LeftElbow => left_arm.lower,
            JointId::LeftHand => left_arm.hand,
            JointId::RightClavicle => right_arm.clavicle,
            JointId::RightShoulder => right_arm.upper,
            JointId::RightElbow => right_arm.lower,
            JointId::RightHand => right_arm.hand,
        });

        let joints = JointMap::from_fn(|id| decompose(&(root.to_scaled * world[id])));
        Ok(RigOutput {
            joints,
            root_motion: root.scaled,
        })
    }
}

fn decompose(m: &Isometry3<f32>) -> JointPose {
    JointPose {
        translation: m.translation.vector,
        rotation_xyz: euler_xyz(&m.rotation),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(input: &RigInput) -> Result<(), EvalError> {
    for (map, which) in [
        (input.current, "input"),
        (input.rest, "input rest"),
        (input.target_rest, "target rest"),
    ] {
        for (joint, m) in map.iter() {
            if !is_finite(m) {
                return Err(EvalError::NonFiniteTransform { joint, which });
            }
        }
    }

    let rest = input.rest;
    let y = |id: JointId| rest[id].translation.vector.y;
    if y(JointId::Hips).abs() <= DIR_EPS {
        return Err(EvalError::DegenerateRestPose {
            joint: JointId::Hips,
            reason: "rest hip height is zero",
        });
    }
    if (y(JointId::Chest) - y(JointId::Hips)).abs() <= DIR_EPS {
        return Err(EvalError::DegenerateRestPose {
            joint: JointId::Chest,
            reason: "rest spine length is zero",
        });
    }
    if (y(JointId::Head) - y(JointId::Neck)).abs() <= DIR_EPS {
        return Err(EvalError::DegenerateRestPose {
            joint: JointId::Head,
            reason: "rest neck length is zero",
        });
    }
    for (shoulder, elbow, hand) in [
        (JointId::LeftShoulder, JointId::LeftElbow, JointId::LeftHand),
        (
            JointId::RightShoulder,
            JointId::RightElbow,
            JointId::RightHand,
        ),
    ] {
        let p = |id: JointId| rest[id].translation.vector;
        let length = (p(elbow) - p(shoulder)).norm() + (p(hand) - p(elbow)).norm();
        if length <= DIR_EPS {
            return Err(EvalError::DegenerateRestPose {
                joint: shoulder,
                reason: "rest arm length is zero",
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
