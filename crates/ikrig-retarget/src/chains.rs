//! Per-region chain retargeters.
//!
//! Each solver consumes the resolved transform of its parent chain and
//! produces world transforms for its own joints on the target skeleton, in
//! unscaled root-motion space. The frame orchestrator applies the root-motion
//! rescale correction afterwards.
//!
//! Chains propagate the target skeleton's rest offsets from the parent
//! (`parent_new * parent_rest⁻¹ * child_rest`), then correct the ends:
//! feet and hands reach IK targets derived from the input skeleton, while
//! foot, hand, and neck orientations follow the input's live rotation offset
//! into the target's rest frame.

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};

use ikrig_core::joints::{JointId, JointMap};
use ikrig_core::transform::{normalize_or, offset_transform, perpendicular_component, DIR_EPS};

use crate::delta::PoseDelta;
use crate::root_motion::RootMotion;
use crate::two_bone::solve_two_bone;

const DEG_TO_RAD: f32 = 0.017_453_3;

/// Shared per-frame inputs for the chain solvers.
pub struct ChainContext<'a> {
    pub current: &'a JointMap<Isometry3<f32>>,
    pub rest: &'a JointMap<Isometry3<f32>>,
    pub target_rest: &'a JointMap<Isometry3<f32>>,
    pub deltas: &'a JointMap<PoseDelta>,
    pub root: &'a RootMotion,
    /// Target-to-input rest hip height ratio.
    pub hip_scale: f32,
}

/// Solved leg transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct LegPose {
    pub upper: Isometry3<f32>,
    pub lower: Isometry3<f32>,
    pub foot: Isometry3<f32>,
}

/// Solved arm transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmPose {
    pub clavicle: Isometry3<f32>,
    pub upper: Isometry3<f32>,
    pub lower: Isometry3<f32>,
    pub hand: Isometry3<f32>,
}

/// Solved neck and head transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadPose {
    pub neck: Isometry3<f32>,
    pub head: Isometry3<f32>,
}

/// Place a child by the target skeleton's rest offset from its parent.
fn propagate(
    parent_new: &Isometry3<f32>,
    parent_rest: &Isometry3<f32>,
    child_rest: &Isometry3<f32>,
) -> Isometry3<f32> {
    parent_new * parent_rest.inverse() * child_rest
}

/// World rotation for joints that track the input directly: the input's live
/// rotation, offset by the rest-pose difference between the two skeletons.
fn independent_rotation(ctx: &ChainContext, id: JointId) -> UnitQuaternion<f32> {
    ctx.current[id].rotation * ctx.rest[id].rotation.inverse() * ctx.target_rest[id].rotation
}

/// Pole-vector position for a limb.
///
/// The bend direction is the input rest mid joint's displacement off the
/// rest root-to-end axis, carried into the current pose by the upper joint's
/// rotation delta, then twisted about the root-to-target axis by the
/// configured offset.
fn limb_pole(
    ctx: &ChainContext,
    upper: JointId,
    lower: JointId,
    end: JointId,
    chain_root: Vector3<f32>,
    target: Vector3<f32>,
    twist_deg: f32,
) -> Vector3<f32> {
    let ia = ctx.rest[upper].translation.vector;
    let ib = ctx.rest[lower].translation.vector;
    let ic = ctx.rest[end].translation.vector;
    let iac = normalize_or(ic - ia, Vector3::y());

    let mut pv = normalize_or(
        perpendicular_component(&(ib - ia), &iac),
        Vector3::zeros(),
    );
    pv = ctx.deltas[upper].rotation * pv;
    if let Some(axis) = Unit::try_new(target - chain_root, DIR_EPS) {
        pv = UnitQuaternion::from_axis_angle(&axis, twist_deg * DEG_TO_RAD) * pv;
    }
    chain_root + pv
}

// ---------------------------------------------------------------------------
// Hips
// ---------------------------------------------------------------------------

/// Retarget the hips: rescale the root-relative hip displacement by the hip
/// height ratio, then replay the input's hip rotation delta on the target's
/// rest hips.
pub fn solve_hips(ctx: &ChainContext) -> Isometry3<f32> {
    let rest_hips = ctx.rest[JointId::Hips].translation.vector;

    let local = ctx.root.ground.inverse() * ctx.current[JointId::Hips];
    let scaled = rest_hips + (local.translation.vector - rest_hips) * ctx.hip_scale;
    let world = ctx.root.ground * Isometry3::from_parts(Translation3::from(scaled), local.rotation);

    let hip_delta = world.translation.vector - rest_hips;
    offset_transform(
        &ctx.target_rest[JointId::Hips],
        &ctx.deltas[JointId::Hips].rotation,
        &hip_delta,
    )
}

// ---------------------------------------------------------------------------
// Scale-relative placement
// ---------------------------------------------------------------------------

/// Place `child` under `target_parent` with its translation delta relative to
/// the input `parent` scaled by `scale`.
///
/// The delta is measured against the child's rest offset carried under the
/// parent's current transform, so parent motion does not leak into it.
pub fn scale_relative_to(
    ctx: &ChainContext,
    child: JointId,
    parent: JointId,
    scale: f32,
    target_parent: &Isometry3<f32>,
) -> Isometry3<f32> {
    let rest_child = ctx.current[parent] * ctx.rest[parent].inverse() * ctx.rest[child];

    let rotation_delta = ctx.current[child].rotation * rest_child.rotation.inverse();
    let translation_delta =
        (ctx.current[child].translation.vector - rest_child.translation.vector) * scale;

    let rest_target = propagate(target_parent, &ctx.target_rest[parent], &ctx.target_rest[child]);
    offset_transform(&rest_target, &rotation_delta, &translation_delta)
}

// ---------------------------------------------------------------------------
// Legs
// ---------------------------------------------------------------------------

/// Retarget one leg under the solved hips.
pub fn solve_leg(
    ctx: &ChainContext,
    upper: JointId,
    lower: JointId,
    foot: JointId,
    hips: &Isometry3<f32>,
    twist_deg: f32,
    stride_scale: f32,
) -> LegPose {
    let tr = ctx.target_rest;
    let up_leg = propagate(hips, &tr[JointId::Hips], &tr[upper]);
    let lo_leg = propagate(&up_leg, &tr[upper], &tr[lower]);
    let foot_fk = propagate(&lo_leg, &tr[lower], &tr[foot]);

    // Foot target: start from the input's foot motion, raised by the ankle
    // height difference so ground contact carries over
    let ankle_delta = tr[foot].translation.vector.y - ctx.rest[foot].translation.vector.y;
    let mut target = ctx.rest[foot];
    target.translation.vector.y += ankle_delta;
    let mut foot_delta = ctx.deltas[foot].translation;
    foot_delta.y *= ctx.hip_scale;
    let target = offset_transform(&target, &ctx.deltas[foot].rotation, &foot_delta);

    // Stride scaling happens in the flat-foot frame: the target rest foot's
    // ground position, in root-motion space
    let flat_foot = Isometry3::translation(
        tr[foot].translation.vector.x,
        0.0,
        tr[foot].translation.vector.z,
    );
    let mut local = flat_foot.inverse() * ctx.root.ground.inverse() * target;
    local.translation.vector.x *= stride_scale;
    local.translation.vector.z *= stride_scale;
    let target = ctx.root.ground * flat_foot * local;

    let target_pos = target.translation.vector;
    let pole = limb_pole(
        ctx,
        upper,
        lower,
        foot,
        up_leg.translation.vector,
        target_pos,
        twist_deg,
    );
    let sol = solve_two_bone(&up_leg, &lo_leg, &foot_fk, &target_pos, &pole);

    let foot_pos = propagate(&sol.mid, &tr[lower], &tr[foot]);
    let foot_out = Isometry3::from_parts(foot_pos.translation, independent_rotation(ctx, foot));

    LegPose {
        upper: sol.root,
        lower: sol.mid,
        foot: foot_out,
    }
}

// ---------------------------------------------------------------------------
// Chest
// ---------------------------------------------------------------------------

/// Retarget the chest under the solved hips, with the spine translation delta
/// scaled by the spine length ratio.
pub fn solve_chest(ctx: &ChainContext, hips: &Isometry3<f32>) -> Isometry3<f32> {
    let spine_scale = (ctx.target_rest[JointId::Chest].translation.vector.y
        - ctx.target_rest[JointId::Hips].translation.vector.y)
        / (ctx.rest[JointId::Chest].translation.vector.y
            - ctx.rest[JointId::Hips].translation.vector.y);
    scale_relative_to(ctx, JointId::Chest, JointId::Hips, spine_scale, hips)
}

// ---------------------------------------------------------------------------
// Arms
// ---------------------------------------------------------------------------

/// Retarget one arm under the solved chest.
///
/// `hand_offset` is an auxiliary hand-local transform: its translation moves
/// the IK target and its rotation is composed into the emitted hand rotation.
pub fn solve_arm(
    ctx: &ChainContext,
    clavicle: JointId,
    shoulder: JointId,
    elbow: JointId,
    hand: JointId,
    chest: &Isometry3<f32>,
    twist_deg: f32,
    hand_offset: &Isometry3<f32>,
) -> ArmPose {
    let tr = ctx.target_rest;

    let clav_fk = propagate(chest, &tr[JointId::Chest], &tr[clavicle]);
    let clav = Isometry3::from_parts(clav_fk.translation, independent_rotation(ctx, clavicle));

    let up_arm = propagate(&clav, &tr[clavicle], &tr[shoulder]);
    let lo_arm = propagate(&up_arm, &tr[shoulder], &tr[elbow]);
    let hand_fk = propagate(&lo_arm, &tr[elbow], &tr[hand]);

    // Hand target: the input's hand motion relative to the clavicle, with the
    // translation delta scaled by the arm length ratio
    let target_arm_length = (tr[elbow].translation.vector - tr[shoulder].translation.vector)
        .norm()
        + (tr[hand].translation.vector - tr[elbow].translation.vector).norm();
    let input_arm_length = (ctx.rest[elbow].translation.vector
        - ctx.rest[shoulder].translation.vector)
        .norm()
        + (ctx.rest[hand].translation.vector - ctx.rest[elbow].translation.vector).norm();
    let arm_scale = target_arm_length / input_arm_length;
    let hand_target = scale_relative_to(ctx, hand, clavicle, arm_scale, &clav) * hand_offset;

    let target_pos = hand_target.translation.vector;
    let pole = limb_pole(
        ctx,
        shoulder,
        elbow,
        hand,
        up_arm.translation.vector,
        target_pos,
        twist_deg,
    );
    let sol = solve_two_bone(&up_arm, &lo_arm, &hand_fk, &target_pos, &pole);

    let hand_pos = propagate(&sol.mid, &tr[elbow], &tr[hand]);
    let hand_out = Isometry3::from_parts(
        hand_pos.translation,
        independent_rotation(ctx, hand) * hand_offset.rotation,
    );

    ArmPose {
        clavicle: clav,
        upper: sol.root,
        lower: sol.mid,
        hand: hand_out,
    }
}

// ---------------------------------------------------------------------------
// Neck and head
// ---------------------------------------------------------------------------

/// Retarget the neck and head under the solved chest. The head's translation
/// delta relative to the neck is scaled by the neck length ratio.
pub fn solve_head(ctx: &ChainContext, chest: &Isometry3<f32>) -> HeadPose {
    let tr = ctx.target_rest;

    let neck_fk = propagate(chest, &tr[JointId::Chest], &tr[JointId::Neck]);
    let neck = Isometry3::from_parts(
        neck_fk.translation,
        independent_rotation(ctx, JointId::Neck),
    );

    let neck_scale = (tr[JointId::Head].translation.vector.y
        - tr[JointId::Neck].translation.vector.y)
        / (ctx.rest[JointId::Head].translation.vector.y
            - ctx.rest[JointId::Neck].translation.vector.y);
    let head = scale_relative_to(ctx, JointId::Head, JointId::Neck, neck_scale, &neck);

    HeadPose { neck, head }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
