//! Full-body motion retargeting between two humanoid skeletons.
//!
//! Given the current and rest world transforms of every joint on a source
//! skeleton and the rest transforms of a target skeleton with different
//! proportions, produce target-skeleton world transforms that reproduce the
//! motion's intent: foot placement, hand reach, facing direction.
//!
//! # Architecture
//!
//! ```text
//! pose deltas ──► root motion ──► hips ──► legs / chest ──► arms ──► head
//!                                   │         (two-bone IK per limb)
//!                                   └── parent transform for every chain
//! ```
//!
//! [`Retargeter`] is the per-character evaluation unit. It is stateless
//! between frames except for a two-entry history of forward directions used
//! to smooth the root-motion facing; call [`Retargeter::evaluate`] once per
//! frame. Multiple characters use independent [`Retargeter`] values and may
//! be evaluated in parallel by the caller.

pub mod chains;
pub mod delta;
pub mod evaluator;
pub mod root_motion;
pub mod two_bone;

pub use delta::{compute_deltas, pose_delta, PoseDelta};
pub use evaluator::{JointPose, Retargeter, RigInput, RigOutput};
pub use root_motion::{extract_root_motion, ForwardHistory, RootMotion};
pub use two_bone::{solve_two_bone, TwoBoneSolution};
