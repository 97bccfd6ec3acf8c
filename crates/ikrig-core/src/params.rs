use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::error::ParamsError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_scale() -> f32 {
    1.0
}
const fn default_orientation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

// ---------------------------------------------------------------------------
// RigParams
// ---------------------------------------------------------------------------

/// Per-frame scalar knobs for the retargeter.
///
/// Twist offsets are in degrees; all scales are non-negative. The left-hand
/// offset is an auxiliary transform applied only to the left hand target
/// (e.g. for holding a prop), stored as plain arrays for TOML friendliness
/// (quaternion as `[x, y, z, w]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigParams {
    /// Left leg pole-vector twist offset in degrees (default: 0).
    #[serde(default)]
    pub left_leg_twist: f32,

    /// Right leg pole-vector twist offset in degrees (default: 0).
    #[serde(default)]
    pub right_leg_twist: f32,

    /// Horizontal foot-motion scale relative to the resting stance (default: 1).
    #[serde(default = "default_scale")]
    pub stride_scale: f32,

    /// Scale applied to the ground-plane root translation (default: 1).
    #[serde(default = "default_scale")]
    pub root_motion_scale: f32,

    /// Overall character scale. Accepted and validated but not read by the
    /// current computation; reserved pending product clarification.
    #[serde(default = "default_scale")]
    pub character_scale: f32,

    /// Translation part of the left-hand auxiliary offset.
    #[serde(default)]
    pub left_hand_offset_translation: [f32; 3],

    /// Rotation part of the left-hand auxiliary offset, quaternion `[x, y, z, w]`.
    #[serde(default = "default_orientation")]
    pub left_hand_offset_rotation: [f32; 4],
}

impl Default for RigParams {
    fn default() -> Self {
        Self {
            left_leg_twist: 0.0,
            right_leg_twist: 0.0,
            stride_scale: default_scale(),
            root_motion_scale: default_scale(),
            character_scale: default_scale(),
            left_hand_offset_translation: [0.0; 3],
            left_hand_offset_rotation: default_orientation(),
        }
    }
}

impl RigParams {
    /// Validate parameter values. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ParamsError> {
        fn scale_ok(v: f32) -> bool {
            v.is_finite() && v >= 0.0
        }

        if !self.left_leg_twist.is_finite() {
            return Err(ParamsError::InvalidValue {
                field: "left_leg_twist",
                message: "must be finite",
            });
        }
        if !self.right_leg_twist.is_finite() {
            return Err(ParamsError::InvalidValue {
                field: "right_leg_twist",
                message: "must be finite",
            });
        }
        if !scale_ok(self.stride_scale) {
            return Err(ParamsError::InvalidValue {
                field: "stride_scale",
                message: "must be non-negative and finite",
            });
        }
        if !scale_ok(self.root_motion_scale) {
            return Err(ParamsError::InvalidValue {
                field: "root_motion_scale",
                message: "must be non-negative and finite",
            });
        }
        if !scale_ok(self.character_scale) {
            return Err(ParamsError::InvalidValue {
                field: "character_scale",
                message: "must be non-negative and finite",
            });
        }
        if !self
            .left_hand_offset_translation
            .iter()
            .all(|c| c.is_finite())
        {
            return Err(ParamsError::InvalidValue {
                field: "left_hand_offset_translation",
                message: "must be finite",
            });
        }
        let q = &self.left_hand_offset_rotation;
        if !q.iter().all(|c| c.is_finite()) || q.iter().map(|c| c * c).sum::<f32>() < 1.0e-6 {
            return Err(ParamsError::InvalidValue {
                field: "left_hand_offset_rotation",
                message: "must be a finite, non-zero quaternion",
            });
        }
        Ok(())
    }

    /// The left-hand auxiliary offset as a rigid transform.
    ///
    /// The stored quaternion is normalized here, so configs may carry an
    /// unnormalized rotation.
    pub fn left_hand_offset(&self) -> Isometry3<f32> {
        let [x, y, z] = self.left_hand_offset_translation;
        let [qx, qy, qz, qw] = self.left_hand_offset_rotation;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz)),
        )
    }

    /// Load and validate parameters from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ParamsError> {
        let content = std::fs::read_to_string(path)?;
        let params: Self = toml::from_str(&content)?;
        params.validate()?;
        Ok(params)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
