use thiserror::Error;

use crate::joints::JointId;

/// Top-level error type for the ikrig workspace.
#[derive(Debug, Error)]
pub enum RigError {
    #[error("Parameter error: {0}")]
    Params(#[from] ParamsError),

    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Runtime-parameter errors (construction and TOML loading).
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: &'static str,
    },
}

/// Joint-topology errors raised while assembling per-joint inputs.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("Joint count mismatch: expected {expected}, got {got}")]
    JointCountMismatch { expected: usize, got: usize },
}

/// Per-frame evaluation errors.
///
/// These are precondition violations: the frame is aborted without producing
/// partial output. Numerical edge cases inside the solver are clamped locally
/// and never reported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Non-finite {which} transform for joint {joint:?}")]
    NonFiniteTransform { joint: JointId, which: &'static str },

    #[error("Degenerate rest pose at {joint:?}: {reason}")]
    DegenerateRestPose { joint: JointId, reason: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rig_error_from_topology_error() {
        let err = TopologyError::JointCountMismatch {
            expected: 18,
            got: 3,
        };
        let rig_err: RigError = err.into();
        assert!(matches!(rig_err, RigError::Topology(_)));
        assert!(rig_err.to_string().contains("expected 18"));
    }

    #[test]
    fn rig_error_from_eval_error() {
        let err = EvalError::DegenerateRestPose {
            joint: JointId::Hips,
            reason: "rest hip height is zero",
        };
        let rig_err: RigError = err.into();
        assert!(matches!(rig_err, RigError::Eval(_)));
        assert!(rig_err.to_string().contains("Hips"));
    }

    #[test]
    fn params_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let params_err: ParamsError = io_err.into();
        assert!(matches!(params_err, ParamsError::Io(_)));
    }

    #[test]
    fn eval_error_is_copy() {
        let err = EvalError::NonFiniteTransform {
            joint: JointId::LeftHand,
            which: "input",
        };
        let err2 = err; // Copy
        assert_eq!(err, err2);
    }

    #[test]
    fn eval_error_display_messages() {
        assert_eq!(
            EvalError::NonFiniteTransform {
                joint: JointId::LeftFoot,
                which: "input rest",
            }
            .to_string(),
            "Non-finite input rest transform for joint LeftFoot"
        );
        assert_eq!(
            EvalError::DegenerateRestPose {
                joint: JointId::Chest,
                reason: "rest spine length is zero",
            }
            .to_string(),
            "Degenerate rest pose at Chest: rest spine length is zero"
        );
    }

    #[test]
    fn params_error_display_messages() {
        assert_eq!(
            ParamsError::InvalidValue {
                field: "stride_scale",
                message: "must be non-negative and finite",
            }
            .to_string(),
            "Invalid value for stride_scale: must be non-negative and finite"
        );
    }
}
