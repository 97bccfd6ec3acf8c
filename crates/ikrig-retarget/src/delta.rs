//! Per-joint deviation of the source skeleton from its own rest pose.
//!
//! Every downstream stage consumes these deltas: root-motion extraction,
//! hips rescaling, pole-vector placement, and the scale-relative offsets.

use nalgebra::{Isometry3, UnitQuaternion, Vector3};

use ikrig_core::joints::JointMap;

/// World-space deviation of one joint from its rest transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseDelta {
    /// World rotation delta; `current = rotation * rest`.
    pub rotation: UnitQuaternion<f32>,
    /// World translation delta; `current = rest + translation`.
    pub translation: Vector3<f32>,
}

impl Default for PoseDelta {
    fn default() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }
}

/// Delta between a rest transform and a current transform.
///
/// Identity/zero whenever `current == rest`.
pub fn pose_delta(rest: &Isometry3<f32>, current: &Isometry3<f32>) -> PoseDelta {
    PoseDelta {
        rotation: current.rotation * rest.rotation.inverse(),
        translation: current.translation.vector - rest.translation.vector,
    }
}

/// Deltas for every joint role.
pub fn compute_deltas(
    rest: &JointMap<Isometry3<f32>>,
    current: &JointMap<Isometry3<f32>>,
) -> JointMap<PoseDelta> {
    JointMap::from_fn(|id| pose_delta(&rest[id], &current[id]))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ikrig_core::joints::JointId;
    use nalgebra::Translation3;

    #[test]
    fn delta_at_rest_is_identity() {
        let rest = Isometry3::from_parts(
            Translation3::new(0.0, 1.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.4),
        );
        let d = pose_delta(&rest, &rest);
        assert_relative_eq!(d.rotation.angle(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(d.translation, Vector3::zeros(), epsilon = 1e-6);
    }

    #[test]
    fn delta_recovers_current_from_rest() {
        let rest = Isometry3::from_parts(
            Translation3::new(0.5, 1.0, -0.2),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3),
        );
        let current = Isometry3::from_parts(
            Translation3::new(1.0, 0.8, 0.4),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -0.9),
        );
        let d = pose_delta(&rest, &current);
        // current = delta applied to rest, in world space
        assert_relative_eq!(
            d.rotation.angle_to(&(current.rotation * rest.rotation.inverse())),
            0.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            rest.translation.vector + d.translation,
            current.translation.vector,
            epsilon = 1e-6
        );
        let recovered = d.rotation * rest.rotation;
        assert_relative_eq!(recovered.angle_to(&current.rotation), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn compute_deltas_per_joint() {
        let rest = JointMap::from_fn(|id| {
            Isometry3::translation(id.index() as f32, 0.0, 0.0)
        });
        let mut current = rest.clone();
        current[JointId::Head] = Isometry3::translation(3.0, 2.0, 0.0);

        let deltas = compute_deltas(&rest, &current);
        assert_relative_eq!(
            deltas[JointId::Head].translation,
            Vector3::new(0.0, 2.0, 0.0),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            deltas[JointId::Hips].translation,
            Vector3::zeros(),
            epsilon = 1e-6
        );
    }
}
