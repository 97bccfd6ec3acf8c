//! Analytic two-bone IK.
//!
//! Closed-form law-of-cosines solver for a root/mid/effector chain: bend the
//! interior angles to match the target distance, swing the chain onto the
//! root-to-target axis, then roll the bend plane onto the pole vector. All
//! rotations are composed in world space; bone lengths are never changed.

use nalgebra::{Isometry3, Unit, UnitQuaternion, Vector3};

use ikrig_core::transform::{normalize_or, perpendicular_component, DIR_EPS};

/// Minimum target distance, and margin kept short of full extension.
pub const REACH_EPS: f32 = 1.0e-3;

/// Solved world transforms for the first two joints of a chain.
///
/// The effector transform is not part of the solution: callers place it by
/// propagating their own rest offsets from `mid`.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoBoneSolution {
    pub root: Isometry3<f32>,
    pub mid: Isometry3<f32>,
}

/// Interior angle between two directions, clamped into acos range.
fn interior_angle(u: &Vector3<f32>, v: &Vector3<f32>) -> f32 {
    let u = normalize_or(*u, Vector3::z());
    let v = normalize_or(*v, Vector3::z());
    u.dot(&v).clamp(-1.0, 1.0).acos()
}

/// Some unit vector perpendicular to `axis`.
fn any_perpendicular(axis: &Vector3<f32>) -> Vector3<f32> {
    let probe = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    normalize_or(axis.cross(&probe), Vector3::x())
}

/// Solve the chain so the effector reaches `target` with the bend aimed at
/// `pole`.
///
/// Targets outside the chain's reach are clamped to just short of full
/// extension; targets inside the minimum reach are clamped outward. A chain
/// that is currently straight has no bend direction of its own, so the bend
/// opens toward the pole.
pub fn solve_two_bone(
    root: &Isometry3<f32>,
    mid: &Isometry3<f32>,
    effector: &Isometry3<f32>,
    target: &Vector3<f32>,
    pole: &Vector3<f32>,
) -> TwoBoneSolution {
    let a = root.translation.vector;
    let b = mid.translation.vector;
    let c = effector.translation.vector;
    let t = *target;

    let ac = normalize_or(c - a, Vector3::y());

    // Bend direction: the mid joint's displacement off the root-effector
    // axis, or toward the pole when the chain is straight
    let d = normalize_or(
        perpendicular_component(&(b - a), &ac),
        normalize_or(
            perpendicular_component(&(pole - a), &ac),
            any_perpendicular(&ac),
        ),
    );

    let lab = (b - a).norm();
    let lcb = (b - c).norm();
    let max_reach = (lab + lcb - REACH_EPS).max(REACH_EPS);
    let lat = (t - a).norm().clamp(REACH_EPS, max_reach);

    // Current interior angles at the root and mid
    let ac_ab_0 = interior_angle(&(c - a), &(b - a));
    let ba_bc_0 = interior_angle(&(a - b), &(c - b));
    let ac_at_0 = interior_angle(&(c - a), &(t - a));

    // Desired interior angles from the law of cosines
    let ac_ab_1 = ((lcb * lcb - lab * lab - lat * lat) / (-2.0 * lab * lat))
        .clamp(-1.0, 1.0)
        .acos();
    let ba_bc_1 = ((lat * lat - lab * lab - lcb * lcb) / (-2.0 * lab * lcb))
        .clamp(-1.0, 1.0)
        .acos();

    let axis0 = Unit::try_new((c - a).cross(&d), DIR_EPS);
    let axis1 = Unit::try_new((c - a).cross(&(t - a)), DIR_EPS);

    // r0/r1 open the bend, r2 swings the chain onto the target axis
    let (r0, r1) = match axis0 {
        Some(axis) => (
            UnitQuaternion::from_axis_angle(&axis, ac_ab_1 - ac_ab_0),
            UnitQuaternion::from_axis_angle(&axis, ba_bc_1 - ba_bc_0),
        ),
        None => (UnitQuaternion::identity(), UnitQuaternion::identity()),
    };
    let r2 = axis1.map_or_else(UnitQuaternion::identity, |axis| {
        UnitQuaternion::from_axis_angle(&axis, ac_at_0)
    });

    // r3 rolls the bend plane around the target axis onto the pole plane:
    // rotate the solved triangle's normal onto the normal of the
    // root/pole/target triangle
    let bent_normal = axis0.map_or_else(Vector3::zeros, Unit::into_inner);
    let n1 = r2 * (r0 * normalize_or((c - a).cross(&(b - a)), bent_normal));
    let n2 = (t - a).cross(&(pole - a));
    let r3 = if n1.norm() <= DIR_EPS || n2.norm() <= DIR_EPS {
        UnitQuaternion::identity()
    } else {
        UnitQuaternion::rotation_between(&n1, &n2).unwrap_or_else(|| {
            // Anti-parallel normals: half turn about the target axis
            let at = Unit::new_normalize(t - a);
            UnitQuaternion::from_axis_angle(&at, std::f32::consts::PI)
        })
    };

    let swing = r3 * r2 * r0;
    let ik_root = Isometry3::from_parts(root.translation, swing * root.rotation);
    // The mid follows the root's world rotation, then adds its own bend
    let mid_pos = ik_root * root.inverse() * mid;
    let ik_mid = Isometry3::from_parts(mid_pos.translation, swing * r1 * mid.rotation);

    TwoBoneSolution {
        root: ik_root,
        mid: ik_mid,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Translation3;

    fn chain(
        a: Vector3<f32>,
        b: Vector3<f32>,
        c: Vector3<f32>,
    ) -> (Isometry3<f32>, Isometry3<f32>, Isometry3<f32>) {
        (
            Isometry3::from_parts(Translation3::from(a), UnitQuaternion::identity()),
            Isometry3::from_parts(Translation3::from(b), UnitQuaternion::identity()),
            Isometry3::from_parts(Translation3::from(c), UnitQuaternion::identity()),
        )
    }

    /// Effector placement implied by the solution, via the mid's rest offset.
    fn fk_effector(
        sol: &TwoBoneSolution,
        mid: &Isometry3<f32>,
        effector: &Isometry3<f32>,
    ) -> Vector3<f32> {
        (sol.mid * mid.inverse() * effector).translation.vector
    }

    #[test]
    fn reachable_target_is_hit_exactly() {
        let a = Vector3::new(0.0, 1.0, 0.0);
        let b = Vector3::new(0.3, 0.5, 0.0);
        let c = Vector3::new(0.2, 0.0, 0.0);
        let (root, mid, effector) = chain(a, b, c);

        let target = Vector3::new(0.4, 0.3, 0.1);
        let pole = Vector3::new(1.0, 0.5, 0.0);
        let sol = solve_two_bone(&root, &mid, &effector, &target, &pole);

        assert_relative_eq!(fk_effector(&sol, &mid, &effector), target, epsilon = 1e-4);
    }

    #[test]
    fn bone_lengths_and_root_position_preserved() {
        let a = Vector3::new(0.0, 1.0, 0.0);
        let b = Vector3::new(0.3, 0.5, 0.0);
        let c = Vector3::new(0.2, 0.0, 0.0);
        let (root, mid, effector) = chain(a, b, c);

        let target = Vector3::new(-0.2, 0.4, 0.3);
        let pole = Vector3::new(0.0, 0.7, 1.0);
        let sol = solve_two_bone(&root, &mid, &effector, &target, &pole);

        assert_relative_eq!(sol.root.translation.vector, a, epsilon = 1e-6);
        let new_b = sol.mid.translation.vector;
        let new_c = fk_effector(&sol, &mid, &effector);
        assert_relative_eq!((new_b - a).norm(), (b - a).norm(), epsilon = 1e-4);
        assert_relative_eq!((new_c - new_b).norm(), (c - b).norm(), epsilon = 1e-4);
    }

    #[test]
    fn unreachable_target_clamps_to_max_extension() {
        let a = Vector3::new(0.0, 1.0, 0.0);
        let b = Vector3::new(0.3, 0.5, 0.0);
        let c = Vector3::new(0.2, 0.0, 0.0);
        let (root, mid, effector) = chain(a, b, c);

        let target = Vector3::new(5.0, 1.0, 0.0);
        let pole = Vector3::new(0.0, 0.5, 1.0);
        let sol = solve_two_bone(&root, &mid, &effector, &target, &pole);

        let reach = (b - a).norm() + (c - b).norm() - REACH_EPS;
        let new_c = fk_effector(&sol, &mid, &effector);
        assert_relative_eq!((new_c - a).norm(), reach, epsilon = 1e-3);
        // stretched along the target direction
        assert_relative_eq!(
            (new_c - a).normalize(),
            (target - a).normalize(),
            epsilon = 1e-3
        );
    }

    #[test]
    fn mid_bends_toward_pole() {
        let a = Vector3::new(0.0, 1.0, 0.0);
        let b = Vector3::new(0.1, 0.5, 0.0);
        let c = Vector3::new(0.0, 0.0, 0.0);
        let (root, mid, effector) = chain(a, b, c);

        let target = Vector3::new(0.0, 0.2, 0.0);
        let pole = Vector3::new(0.0, 0.5, 1.0);
        let sol = solve_two_bone(&root, &mid, &effector, &target, &pole);

        let axis = (target - a).normalize();
        let bend = perpendicular_component(&(sol.mid.translation.vector - a), &axis);
        let pole_dir = perpendicular_component(&(pole - a), &axis);
        assert!(bend.norm() > 0.01);
        assert!(bend.dot(&pole_dir) > 0.0);
    }

    #[test]
    fn flipping_pole_flips_bend_side() {
        let a = Vector3::new(0.0, 1.0, 0.0);
        let b = Vector3::new(0.1, 0.5, 0.0);
        let c = Vector3::new(0.0, 0.0, 0.0);
        let (root, mid, effector) = chain(a, b, c);

        let target = Vector3::new(0.0, 0.2, 0.0);
        let pole_front = Vector3::new(0.0, 0.5, 1.0);
        let pole_back = Vector3::new(0.0, 0.5, -1.0);
        let front = solve_two_bone(&root, &mid, &effector, &target, &pole_front);
        let back = solve_two_bone(&root, &mid, &effector, &target, &pole_back);

        let axis = (target - a).normalize();
        let bend_front =
            perpendicular_component(&(front.mid.translation.vector - a), &axis);
        let bend_back = perpendicular_component(&(back.mid.translation.vector - a), &axis);
        assert!(bend_front.dot(&bend_back) < 0.0);
    }

    #[test]
    fn straight_chain_opens_toward_pole() {
        // vertical chain, shortened target straight below, pole at +X
        let a = Vector3::zeros();
        let b = Vector3::new(0.0, -1.0, 0.0);
        let c = Vector3::new(0.0, -2.0, 0.0);
        let (root, mid, effector) = chain(a, b, c);

        let target = Vector3::new(0.0, -1.5, 0.0);
        let pole = Vector3::new(1.0, -1.0, 0.0);
        let sol = solve_two_bone(&root, &mid, &effector, &target, &pole);

        // interior angle at the root: cos = 1.5/2 = 0.75
        let angle = 0.75_f32.acos();
        let expected_mid = Vector3::new(angle.sin(), -angle.cos(), 0.0);
        assert_relative_eq!(sol.mid.translation.vector, expected_mid, epsilon = 1e-4);
        assert_relative_eq!(fk_effector(&sol, &mid, &effector), target, epsilon = 1e-4);
    }

    #[test]
    fn target_at_current_effector_is_near_noop() {
        let a = Vector3::new(0.0, 1.0, 0.0);
        let b = Vector3::new(0.3, 0.5, 0.0);
        let c = Vector3::new(0.2, 0.0, 0.0);
        let (root, mid, effector) = chain(a, b, c);

        // pole on the same side the chain already bends
        let pole = a + perpendicular_component(&(b - a), &(c - a).normalize()) * 5.0;
        let sol = solve_two_bone(&root, &mid, &effector, &c, &pole);

        assert_relative_eq!(sol.mid.translation.vector, b, epsilon = 1e-3);
        assert_relative_eq!(fk_effector(&sol, &mid, &effector), c, epsilon = 1e-3);
        assert_relative_eq!(sol.root.rotation.angle(), 0.0, epsilon = 1e-3);
    }
}
