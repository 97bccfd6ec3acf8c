//! Rigid-transform helpers shared by the retargeting chains.
//!
//! World transforms are rigid (`Isometry3`): rotation + translation, always
//! built from explicit parts rather than by poking matrix elements.

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, Unit, UnitQuaternion, Vector3};

/// Tolerance below which a direction is considered degenerate.
pub const DIR_EPS: f32 = 1.0e-6;

/// Apply a world-space rotation/translation delta to a transform.
///
/// Replaces components the way the original rig's post-transform offset does:
/// the rotation becomes `r * m.rotation` (delta applied in world space) and
/// the translation becomes `m.translation + t`. When `r` is identity and `t`
/// is zero the input is returned unchanged.
pub fn offset_transform(
    m: &Isometry3<f32>,
    r: &UnitQuaternion<f32>,
    t: &Vector3<f32>,
) -> Isometry3<f32> {
    Isometry3::from_parts(
        Translation3::from(m.translation.vector + t),
        r * m.rotation,
    )
}

/// Decompose a world rotation into Euler XYZ angles (radians).
///
/// XYZ order: X applied first, then Y, then Z, i.e. `R = Rz * Ry * Rx`.
pub fn euler_xyz(r: &UnitQuaternion<f32>) -> Vector3<f32> {
    let (x, y, z) = r.euler_angles();
    Vector3::new(x, y, z)
}

/// Component of `v` perpendicular to the unit direction `axis`.
pub fn perpendicular_component(v: &Vector3<f32>, axis: &Vector3<f32>) -> Vector3<f32> {
    v - axis * v.dot(axis)
}

/// Ground-plane orientation whose local +Z is `forward` and +Y is world up.
///
/// `forward` must be unit length and horizontal; the right axis is
/// `up x forward`, giving a right-handed orthonormal basis.
pub fn ground_basis(forward: &Vector3<f32>) -> UnitQuaternion<f32> {
    let x = Vector3::y().cross(forward);
    let m = Matrix3::from_columns(&[x, Vector3::y(), *forward]);
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(m))
}

/// Normalize `v`, falling back to `fallback` when `v` is degenerate.
pub fn normalize_or(v: Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    Unit::try_new(v, DIR_EPS).map_or(fallback, Unit::into_inner)
}

/// Whether every component of the transform is finite.
pub fn is_finite(m: &Isometry3<f32>) -> bool {
    m.translation.vector.iter().all(|c| c.is_finite())
        && m.rotation.coords.iter().all(|c| c.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
