//! Joint topology shared by the input and target skeletons.
//!
//! Both skeletons expose the same fixed set of joint roles; only proportions
//! and rest orientations differ. [`JointId`] is the strongly-typed index and
//! [`JointMap`] is a fixed-size container keyed by it, so per-joint arrays
//! can never be the wrong length once constructed.

use crate::error::TopologyError;

// ---------------------------------------------------------------------------
// JointId
// ---------------------------------------------------------------------------

/// Joint role on the humanoid rig.
///
/// Discriminants are stable and double as indices into host-supplied arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum JointId {
    Hips,
    Chest,
    Neck,
    Head,
    LeftUpLeg,
    LeftLoLeg,
    LeftFoot,
    LeftClavicle,
    LeftShoulder,
    LeftElbow,
    LeftHand,
    RightUpLeg,
    RightLoLeg,
    RightFoot,
    RightClavicle,
    RightShoulder,
    RightElbow,
    RightHand,
}

impl JointId {
    /// Number of joint roles.
    pub const COUNT: usize = 18;

    /// All roles in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Hips,
        Self::Chest,
        Self::Neck,
        Self::Head,
        Self::LeftUpLeg,
        Self::LeftLoLeg,
        Self::LeftFoot,
        Self::LeftClavicle,
        Self::LeftShoulder,
        Self::LeftElbow,
        Self::LeftHand,
        Self::RightUpLeg,
        Self::RightLoLeg,
        Self::RightFoot,
        Self::RightClavicle,
        Self::RightShoulder,
        Self::RightElbow,
        Self::RightHand,
    ];

    /// Stable array index of this role.
    pub const fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// JointMap
// ---------------------------------------------------------------------------

/// Fixed-size container with one `T` per joint role.
#[derive(Debug, Clone, PartialEq)]
pub struct JointMap<T> {
    slots: [T; JointId::COUNT],
}

impl<T> JointMap<T> {
    /// Build a map by evaluating `f` for every role in index order.
    pub fn from_fn(mut f: impl FnMut(JointId) -> T) -> Self {
        Self {
            slots: JointId::ALL.map(&mut f),
        }
    }

    /// Build a map from a host-supplied vector indexed by [`JointId`].
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::JointCountMismatch`] unless
    /// `values.len() == JointId::COUNT`.
    pub fn from_vec(values: Vec<T>) -> Result<Self, TopologyError> {
        let got = values.len();
        let slots: [T; JointId::COUNT] =
            values
                .try_into()
                .map_err(|_| TopologyError::JointCountMismatch {
                    expected: JointId::COUNT,
                    got,
                })?;
        Ok(Self { slots })
    }

    /// Iterate over `(role, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (JointId, &T)> {
        JointId::ALL.iter().map(move |&id| (id, &self.slots[id.index()]))
    }
}

impl<T: Default> Default for JointMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> std::ops::Index<JointId> for JointMap<T> {
    type Output = T;
    fn index(&self, id: JointId) -> &T {
        &self.slots[id.index()]
    }
}

impl<T> std::ops::IndexMut<JointId> for JointMap<T> {
    fn index_mut(&mut self, id: JointId) -> &mut T {
        &mut self.slots[id.index()]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_indices_are_stable_and_dense() {
        for (i, id) in JointId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert_eq!(JointId::ALL.len(), JointId::COUNT);
    }

    #[test]
    fn joint_map_from_fn_indexed_by_role() {
        let map = JointMap::from_fn(|id| id.index() * 10);
        assert_eq!(map[JointId::Hips], 0);
        assert_eq!(map[JointId::Chest], 10);
        assert_eq!(map[JointId::RightHand], (JointId::COUNT - 1) * 10);
    }

    #[test]
    fn joint_map_from_vec_ok() {
        let map = JointMap::from_vec((0..JointId::COUNT).collect()).unwrap();
        assert_eq!(map[JointId::LeftFoot], JointId::LeftFoot.index());
    }

    #[test]
    fn joint_map_from_vec_wrong_length() {
        let err = JointMap::from_vec(vec![0_u32; 5]).unwrap_err();
        assert_eq!(
            err,
            TopologyError::JointCountMismatch {
                expected: JointId::COUNT,
                got: 5
            }
        );
    }

    #[test]
    fn joint_map_index_mut() {
        let mut map = JointMap::<f32>::default();
        map[JointId::Neck] = 2.5;
        assert!((map[JointId::Neck] - 2.5).abs() < f32::EPSILON);
        assert!(map[JointId::Head].abs() < f32::EPSILON);
    }

    #[test]
    fn joint_map_iter_covers_all_roles() {
        let map = JointMap::from_fn(|id| id);
        let collected: Vec<JointId> = map.iter().map(|(id, &v)| {
            assert_eq!(id, v);
            id
        }).collect();
        assert_eq!(collected, JointId::ALL.to_vec());
    }
}
