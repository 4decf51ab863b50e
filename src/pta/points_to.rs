// SPDX-License-Identifier: BSD-3-Clause
use rustc_hash::FxHashSet;

use crate::heap::ObjId;

/// A set of abstract objects. The solver only ever adds to these.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointsToSet(FxHashSet<ObjId>);

impl PointsToSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(o: ObjId) -> Self {
        let mut s = Self::new();
        s.insert(o);
        s
    }

    #[inline]
    pub fn insert(&mut self, o: ObjId) -> bool {
        self.0.insert(o)
    }

    #[inline]
    pub fn contains(&self, o: ObjId) -> bool {
        self.0.contains(&o)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjId> + '_ {
        self.0.iter().copied()
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Add all of `other`, in place
    pub fn extend(&mut self, other: &Self) {
        self.0.extend(other.0.iter().copied());
    }

    /// Add all of `delta`, returning the objects that were not yet present
    pub fn add_all_diff(&mut self, delta: &Self) -> Self {
        let mut diff = Self::new();
        for o in delta.iter() {
            if self.insert(o) {
                diff.insert(o);
            }
        }
        diff
    }
}

impl FromIterator<ObjId> for PointsToSet {
    fn from_iter<I: IntoIterator<Item = ObjId>>(iter: I) -> Self {
        PointsToSet(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_is_only_new_objects() {
        let mut pts: PointsToSet = [ObjId(0), ObjId(1)].into_iter().collect();
        let delta: PointsToSet = [ObjId(1), ObjId(2)].into_iter().collect();
        let diff = pts.add_all_diff(&delta);
        assert_eq!(PointsToSet::singleton(ObjId(2)), diff);
        assert_eq!(3, pts.len());
        assert!(pts.add_all_diff(&delta).is_empty());
    }
}
