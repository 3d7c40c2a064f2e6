//! Bag index store.
//!
//! A bag holds every added feature structure once, by identity; distinct
//! structures with equal keys are all kept. Iteration order is ascending id.
//!
//! Two representations, indistinguishable to callers:
//! - *small*: a hash map keyed by id, plus a lazily built id-sorted array
//!   used for snapshots (rebuilt after the next mutation);
//! - *promoted*: an id-ordered [`OrderedFsSet`], used once the bag holds more
//!   than `promotion_threshold` elements.
//!
//! [`BagStore::clear`] returns to the small form.

use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashMap;
use once_cell::sync::OnceCell;

use super::comparator::FsComparator;
use super::cow::{CopyOnWritePart, SnapshotSource};
use super::ordered_set::{OrderedFsSet, Uniqueness};
use crate::cas_error::CasIndexError;
use crate::debug_invariants::DebugInvariants;
use crate::fs::{FeatureStructure, FsId, FsRef};

#[derive(Clone, Debug)]
enum BagRepr {
    Small {
        members: HashMap<FsId, FsRef>,
        sorted: OnceCell<Arc<VecDeque<FsRef>>>,
    },
    Promoted(OrderedFsSet),
}

/// Identity-unique store with id-ordered iteration.
#[derive(Clone, Debug)]
pub struct BagStore {
    repr: BagRepr,
    identity: Arc<FsComparator>,
    promotion_threshold: usize,
    generation: u64,
}

impl BagStore {
    /// `identity` should be a keyless comparator
    /// ([`FsComparator::identity`]); it orders the promoted form.
    pub fn new(identity: Arc<FsComparator>, promotion_threshold: usize) -> Self {
        Self {
            repr: BagRepr::Small {
                members: HashMap::new(),
                sorted: OnceCell::new(),
            },
            identity,
            promotion_threshold,
            generation: 0,
        }
    }

    /// `true` once the bag switched to the ordered representation.
    pub fn is_promoted(&self) -> bool {
        matches!(self.repr, BagRepr::Promoted(_))
    }

    pub fn contains(&self, fs: &FeatureStructure) -> bool {
        match &self.repr {
            BagRepr::Small { members, .. } => members.contains_key(&fs.id()),
            BagRepr::Promoted(set) => set.contains(fs),
        }
    }

    /// Add `fs`; `Ok(false)` if it is already held.
    pub fn insert(&mut self, fs: FsRef) -> Result<bool, CasIndexError> {
        let added = match &mut self.repr {
            BagRepr::Small { members, .. } => {
                if members.contains_key(&fs.id()) {
                    false
                } else {
                    members
                        .try_reserve(1)
                        .map_err(|_| CasIndexError::CapacityExhausted(members.len()))?;
                    members.insert(fs.id(), fs);
                    true
                }
            }
            BagRepr::Promoted(set) => set.insert(fs)?,
        };
        if added {
            self.generation = self.generation.wrapping_add(1);
            self.invalidate_sorted();
            if !self.is_promoted() && self.len() > self.promotion_threshold {
                self.promote();
            }
            crate::debug_invariants!(self.validate_invariants(), "BagStore invalid");
        }
        Ok(added)
    }

    /// Remove `fs`; `false` if it was not held.
    pub fn remove(&mut self, fs: &FeatureStructure) -> bool {
        let removed = match &mut self.repr {
            BagRepr::Small { members, .. } => members.remove(&fs.id()).is_some(),
            BagRepr::Promoted(set) => set.remove(fs),
        };
        if removed {
            self.generation = self.generation.wrapping_add(1);
            self.invalidate_sorted();
        }
        removed
    }

    /// Drop every element and go back to the small representation.
    pub fn clear(&mut self) {
        self.repr = BagRepr::Small {
            members: HashMap::new(),
            sorted: OnceCell::new(),
        };
        self.generation = self.generation.wrapping_add(1);
    }

    fn promote(&mut self) {
        let sorted = self.sorted_members();
        self.invalidate_sorted();
        log::debug!(
            "promoting bag of {} elements to ordered representation",
            sorted.len()
        );
        let sorted = Arc::try_unwrap(sorted).unwrap_or_else(|shared| VecDeque::clone(&shared));
        self.repr = BagRepr::Promoted(OrderedFsSet::from_sorted(
            Arc::clone(&self.identity),
            Uniqueness::Sorted,
            sorted,
            self.generation,
        ));
    }

    /// Forget the cached id-sorted array; snapshots already taken keep it.
    fn invalidate_sorted(&mut self) {
        if let BagRepr::Small { sorted, .. } = &mut self.repr {
            sorted.take();
        }
    }

    /// Id-sorted contents, cached in the small form.
    fn sorted_members(&self) -> Arc<VecDeque<FsRef>> {
        match &self.repr {
            BagRepr::Small { members, sorted } => Arc::clone(sorted.get_or_init(|| {
                let mut v: Vec<FsRef> = members.values().cloned().collect();
                v.sort_unstable_by_key(|fs| fs.id());
                Arc::new(v.into())
            })),
            BagRepr::Promoted(set) => set.shared_slots(),
        }
    }
}

impl SnapshotSource for BagStore {
    fn snapshot(&self) -> CopyOnWritePart {
        CopyOnWritePart::new(self.sorted_members(), self.generation)
    }

    #[inline]
    fn generation(&self) -> u64 {
        self.generation
    }

    fn len(&self) -> usize {
        match &self.repr {
            BagRepr::Small { members, .. } => members.len(),
            BagRepr::Promoted(set) => set.len(),
        }
    }
}

impl DebugInvariants for BagStore {
    fn validate_invariants(&self) -> Result<(), CasIndexError> {
        match &self.repr {
            BagRepr::Small { members, .. } => {
                if let Some((id, fs)) = members.iter().find(|(id, fs)| **id != fs.id()) {
                    return Err(CasIndexError::InvariantViolation(format!(
                        "bag entry keyed {id} holds structure {}",
                        fs.id()
                    )));
                }
                Ok(())
            }
            BagRepr::Promoted(set) => set.validate_invariants(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FsBuilder;
    use crate::type_system::TypeSystemBuilder;

    fn store(threshold: usize) -> (BagStore, impl Fn(u64) -> FsRef) {
        let mut b = TypeSystemBuilder::new();
        let ann = b.with_annotation_type().unwrap();
        let ts = b.commit().unwrap();
        let identity = Arc::new(FsComparator::identity(&ts, ann));
        let make = move |id| {
            FsBuilder::new(&ts, FsId::new(id).unwrap(), ann)
                .unwrap()
                .build()
        };
        (BagStore::new(identity, threshold), make)
    }

    fn snapshot_ids(bag: &BagStore) -> Vec<u64> {
        bag.snapshot().iter().map(|fs| fs.id().get()).collect()
    }

    #[test]
    fn small_bag_iterates_by_id() {
        let (mut bag, fs) = store(16);
        for id in [5, 1, 3] {
            bag.insert(fs(id)).unwrap();
        }
        assert!(!bag.is_promoted());
        assert_eq!(snapshot_ids(&bag), vec![1, 3, 5]);
    }

    #[test]
    fn same_structure_is_held_once() {
        let (mut bag, fs) = store(16);
        let a = fs(2);
        assert!(bag.insert(a.clone()).unwrap());
        assert!(!bag.insert(a.clone()).unwrap());
        assert_eq!(bag.len(), 1);
        assert!(bag.remove(&a));
        assert!(bag.is_empty());
    }

    #[test]
    fn promotion_is_invisible() {
        let (mut bag, fs) = store(4);
        let all: Vec<FsRef> = [9, 2, 7, 4, 1, 8, 3].into_iter().map(&fs).collect();
        for (n, f) in all.iter().enumerate() {
            bag.insert(f.clone()).unwrap();
            assert_eq!(bag.is_promoted(), n + 1 > 4);
        }
        assert_eq!(snapshot_ids(&bag), vec![1, 2, 3, 4, 7, 8, 9]);
        assert!(bag.remove(&all[0]));
        assert_eq!(snapshot_ids(&bag), vec![1, 2, 3, 4, 7, 8]);
        assert!(bag.contains(&all[1]));
        bag.clear();
        assert!(!bag.is_promoted());
        assert!(bag.is_empty());
    }

    #[test]
    fn snapshot_is_frozen_in_both_forms() {
        for threshold in [0, 64] {
            let (mut bag, fs) = store(threshold);
            let a = fs(1);
            bag.insert(a.clone()).unwrap();
            bag.insert(fs(2)).unwrap();
            let part = bag.snapshot();
            assert!(bag.is_original(&part));
            bag.remove(&a);
            assert!(!bag.is_original(&part));
            assert_eq!(part.len(), 2);
            assert_eq!(bag.snapshot().len(), 1);
        }
    }
}
