//! Sorted, de-duplicated array of feature-structure references.
//!
//! [`OrderedFsSet`] is the backing store of sorted and set indexes (and of
//! promoted bags). Elements live in a `VecDeque` whose occupied extent is the
//! used range: inserting or removing at either end is O(1), anywhere else
//! shifts the shorter side. Lookups are binary searches with the index
//! comparator.
//!
//! # Uniqueness
//! - [`Uniqueness::Sorted`]: ordered by key then id; two distinct
//!   structures never compare equal, so the only rejected insert is the
//!   identical structure.
//! - [`Uniqueness::KeyUnique`]: ordered by key only; a key-equal insert is
//!   resolved by the [`DuplicatePolicy`].
//!
//! # Copy-on-write
//! The backing array sits behind an `Arc`. [`snapshot`](OrderedFsSet::snapshot)
//! shares it; the first mutation while a snapshot is alive copies the array
//! first. With no snapshot alive the array is mutated in place.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use itertools::Itertools;

use super::comparator::FsComparator;
use super::cow::{CopyOnWritePart, SnapshotSource};
use crate::cas_error::CasIndexError;
use crate::debug_invariants::DebugInvariants;
use crate::fs::{FeatureStructure, FsRef};

/// What a key-unique set does with a key-equal insert.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DuplicatePolicy {
    /// Keep the stored element; the insert is a no-op.
    #[default]
    Reject,
    /// Overwrite the stored element with the new one.
    Replace,
}

/// Ordering/uniqueness regime of an [`OrderedFsSet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Uniqueness {
    Sorted,
    KeyUnique(DuplicatePolicy),
}

/// Shrink only above this capacity.
const MIN_SHRINK_CAPACITY: usize = 64;

/// Sorted array index core.
#[derive(Clone, Debug)]
pub struct OrderedFsSet {
    slots: Arc<VecDeque<FsRef>>,
    comparator: Arc<FsComparator>,
    uniqueness: Uniqueness,
    /// Monotonic; changes on any structural modification.
    generation: u64,
    /// Number of times a mutation had to copy a shared array.
    cow_copies: u64,
}

impl OrderedFsSet {
    pub fn new(comparator: Arc<FsComparator>, uniqueness: Uniqueness) -> Self {
        Self::with_capacity(comparator, uniqueness, 0)
    }

    pub fn with_capacity(
        comparator: Arc<FsComparator>,
        uniqueness: Uniqueness,
        capacity: usize,
    ) -> Self {
        Self {
            slots: Arc::new(VecDeque::with_capacity(capacity)),
            comparator,
            uniqueness,
            generation: 0,
            cow_copies: 0,
        }
    }

    /// Build from elements already sorted and de-duplicated under this
    /// set's order. Checked by the invariant pass in debug builds.
    pub(crate) fn from_sorted(
        comparator: Arc<FsComparator>,
        uniqueness: Uniqueness,
        sorted: VecDeque<FsRef>,
        generation: u64,
    ) -> Self {
        let set = Self {
            slots: Arc::new(sorted),
            comparator,
            uniqueness,
            generation,
            cow_copies: 0,
        };
        crate::debug_invariants!(set.validate_invariants(), "OrderedFsSet invalid");
        set
    }

    #[inline]
    pub fn comparator(&self) -> &Arc<FsComparator> {
        &self.comparator
    }

    #[inline]
    pub fn uniqueness(&self) -> Uniqueness {
        self.uniqueness
    }

    /// How many mutations had to copy an array shared with a snapshot.
    #[inline]
    pub fn cow_copies(&self) -> u64 {
        self.cow_copies
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&FsRef> {
        self.slots.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FsRef> {
        self.slots.iter()
    }

    #[inline]
    fn order(&self, a: &FeatureStructure, b: &FeatureStructure) -> Ordering {
        match self.uniqueness {
            Uniqueness::Sorted => self.comparator.compare_with_id(a, b),
            Uniqueness::KeyUnique(_) => self.comparator.compare(a, b),
        }
    }

    #[inline]
    fn search(&self, fs: &FeatureStructure) -> Result<usize, usize> {
        self.slots.binary_search_by(|probe| self.order(probe, fs))
    }

    /// Position of this exact structure (same id), if stored.
    pub fn find(&self, fs: &FeatureStructure) -> Option<usize> {
        match self.search(fs) {
            Ok(i) if self.slots[i].id() == fs.id() => Some(i),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, fs: &FeatureStructure) -> bool {
        self.find(fs).is_some()
    }

    /// First position whose key is not less than `fs`'s key.
    pub fn lower_bound(&self, fs: &FeatureStructure) -> usize {
        self.slots
            .partition_point(|probe| self.comparator.compare(probe, fs) == Ordering::Less)
    }

    /// Position of the leftmost key-equal element, if any.
    pub fn find_key(&self, fs: &FeatureStructure) -> Option<usize> {
        let i = self.lower_bound(fs);
        self.slots
            .get(i)
            .filter(|probe| self.comparator.compare(probe, fs) == Ordering::Equal)
            .map(|_| i)
    }

    /// Mutable access to the backing array, copying it first if a snapshot
    /// still shares it.
    fn live_mut(&mut self) -> &mut VecDeque<FsRef> {
        if Arc::strong_count(&self.slots) > 1 {
            self.cow_copies += 1;
            log::trace!(
                "copy-on-write: copying {} elements shared with a snapshot",
                self.slots.len()
            );
        }
        Arc::make_mut(&mut self.slots)
    }

    #[inline]
    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Insert `fs` at its sorted position.
    ///
    /// Returns `Ok(false)` if the set is unchanged: the identical structure
    /// is already present, or (key-unique, [`DuplicatePolicy::Reject`]) a
    /// key-equal one is.
    ///
    /// # Errors
    /// [`CasIndexError::CapacityExhausted`] if the array cannot grow.
    pub fn insert(&mut self, fs: FsRef) -> Result<bool, CasIndexError> {
        match self.search(&fs) {
            Ok(i) => match self.uniqueness {
                Uniqueness::Sorted | Uniqueness::KeyUnique(DuplicatePolicy::Reject) => Ok(false),
                Uniqueness::KeyUnique(DuplicatePolicy::Replace) => {
                    if self.slots[i].id() == fs.id() {
                        return Ok(false);
                    }
                    log::warn!(
                        "replacing key-equal element {} with {}",
                        self.slots[i].id(),
                        fs.id()
                    );
                    self.live_mut()[i] = fs;
                    self.bump();
                    Ok(true)
                }
            },
            Err(i) => {
                let len = self.slots.len();
                let slots = self.live_mut();
                slots
                    .try_reserve(1)
                    .map_err(|_| CasIndexError::CapacityExhausted(len))?;
                slots.insert(i, fs);
                self.bump();
                crate::debug_invariants!(self.validate_invariants(), "OrderedFsSet invalid");
                Ok(true)
            }
        }
    }

    /// Remove this exact structure. Returns `false` if it was not stored.
    pub fn remove(&mut self, fs: &FeatureStructure) -> bool {
        let Some(i) = self.find(fs) else {
            return false;
        };
        let slots = self.live_mut();
        slots.remove(i);
        let cap = slots.capacity();
        if cap > MIN_SHRINK_CAPACITY && slots.len() < cap / 4 {
            slots.shrink_to(cap / 2);
        }
        self.bump();
        crate::debug_invariants!(self.validate_invariants(), "OrderedFsSet invalid");
        true
    }

    /// Remove everything. Outstanding snapshots keep their data.
    pub fn clear(&mut self) {
        if Arc::strong_count(&self.slots) > 1 {
            self.slots = Arc::new(VecDeque::new());
        } else {
            Arc::make_mut(&mut self.slots).clear();
        }
        self.bump();
        self.debug_assert_invariants();
    }

    /// Shared handle on the live array, for stores that wrap this set.
    pub(crate) fn shared_slots(&self) -> Arc<VecDeque<FsRef>> {
        Arc::clone(&self.slots)
    }
}

impl SnapshotSource for OrderedFsSet {
    fn snapshot(&self) -> CopyOnWritePart {
        CopyOnWritePart::new(Arc::clone(&self.slots), self.generation)
    }

    #[inline]
    fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    fn len(&self) -> usize {
        self.slots.len()
    }
}

impl DebugInvariants for OrderedFsSet {
    fn validate_invariants(&self) -> Result<(), CasIndexError> {
        if let Some((i, (a, b))) = self
            .slots
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| self.order(a, b) != Ordering::Less)
        {
            return Err(CasIndexError::InvariantViolation(format!(
                "elements {} and {} at positions {} and {} are not strictly ascending",
                a.id(),
                b.id(),
                i,
                i + 1
            )));
        }
        Ok(())
    }
}
