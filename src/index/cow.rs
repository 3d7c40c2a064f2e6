//! Copy-on-write snapshots of index backing stores.
//!
//! A [`CopyOnWritePart`] shares the backing store of an
//! [`OrderedFsSet`](super::ordered_set::OrderedFsSet) or
//! [`BagStore`](super::bag::BagStore) through an `Arc`. Taking one is O(1).
//! As long as a part is alive the store's `Arc` is shared, and the next
//! structural mutation of the store allocates a fresh backing array instead
//! of writing through; the part's data therefore never changes.
//!
//! Staleness is detected by value: every structural mutation bumps the
//! store's generation, and a part is *original* while its captured
//! generation equals the store's current one.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::fs::FsRef;

/// Frozen view of a backing store plus the generation it was captured at.
#[derive(Clone, Debug)]
pub struct CopyOnWritePart {
    slots: Arc<VecDeque<FsRef>>,
    generation: u64,
}

impl CopyOnWritePart {
    pub(crate) fn new(slots: Arc<VecDeque<FsRef>>, generation: u64) -> Self {
        Self { slots, generation }
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

    /// Generation of the store when this part was taken.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn iter(&self) -> impl Iterator<Item = &FsRef> {
        self.slots.iter()
    }

    /// First position `i` such that `pred` is false for all `i..`; the
    /// elements must be partitioned by `pred`.
    #[inline]
    pub fn partition_point<F>(&self, pred: F) -> usize
    where
        F: FnMut(&FsRef) -> bool,
    {
        self.slots.partition_point(pred)
    }

    /// `true` if both parts share one backing array.
    pub fn shares_storage_with(&self, other: &CopyOnWritePart) -> bool {
        Arc::ptr_eq(&self.slots, &other.slots)
    }
}

/// A store that can hand out copy-on-write snapshots of itself.
pub trait SnapshotSource {
    /// O(1) snapshot of the current contents.
    fn snapshot(&self) -> CopyOnWritePart;
    /// Current generation; bumped by every structural mutation.
    fn generation(&self) -> u64;
    /// Number of elements currently stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` while nothing has changed since `part` was taken.
    fn is_original(&self, part: &CopyOnWritePart) -> bool {
        part.generation() == self.generation()
    }
}
