//! Iterators over a single leaf store (one exact type of one index).
//!
//! A leaf iterator holds an integer position into a [`CopyOnWritePart`]
//! plus a handle on the live store used to re-bind. The part is never
//! written, so the index may be mutated freely while the iterator walks it.

use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;

use super::traits::{ComparableIterator, LowLevelIterator};
use crate::cas_error::CasIndexError;
use crate::fs::{FeatureStructure, FsRef};
use crate::index::{BagStore, CopyOnWritePart, FsComparator, OrderedFsSet, SnapshotSource};

/// Position over one bound view.
#[derive(Clone, Debug)]
struct Cursor {
    view: CopyOnWritePart,
    pos: Option<usize>,
}

impl Cursor {
    fn at_first(view: CopyOnWritePart) -> Self {
        let mut c = Self { view, pos: None };
        c.first();
        c
    }

    #[inline]
    fn first(&mut self) {
        self.pos = if self.view.is_empty() { None } else { Some(0) };
    }

    #[inline]
    fn last(&mut self) {
        self.pos = self.view.len().checked_sub(1);
    }

    #[inline]
    fn next(&mut self) {
        if let Some(p) = self.pos {
            self.seek(p + 1);
        }
    }

    #[inline]
    fn previous(&mut self) {
        self.pos = self.pos.and_then(|p| p.checked_sub(1));
    }

    #[inline]
    fn seek(&mut self, i: usize) {
        self.pos = (i < self.view.len()).then_some(i);
    }

    #[inline]
    fn current(&self) -> Option<&FsRef> {
        self.pos.and_then(|p| self.view.get(p))
    }

    fn get_nvc(&self) -> &FsRef {
        match self.current() {
            Some(fs) => fs,
            None => panic!("get_nvc called on an invalid iterator"),
        }
    }
}

/// Iterator over one sorted or set leaf.
#[derive(Clone, Debug)]
pub struct SortedIndexIterator {
    source: Arc<RwLock<OrderedFsSet>>,
    comparator: Arc<FsComparator>,
    cursor: Cursor,
}

impl SortedIndexIterator {
    /// Bind to the current state of `source`, positioned at the first element.
    pub fn new(source: Arc<RwLock<OrderedFsSet>>) -> Self {
        let (view, comparator) = {
            let set = source.read();
            (set.snapshot(), Arc::clone(set.comparator()))
        };
        Self {
            source,
            comparator,
            cursor: Cursor::at_first(view),
        }
    }

    fn rebind(&mut self) {
        self.cursor.view = self.source.read().snapshot();
    }

    /// Position at the first bound element strictly after `fs` in key+id
    /// order, without re-binding.
    pub(crate) fn seek_after(&mut self, fs: &FeatureStructure) {
        let cmp = &self.comparator;
        let i = self
            .cursor
            .view
            .partition_point(|e| cmp.compare_with_id(e, fs) != Ordering::Greater);
        self.cursor.seek(i);
    }

    /// Position at the last bound element strictly before `fs` in key+id
    /// order, without re-binding.
    pub(crate) fn seek_before(&mut self, fs: &FeatureStructure) {
        let cmp = &self.comparator;
        let i = self
            .cursor
            .view
            .partition_point(|e| cmp.compare_with_id(e, fs) == Ordering::Less);
        self.cursor.pos = i.checked_sub(1);
    }
}

impl LowLevelIterator for SortedIndexIterator {
    #[inline]
    fn is_valid(&self) -> bool {
        self.cursor.current().is_some()
    }

    #[inline]
    fn get_nvc(&self) -> &FsRef {
        self.cursor.get_nvc()
    }

    fn move_to_first(&mut self) {
        self.rebind();
        self.cursor.first();
    }

    fn move_to_last(&mut self) {
        self.rebind();
        self.cursor.last();
    }

    fn move_to_first_no_reinit(&mut self) {
        self.cursor.first();
    }

    fn move_to_last_no_reinit(&mut self) {
        self.cursor.last();
    }

    fn move_to_next(&mut self) {
        self.cursor.next();
    }

    fn move_to_previous(&mut self) {
        self.cursor.previous();
    }

    fn move_to(&mut self, target: &FeatureStructure) {
        self.rebind();
        let cmp = &self.comparator;
        let i = self
            .cursor
            .view
            .partition_point(|e| cmp.compare(e, target) == Ordering::Less);
        self.cursor.seek(i);
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn ll_index_size(&self) -> Result<usize, CasIndexError> {
        Ok(self.source.read().len())
    }

    fn is_up_to_date(&self) -> bool {
        self.source.read().is_original(&self.cursor.view)
    }
}

impl ComparableIterator for SortedIndexIterator {
    #[inline]
    fn comparator(&self) -> &Arc<FsComparator> {
        &self.comparator
    }
}

/// Iterator over one bag leaf; ascending id order.
#[derive(Clone, Debug)]
pub struct BagIndexIterator {
    source: Arc<RwLock<BagStore>>,
    cursor: Cursor,
}

impl BagIndexIterator {
    pub fn new(source: Arc<RwLock<BagStore>>) -> Self {
        let view = source.read().snapshot();
        Self {
            source,
            cursor: Cursor::at_first(view),
        }
    }

    fn rebind(&mut self) {
        self.cursor.view = self.source.read().snapshot();
    }
}

impl LowLevelIterator for BagIndexIterator {
    #[inline]
    fn is_valid(&self) -> bool {
        self.cursor.current().is_some()
    }

    #[inline]
    fn get_nvc(&self) -> &FsRef {
        self.cursor.get_nvc()
    }

    fn move_to_first(&mut self) {
        self.rebind();
        self.cursor.first();
    }

    fn move_to_last(&mut self) {
        self.rebind();
        self.cursor.last();
    }

    fn move_to_first_no_reinit(&mut self) {
        self.cursor.first();
    }

    fn move_to_last_no_reinit(&mut self) {
        self.cursor.last();
    }

    fn move_to_next(&mut self) {
        self.cursor.next();
    }

    fn move_to_previous(&mut self) {
        self.cursor.previous();
    }

    fn move_to(&mut self, target: &FeatureStructure) {
        self.rebind();
        let id = target.id();
        let i = self.cursor.view.partition_point(|e| e.id() < id);
        self.cursor.seek(i);
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn ll_index_size(&self) -> Result<usize, CasIndexError> {
        Ok(self.source.read().len())
    }

    fn is_up_to_date(&self) -> bool {
        self.source.read().is_original(&self.cursor.view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FsBuilder, FsId};
    use crate::index::{KeyOrder, Uniqueness};
    use crate::type_system::{TypeCode, TypeSystem, TypeSystemBuilder};

    fn setup() -> (Arc<TypeSystem>, TypeCode, Arc<RwLock<OrderedFsSet>>) {
        let mut b = TypeSystemBuilder::new();
        let ann = b.with_annotation_type().unwrap();
        let ts = b.commit().unwrap();
        let cmp = FsComparator::builder(&ts, ann)
            .key("begin", KeyOrder::Standard)
            .build()
            .unwrap();
        let set = OrderedFsSet::new(Arc::new(cmp), Uniqueness::Sorted);
        (ts, ann, Arc::new(RwLock::new(set)))
    }

    fn fs(ts: &Arc<TypeSystem>, ty: TypeCode, id: u64, begin: i64) -> FsRef {
        FsBuilder::new(ts, FsId::new(id).unwrap(), ty)
            .unwrap()
            .with_int("begin", begin)
            .unwrap()
            .build()
    }

    #[test]
    fn empty_iterator_is_invalid() {
        let (_, _, set) = setup();
        let mut it = SortedIndexIterator::new(set);
        assert!(!it.is_valid());
        assert_eq!(it.get(), Err(CasIndexError::InvalidIterator));
        it.move_to_next();
        it.move_to_last();
        assert!(!it.is_valid());
    }

    #[test]
    fn stepping_past_either_end_invalidates() {
        let (ts, ann, set) = setup();
        for id in 1..=3 {
            set.write().insert(fs(&ts, ann, id, id as i64)).unwrap();
        }
        let mut it = SortedIndexIterator::new(set);
        it.move_to_previous();
        assert!(!it.is_valid());
        // stepping an invalid iterator does nothing
        it.move_to_next();
        assert!(!it.is_valid());
        it.move_to_last();
        assert_eq!(it.get().unwrap().id().get(), 3);
        it.move_to_next();
        assert!(!it.is_valid());
    }

    #[test]
    fn move_to_lands_on_leftmost_equal_or_greater() {
        let (ts, ann, set) = setup();
        for (id, begin) in [(1, 0), (2, 4), (3, 4), (4, 8)] {
            set.write().insert(fs(&ts, ann, id, begin)).unwrap();
        }
        let mut it = SortedIndexIterator::new(set);
        it.move_to(&fs(&ts, ann, 99, 4));
        assert_eq!(it.get().unwrap().id().get(), 2);
        it.move_to(&fs(&ts, ann, 99, 5));
        assert_eq!(it.get().unwrap().id().get(), 4);
        it.move_to(&fs(&ts, ann, 99, 9));
        assert!(!it.is_valid());
    }

    #[test]
    fn copy_has_its_own_position() {
        let (ts, ann, set) = setup();
        for id in 1..=3 {
            set.write().insert(fs(&ts, ann, id, id as i64)).unwrap();
        }
        let mut a = SortedIndexIterator::new(set);
        let b = a.copy();
        a.move_to_next();
        assert_eq!(a.get().unwrap().id().get(), 2);
        assert_eq!(b.get().unwrap().id().get(), 1);
    }

    #[test]
    fn no_reinit_keeps_old_view_and_reinit_rebinds() {
        let (ts, ann, set) = setup();
        for id in 1..=3 {
            set.write().insert(fs(&ts, ann, id, id as i64)).unwrap();
        }
        let mut it = SortedIndexIterator::new(Arc::clone(&set));
        assert!(it.is_up_to_date());
        set.write().insert(fs(&ts, ann, 10, 0)).unwrap();
        assert!(!it.is_up_to_date());

        it.move_to_first_no_reinit();
        assert_eq!(it.get().unwrap().id().get(), 1);
        it.move_to_first();
        assert_eq!(it.get().unwrap().id().get(), 10);
        assert!(it.is_up_to_date());
        assert_eq!(it.ll_index_size().unwrap(), 4);
    }

    #[test]
    fn compare_to_uses_key_then_id() {
        let (ts, ann, set) = setup();
        set.write().insert(fs(&ts, ann, 1, 5)).unwrap();
        set.write().insert(fs(&ts, ann, 2, 5)).unwrap();
        let a = SortedIndexIterator::new(Arc::clone(&set));
        let mut b = a.copy();
        b.move_to_next();
        assert_eq!(a.compare_to(&b), Ok(Ordering::Less));
        assert_eq!(b.compare_to(&a), Ok(Ordering::Greater));
        b.move_to_next();
        assert_eq!(a.compare_to(&b), Err(CasIndexError::InvalidIterator));
    }

    #[test]
    fn bag_iterator_moves_by_id() {
        let (ts, ann, _) = setup();
        let bag = BagStore::new(Arc::new(FsComparator::identity(&ts, ann)), 2);
        let bag = Arc::new(RwLock::new(bag));
        for id in [7, 3, 5, 1] {
            bag.write().insert(fs(&ts, ann, id, 0)).unwrap();
        }
        let mut it = BagIndexIterator::new(Arc::clone(&bag));
        let ids: Vec<u64> = it.copy().forward().map(|f| f.id().get()).collect();
        assert_eq!(ids, vec![1, 3, 5, 7]);
        it.move_to(&fs(&ts, ann, 4, 0));
        assert_eq!(it.get().unwrap().id().get(), 5);
        it.move_to_last();
        it.move_to_previous();
        assert_eq!(it.get().unwrap().id().get(), 5);
    }
}
