//! K-way merge over the per-type leaves of one sorted index.
//!
//! Each sub-iterator walks one exact type; the merge presents the union in
//! the index order (key, then ascending id). Forward moves select the
//! minimum of the valid sub-iterators, backward moves the maximum. When the
//! direction changes, every other sub-iterator is repositioned strictly past
//! the current element on the new side, so no element is visited twice.

use std::cmp::Ordering;
use std::sync::Arc;

use super::leaf::SortedIndexIterator;
use super::traits::{ComparableIterator, LowLevelIterator};
use crate::cas_error::CasIndexError;
use crate::fs::{FeatureStructure, FsRef};
use crate::index::FsComparator;

/// Ordered union of sorted leaf iterators sharing one comparator.
#[derive(Clone, Debug)]
pub struct MergeIterator {
    subs: Vec<SortedIndexIterator>,
    comparator: Arc<FsComparator>,
    current: Option<usize>,
    forward: bool,
}

impl MergeIterator {
    /// Merge `subs`, positioned at the overall first element.
    ///
    /// # Errors
    /// [`CasIndexError::NotComparable`] if the sub-iterators do not share
    /// one ordering, [`CasIndexError::UnsupportedOperation`] if `subs` is
    /// empty.
    pub fn new(subs: Vec<SortedIndexIterator>) -> Result<Self, CasIndexError> {
        let Some(first) = subs.first() else {
            return Err(CasIndexError::UnsupportedOperation(
                "merge over zero iterators",
            ));
        };
        let comparator = Arc::clone(first.comparator());
        if let Some(odd) = subs
            .iter()
            .find(|s| !s.comparator().same_ordering(&comparator))
        {
            return Err(CasIndexError::NotComparable(format!(
                "{:?} vs {:?}",
                comparator,
                odd.comparator()
            )));
        }
        let mut it = Self {
            subs,
            comparator,
            current: None,
            forward: true,
        };
        it.select_min();
        Ok(it)
    }

    /// Number of merged sub-iterators.
    pub fn width(&self) -> usize {
        self.subs.len()
    }

    fn select(&mut self, want: Ordering) {
        let mut best: Option<usize> = None;
        for (i, s) in self.subs.iter().enumerate() {
            if !s.is_valid() {
                continue;
            }
            best = match best {
                Some(b)
                    if self
                        .comparator
                        .compare_with_id(s.get_nvc(), self.subs[b].get_nvc())
                        != want =>
                {
                    Some(b)
                }
                _ => Some(i),
            };
        }
        self.current = best;
        self.forward = want == Ordering::Less;
    }

    #[inline]
    fn select_min(&mut self) {
        self.select(Ordering::Less);
    }

    #[inline]
    fn select_max(&mut self) {
        self.select(Ordering::Greater);
    }
}

impl LowLevelIterator for MergeIterator {
    #[inline]
    fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    fn get_nvc(&self) -> &FsRef {
        match self.current {
            Some(c) => self.subs[c].get_nvc(),
            None => panic!("get_nvc called on an invalid iterator"),
        }
    }

    fn move_to_first(&mut self) {
        for s in &mut self.subs {
            s.move_to_first();
        }
        self.select_min();
    }

    fn move_to_last(&mut self) {
        for s in &mut self.subs {
            s.move_to_last();
        }
        self.select_max();
    }

    fn move_to_first_no_reinit(&mut self) {
        for s in &mut self.subs {
            s.move_to_first_no_reinit();
        }
        self.select_min();
    }

    fn move_to_last_no_reinit(&mut self) {
        for s in &mut self.subs {
            s.move_to_last_no_reinit();
        }
        self.select_max();
    }

    fn move_to_next(&mut self) {
        let Some(c) = self.current else {
            return;
        };
        if !self.forward {
            let here = Arc::clone(self.subs[c].get_nvc());
            for (i, s) in self.subs.iter_mut().enumerate() {
                if i != c {
                    s.seek_after(&here);
                }
            }
        }
        self.subs[c].move_to_next();
        self.select_min();
    }

    fn move_to_previous(&mut self) {
        let Some(c) = self.current else {
            return;
        };
        if self.forward {
            let here = Arc::clone(self.subs[c].get_nvc());
            for (i, s) in self.subs.iter_mut().enumerate() {
                if i != c {
                    s.seek_before(&here);
                }
            }
        }
        self.subs[c].move_to_previous();
        self.select_max();
    }

    fn move_to(&mut self, target: &FeatureStructure) {
        for s in &mut self.subs {
            s.move_to(target);
        }
        self.select_min();
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn ll_index_size(&self) -> Result<usize, CasIndexError> {
        self.subs.iter().map(|s| s.ll_index_size()).sum()
    }

    fn is_up_to_date(&self) -> bool {
        self.subs.iter().all(|s| s.is_up_to_date())
    }
}

impl ComparableIterator for MergeIterator {
    #[inline]
    fn comparator(&self) -> &Arc<FsComparator> {
        &self.comparator
    }
}
