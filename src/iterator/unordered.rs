//! Type-and-subtypes iteration for set and bag indexes.
//!
//! Set and bag indexes have no order that spans types, so their
//! per-type iterators are walked one after another, in type pre-order.

use std::cmp::Ordering;
use std::sync::Arc;

use super::FsIterator;
use super::traits::LowLevelIterator;
use crate::cas_error::CasIndexError;
use crate::fs::{FeatureStructure, FsRef};
use crate::index::{FsComparator, IndexKind};

/// Concatenation of per-type iterators.
#[derive(Debug)]
pub struct UnorderedIterator {
    subs: Vec<FsIterator>,
    comparator: Arc<FsComparator>,
    kind: IndexKind,
    current: Option<usize>,
}

impl UnorderedIterator {
    /// Walk `subs` in order, positioned at the first element of the first
    /// non-empty one. `comparator` and `kind` define what `move_to` treats
    /// as an equal element.
    pub fn new(subs: Vec<FsIterator>, comparator: Arc<FsComparator>, kind: IndexKind) -> Self {
        let mut it = Self {
            subs,
            comparator,
            kind,
            current: None,
        };
        it.current = it.first_valid_from(0);
        it
    }

    /// Index of the first valid sub-iterator at or after `from`, each
    /// candidate rewound to its first element.
    fn first_valid_from(&mut self, from: usize) -> Option<usize> {
        (from..self.subs.len()).find(|&i| {
            self.subs[i].move_to_first_no_reinit();
            self.subs[i].is_valid()
        })
    }

    /// Index of the last valid sub-iterator before `until`, each candidate
    /// moved to its last element.
    fn last_valid_before(&mut self, until: usize) -> Option<usize> {
        (0..until).rev().find(|&i| {
            self.subs[i].move_to_last_no_reinit();
            self.subs[i].is_valid()
        })
    }

    fn matches(&self, fs: &FeatureStructure, target: &FeatureStructure) -> bool {
        match self.kind {
            IndexKind::Bag => fs.id() == target.id(),
            IndexKind::Set | IndexKind::Sorted => {
                self.comparator.compare(fs, target) == Ordering::Equal
            }
        }
    }
}

impl LowLevelIterator for UnorderedIterator {
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
        self.current = self.first_valid_from(0);
    }

    fn move_to_last(&mut self) {
        for s in &mut self.subs {
            s.move_to_last();
        }
        self.current = self.last_valid_before(self.subs.len());
    }

    fn move_to_first_no_reinit(&mut self) {
        self.current = self.first_valid_from(0);
    }

    fn move_to_last_no_reinit(&mut self) {
        self.current = self.last_valid_before(self.subs.len());
    }

    fn move_to_next(&mut self) {
        let Some(c) = self.current else {
            return;
        };
        self.subs[c].move_to_next();
        if !self.subs[c].is_valid() {
            self.current = self.first_valid_from(c + 1);
        }
    }

    fn move_to_previous(&mut self) {
        let Some(c) = self.current else {
            return;
        };
        self.subs[c].move_to_previous();
        if !self.subs[c].is_valid() {
            self.current = self.last_valid_before(c);
        }
    }

    /// Positions at the first sub-iterator holding an element equal to
    /// `target` (same id for bags, same key for sets); invalid otherwise.
    fn move_to(&mut self, target: &FeatureStructure) {
        self.current = None;
        for i in 0..self.subs.len() {
            self.subs[i].move_to(target);
            if self.subs[i].is_valid() && self.matches(self.subs[i].get_nvc(), target) {
                self.current = Some(i);
                return;
            }
        }
    }

    fn copy(&self) -> Self {
        Self {
            subs: self.subs.iter().map(|s| s.copy()).collect(),
            comparator: Arc::clone(&self.comparator),
            kind: self.kind,
            current: self.current,
        }
    }

    fn ll_index_size(&self) -> Result<usize, CasIndexError> {
        self.subs.iter().map(|s| s.ll_index_size()).sum()
    }

    fn is_up_to_date(&self) -> bool {
        self.subs.iter().all(|s| s.is_up_to_date())
    }
}
