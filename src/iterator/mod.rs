//! Iterators over feature-structure indexes.
//!
//! The capability traits live in [`traits`]; the concrete cursors are
//! - [`SortedIndexIterator`] / [`BagIndexIterator`]: one leaf store,
//! - [`MergeIterator`]: ordered union of sorted leaves (type + subtypes),
//! - [`UnorderedIterator`]: concatenation of set/bag leaves,
//! - [`FilteredIterator`]: predicate decorator over any of the above.
//!
//! [`FsIterator`] is the tagged union handed out by indexes and
//! repositories.

pub mod filtered;
pub mod leaf;
pub mod merge;
pub mod traits;
pub mod unordered;

use std::cmp::Ordering;
use std::sync::Arc;

use crate::cas_error::CasIndexError;
use crate::fs::{FeatureStructure, FsRef};
use crate::index::FsComparator;

pub use filtered::{FilteredIterator, FsPredicate};
pub use leaf::{BagIndexIterator, SortedIndexIterator};
pub use merge::MergeIterator;
pub use traits::{ComparableIterator, Forward, LowLevelIterator};
pub use unordered::UnorderedIterator;

/// Any index iterator.
#[derive(Debug)]
pub enum FsIterator {
    Sorted(SortedIndexIterator),
    Bag(BagIndexIterator),
    Merge(MergeIterator),
    Unordered(UnorderedIterator),
    Filtered(Box<FilteredIterator<FsIterator>>),
}

macro_rules! dispatch {
    ($self:expr, $it:ident => $body:expr) => {
        match $self {
            FsIterator::Sorted($it) => $body,
            FsIterator::Bag($it) => $body,
            FsIterator::Merge($it) => $body,
            FsIterator::Unordered($it) => $body,
            FsIterator::Filtered($it) => $body,
        }
    };
}

impl FsIterator {
    /// Wrap in a [`FilteredIterator`].
    pub fn filtered(self, predicate: FsPredicate) -> FsIterator {
        FsIterator::Filtered(Box::new(FilteredIterator::new(self, predicate)))
    }

    /// Ordering of this iterator, if it walks sorted data.
    pub fn comparator(&self) -> Option<&Arc<FsComparator>> {
        match self {
            FsIterator::Sorted(it) => Some(it.comparator()),
            FsIterator::Merge(it) => Some(it.comparator()),
            FsIterator::Filtered(it) => it.base().comparator(),
            FsIterator::Bag(_) | FsIterator::Unordered(_) => None,
        }
    }

    /// Compare current elements; see [`ComparableIterator::compare_to`].
    ///
    /// # Errors
    /// [`CasIndexError::NotComparable`] if either side walks bag or
    /// unordered data, or the orderings differ.
    pub fn compare_to(&self, other: &FsIterator) -> Result<Ordering, CasIndexError> {
        let (Some(a), Some(b)) = (self.comparator(), other.comparator()) else {
            return Err(CasIndexError::NotComparable(
                "bag and unordered iterators have no ordering".to_string(),
            ));
        };
        if !a.same_ordering(b) {
            return Err(CasIndexError::NotComparable(format!("{a:?} vs {b:?}")));
        }
        if !self.is_valid() || !other.is_valid() {
            return Err(CasIndexError::InvalidIterator);
        }
        Ok(a.compare_with_id(self.get_nvc(), other.get_nvc()))
    }

    /// Elements from the first to the last, re-binding to the latest state.
    /// Leaves this iterator invalid.
    pub fn to_vec(&mut self) -> Vec<FsRef> {
        self.move_to_first();
        let mut out = Vec::new();
        while self.is_valid() {
            out.push(Arc::clone(self.get_nvc()));
            self.move_to_next();
        }
        out
    }
}

impl LowLevelIterator for FsIterator {
    fn is_valid(&self) -> bool {
        dispatch!(self, it => it.is_valid())
    }

    fn get_nvc(&self) -> &FsRef {
        dispatch!(self, it => it.get_nvc())
    }

    fn move_to_first(&mut self) {
        dispatch!(self, it => it.move_to_first())
    }

    fn move_to_last(&mut self) {
        dispatch!(self, it => it.move_to_last())
    }

    fn move_to_first_no_reinit(&mut self) {
        dispatch!(self, it => it.move_to_first_no_reinit())
    }

    fn move_to_last_no_reinit(&mut self) {
        dispatch!(self, it => it.move_to_last_no_reinit())
    }

    fn move_to_next(&mut self) {
        dispatch!(self, it => it.move_to_next())
    }

    fn move_to_previous(&mut self) {
        dispatch!(self, it => it.move_to_previous())
    }

    fn move_to(&mut self, target: &FeatureStructure) {
        dispatch!(self, it => it.move_to(target))
    }

    fn copy(&self) -> Self {
        match self {
            FsIterator::Sorted(it) => FsIterator::Sorted(it.copy()),
            FsIterator::Bag(it) => FsIterator::Bag(it.copy()),
            FsIterator::Merge(it) => FsIterator::Merge(it.copy()),
            FsIterator::Unordered(it) => FsIterator::Unordered(it.copy()),
            FsIterator::Filtered(it) => FsIterator::Filtered(Box::new(it.copy())),
        }
    }

    fn ll_index_size(&self) -> Result<usize, CasIndexError> {
        dispatch!(self, it => it.ll_index_size())
    }

    fn is_up_to_date(&self) -> bool {
        dispatch!(self, it => it.is_up_to_date())
    }
}

#[cfg(test)]
mod tests;
