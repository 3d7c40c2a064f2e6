//! Capability traits shared by every index iterator.
//!
//! An iterator is a cursor: it is either *valid* (positioned at an element)
//! or *invalid* (before the first, after the last, or over nothing).
//! Stepping past either end makes it invalid; stepping an invalid iterator
//! does nothing. Only the `move_to_first`/`move_to_last`/`move_to` family
//! re-bind to the index's latest state; everything else walks the data the
//! iterator is already bound to.

use std::cmp::Ordering;
use std::iter::FusedIterator;
use std::sync::Arc;

use crate::cas_error::CasIndexError;
use crate::fs::{FeatureStructure, FsRef};
use crate::index::FsComparator;

/// Position-based navigation over one index (or a combination of indexes).
pub trait LowLevelIterator {
    fn is_valid(&self) -> bool;

    /// Current element without a validity check.
    ///
    /// # Panics
    /// If the iterator is invalid. Callers use this only where validity is
    /// already known.
    fn get_nvc(&self) -> &FsRef;

    /// Current element.
    ///
    /// # Errors
    /// [`CasIndexError::InvalidIterator`] if the iterator is invalid.
    fn get(&self) -> Result<FsRef, CasIndexError> {
        if self.is_valid() {
            Ok(Arc::clone(self.get_nvc()))
        } else {
            Err(CasIndexError::InvalidIterator)
        }
    }

    /// Re-bind to the latest index state and go to the first element.
    fn move_to_first(&mut self);
    /// Re-bind to the latest index state and go to the last element.
    fn move_to_last(&mut self);
    /// Go to the first element of the data already bound.
    fn move_to_first_no_reinit(&mut self);
    /// Go to the last element of the data already bound.
    fn move_to_last_no_reinit(&mut self);
    fn move_to_next(&mut self);
    fn move_to_previous(&mut self);

    /// Re-bind and go to the leftmost element not less than `target`
    /// (by key for sorted and set indexes, by id for bags). Invalid if there
    /// is none.
    fn move_to(&mut self, target: &FeatureStructure);

    /// An independent cursor over the same bound data, at the same position.
    fn copy(&self) -> Self
    where
        Self: Sized;

    /// Number of structures in the underlying index (all leaves walked).
    fn ll_index_size(&self) -> Result<usize, CasIndexError>;

    /// `true` while the bound data is still the index's live state.
    fn is_up_to_date(&self) -> bool;

    /// Adapt into a std iterator yielding the current element and every
    /// element after it.
    fn forward(self) -> Forward<Self>
    where
        Self: Sized,
    {
        Forward { it: self }
    }
}

/// Iterators over sorted data that can be ordered against each other.
pub trait ComparableIterator: LowLevelIterator {
    fn comparator(&self) -> &Arc<FsComparator>;

    /// Compare the current elements: key order, ties by ascending id.
    ///
    /// # Errors
    /// [`CasIndexError::NotComparable`] if the comparators differ,
    /// [`CasIndexError::InvalidIterator`] if either side is invalid.
    fn compare_to<O>(&self, other: &O) -> Result<Ordering, CasIndexError>
    where
        O: ComparableIterator + ?Sized,
    {
        if !self.comparator().same_ordering(other.comparator()) {
            return Err(CasIndexError::NotComparable(format!(
                "{:?} vs {:?}",
                self.comparator(),
                other.comparator()
            )));
        }
        if !self.is_valid() || !other.is_valid() {
            return Err(CasIndexError::InvalidIterator);
        }
        Ok(self
            .comparator()
            .compare_with_id(self.get_nvc(), other.get_nvc()))
    }
}

/// See [`LowLevelIterator::forward`].
#[derive(Debug)]
pub struct Forward<I> {
    it: I,
}

impl<I> Forward<I> {
    pub fn into_inner(self) -> I {
        self.it
    }
}

impl<I: LowLevelIterator> Iterator for Forward<I> {
    type Item = FsRef;

    fn next(&mut self) -> Option<FsRef> {
        if !self.it.is_valid() {
            return None;
        }
        let fs = Arc::clone(self.it.get_nvc());
        self.it.move_to_next();
        Some(fs)
    }
}

impl<I: LowLevelIterator> FusedIterator for Forward<I> {}
