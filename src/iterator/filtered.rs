//! Predicate-filtering decorator.
//!
//! After every repositioning call the base iterator is either invalid or at
//! an element the predicate accepts: forward moves skip forward, backward
//! moves skip backward.

use std::fmt;
use std::sync::Arc;

use super::traits::{ComparableIterator, LowLevelIterator};
use crate::cas_error::CasIndexError;
use crate::fs::{FeatureStructure, FsRef};
use crate::index::FsComparator;

/// Shared, stateless match predicate.
pub type FsPredicate = Arc<dyn Fn(&FeatureStructure) -> bool + Send + Sync>;

/// Skips base elements rejected by a predicate.
pub struct FilteredIterator<I> {
    base: I,
    predicate: FsPredicate,
}

impl<I: LowLevelIterator> FilteredIterator<I> {
    /// Wrap `base`; the position is adjusted forward from wherever `base`
    /// currently is.
    pub fn new(base: I, predicate: FsPredicate) -> Self {
        let mut it = Self { base, predicate };
        it.skip_forward();
        it
    }

    pub fn base(&self) -> &I {
        &self.base
    }

    pub fn predicate(&self) -> &FsPredicate {
        &self.predicate
    }

    fn skip_forward(&mut self) {
        while self.base.is_valid() && !(self.predicate)(self.base.get_nvc()) {
            self.base.move_to_next();
        }
    }

    fn skip_backward(&mut self) {
        while self.base.is_valid() && !(self.predicate)(self.base.get_nvc()) {
            self.base.move_to_previous();
        }
    }
}

impl<I: LowLevelIterator> LowLevelIterator for FilteredIterator<I> {
    #[inline]
    fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    #[inline]
    fn get_nvc(&self) -> &FsRef {
        self.base.get_nvc()
    }

    fn move_to_first(&mut self) {
        self.base.move_to_first();
        self.skip_forward();
    }

    fn move_to_last(&mut self) {
        self.base.move_to_last();
        self.skip_backward();
    }

    fn move_to_first_no_reinit(&mut self) {
        self.base.move_to_first_no_reinit();
        self.skip_forward();
    }

    fn move_to_last_no_reinit(&mut self) {
        self.base.move_to_last_no_reinit();
        self.skip_backward();
    }

    fn move_to_next(&mut self) {
        self.base.move_to_next();
        self.skip_forward();
    }

    fn move_to_previous(&mut self) {
        self.base.move_to_previous();
        self.skip_backward();
    }

    fn move_to(&mut self, target: &FeatureStructure) {
        self.base.move_to(target);
        self.skip_forward();
    }

    fn copy(&self) -> Self {
        Self {
            base: self.base.copy(),
            predicate: Arc::clone(&self.predicate),
        }
    }

    fn ll_index_size(&self) -> Result<usize, CasIndexError> {
        Err(CasIndexError::UnsupportedOperation(
            "ll_index_size through a filtered iterator",
        ))
    }

    fn is_up_to_date(&self) -> bool {
        self.base.is_up_to_date()
    }
}

impl<I: ComparableIterator> ComparableIterator for FilteredIterator<I> {
    fn comparator(&self) -> &Arc<FsComparator> {
        self.base.comparator()
    }
}

impl<I: fmt::Debug> fmt::Debug for FilteredIterator<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredIterator")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}
