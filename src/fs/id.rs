//! `FsId`: identity of a feature structure
//!
//! Every feature structure gets a unique, non-zero `u64` at creation. Ids
//! are allocated from a counter that never rewinds, so an id is never
//! reused while the FS is reachable. Index orderings fall back to ascending
//! id whenever the index comparator reports two distinct structures equal.

use std::{fmt, num::NonZeroU64};

use crate::cas_error::CasIndexError;

/// Identity of a feature structure.
///
/// `repr(transparent)` over `NonZeroU64`; 0 is reserved as invalid.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct FsId(NonZeroU64);

impl FsId {
    /// Creates a new `FsId` from a raw `u64` value.
    ///
    /// # Errors
    /// Returns [`CasIndexError::InvalidFsId`] if `raw == 0`.
    ///
    /// # Example
    /// ```rust
    /// # use cas_index::fs::FsId;
    /// let id = FsId::new(1).unwrap();
    /// assert_eq!(id.get(), 1);
    /// assert!(FsId::new(0).is_err());
    /// ```
    #[inline]
    pub fn new(raw: u64) -> Result<Self, CasIndexError> {
        NonZeroU64::new(raw).map(FsId).ok_or(CasIndexError::InvalidFsId)
    }

    /// Returns the inner `u64` value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for FsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FsId").field(&self.get()).finish()
    }
}

impl fmt::Display for FsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Monotonic id source owned by a CAS.
#[derive(Debug)]
pub struct FsIdAllocator {
    next: u64,
}

impl Default for FsIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl FsIdAllocator {
    /// Hand out the next id.
    ///
    /// # Errors
    /// [`CasIndexError::CapacityExhausted`] once the `u64` space is used up.
    pub fn allocate(&mut self) -> Result<FsId, CasIndexError> {
        let id = FsId::new(self.next)?;
        self.next = self
            .next
            .checked_add(1)
            .ok_or(CasIndexError::CapacityExhausted(usize::MAX))?;
        Ok(id)
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next - 1
    }
}

#[cfg(test)]
mod layout_tests {
    //! Compile-time assertion that `FsId` has the same size as `u64`.
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(FsId, u64);
    assert_eq_size!(Option<FsId>, u64);
}
