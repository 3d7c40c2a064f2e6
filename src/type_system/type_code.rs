//! `TypeCode`: a strong, zero-cost handle for CAS types
//!
//! Type codes are handed out by [`TypeSystemBuilder`](super::TypeSystemBuilder)
//! in declaration order, starting at 1 for the built-in `TOP` type. The code
//! doubles as a dense index into the committed [`TypeSystem`](super::TypeSystem)
//! tables (`code - 1`).

use std::{fmt, num::NonZeroU32};

use crate::cas_error::CasIndexError;

/// Opaque identifier of a type inside one type system.
///
/// This type is `repr(transparent)` over `NonZeroU32`, so `Option<TypeCode>`
/// costs no extra space.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct TypeCode(NonZeroU32);

impl TypeCode {
    /// Code of the root type every other type descends from.
    pub const TOP: TypeCode = TypeCode(NonZeroU32::MIN);

    /// Creates a `TypeCode` from a raw value.
    ///
    /// # Errors
    /// Returns [`CasIndexError::InvalidTypeCode`] if `raw == 0`.
    #[inline]
    pub fn new(raw: u32) -> Result<Self, CasIndexError> {
        NonZeroU32::new(raw)
            .map(TypeCode)
            .ok_or(CasIndexError::InvalidTypeCode(raw))
    }

    /// Returns the raw value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Dense table index of this code.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Inverse of [`index`](Self::index).
    #[inline]
    pub(crate) fn from_index(i: usize) -> Self {
        // i + 1 is never zero
        TypeCode(NonZeroU32::MIN.saturating_add(i as u32))
    }
}

impl fmt::Debug for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeCode").field(&self.get()).finish()
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(TypeCode, u32);
    assert_eq_size!(Option<TypeCode>, u32);
}
