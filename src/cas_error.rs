//! CasIndexError: Unified error type for cas-index public APIs
//!
//! Every fallible operation in the type system, the index repository and the
//! iterator layer reports through this enum. Nothing is retried internally;
//! errors propagate synchronously to the caller.

use thiserror::Error;

/// Unified error type for cas-index operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CasIndexError {
    /// Attempted to construct an FS id with a zero value (invalid).
    #[error("FsId must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidFsId,
    /// A type code that does not belong to the type system in use.
    #[error("Type code {0} is not defined in this type system")]
    InvalidTypeCode(u32),

    // --- type system setup ---------------------------------------------------
    /// No type with this name exists.
    #[error("Unknown type `{0}`")]
    UnknownType(String),
    /// A type with this name was already declared.
    #[error("Type `{0}` is already defined")]
    DuplicateType(String),
    /// The feature is neither declared on the type nor inherited by it.
    #[error("Type `{ty}` has no feature `{feature}`")]
    UnknownFeature { ty: String, feature: String },
    /// The feature name is already used on the type or one of its supertypes.
    #[error("Feature `{feature}` is already defined on `{ty}` or a supertype")]
    DuplicateFeature { ty: String, feature: String },
    /// A value of the wrong range was supplied for a feature.
    #[error("Feature `{feature}` expects a {expected} value, found {found}")]
    FeatureRangeMismatch {
        feature: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Type priority list does not mention every type exactly once.
    #[error("Invalid type priority list: {0}")]
    InvalidTypePriorities(String),

    // --- repository / views ---------------------------------------------------
    /// No index is registered under this label.
    #[error("Unknown index `{0}`")]
    UnknownIndex(String),
    /// Two index definitions share a label.
    #[error("Index label `{0}` is already registered")]
    DuplicateIndexLabel(String),
    /// Requested a sub-index for a type the index does not cover.
    #[error("Index `{index}` does not cover type `{ty}`")]
    TypeNotInIndex { index: String, ty: String },
    /// No view with this name exists in the CAS.
    #[error("Unknown view `{0}`")]
    UnknownView(String),
    /// A view with this name already exists.
    #[error("View `{0}` already exists")]
    DuplicateView(String),
    /// An index definition or structure built against another type system.
    #[error("`{0}` was built against a different type system")]
    ForeignTypeSystem(String),

    // --- iterator usage -------------------------------------------------------
    /// Dereferenced an iterator that is not positioned at an element.
    #[error("Iterator is not valid (positioned outside its elements)")]
    InvalidIterator,
    /// The operation has no meaning for this iterator or index flavor.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    // --- consistency ----------------------------------------------------------
    /// Two iterators were compared or merged whose orderings differ.
    #[error("Iterators are not comparable: {0}")]
    NotComparable(String),
    /// A structural invariant does not hold.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    // --- resources ------------------------------------------------------------
    /// The backing store could not grow.
    #[error("Backing store could not grow beyond {0} elements")]
    CapacityExhausted(usize),
}
