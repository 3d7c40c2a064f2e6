//! Index flavors and their backing stores.
//!
//! - [`comparator`]: key orders over feature structures
//! - [`ordered_set`]: the sorted array core with copy-on-write
//! - [`cow`]: snapshots shared with iterators
//! - [`bag`]: identity bag with small/promoted representations
//! - [`fs_index`]: one index (definition + one store per covered type)

pub mod bag;
pub mod comparator;
pub mod cow;
pub mod fs_index;
pub mod ordered_set;

use std::sync::Arc;

use crate::cas_error::CasIndexError;
use crate::type_system::{BEGIN_FEATURE, END_FEATURE, TypeCode, TypeSystem};

pub use bag::BagStore;
pub use comparator::{ComparatorKey, FsComparator, KeyOrder};
pub use cow::{CopyOnWritePart, SnapshotSource};
pub use fs_index::FsIndex;
pub use ordered_set::{DuplicatePolicy, OrderedFsSet, Uniqueness};

/// Label of the built-in annotation index.
pub const ANNOTATION_INDEX: &str = "AnnotationIndex";

/// Duplicate tolerance and ordering of an index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IndexKind {
    /// Total order by key then id; supports merged subtype iteration.
    Sorted,
    /// Unique by key.
    Set,
    /// Unique by identity; id order.
    Bag,
}

/// Declaration of one index: label, kind and comparator (whose type is the
/// index type).
#[derive(Clone, Debug)]
pub struct IndexDefinition {
    label: String,
    kind: IndexKind,
    comparator: Arc<FsComparator>,
    duplicate_policy: Option<DuplicatePolicy>,
}

impl IndexDefinition {
    pub fn sorted(label: &str, comparator: FsComparator) -> Self {
        Self::new(label, IndexKind::Sorted, comparator)
    }

    pub fn set(label: &str, comparator: FsComparator) -> Self {
        Self::new(label, IndexKind::Set, comparator)
    }

    /// A bag over `ty`; bags ignore keys.
    pub fn bag(label: &str, ts: &Arc<TypeSystem>, ty: TypeCode) -> Self {
        Self::new(label, IndexKind::Bag, FsComparator::identity(ts, ty))
    }

    fn new(label: &str, kind: IndexKind, comparator: FsComparator) -> Self {
        Self {
            label: label.to_string(),
            kind,
            comparator: Arc::new(comparator),
            duplicate_policy: None,
        }
    }

    /// Override the configured policy for key-equal inserts (set indexes).
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = Some(policy);
        self
    }

    /// The annotation index: sorted by `begin` ascending, `end` descending,
    /// then type priority. Requires the built-in annotation type.
    pub fn annotation_index(ts: &Arc<TypeSystem>) -> Result<Self, CasIndexError> {
        let ann = ts.type_by_name(crate::type_system::ANNOTATION_TYPE_NAME)?;
        let cmp = FsComparator::builder(ts, ann)
            .key(BEGIN_FEATURE, KeyOrder::Standard)
            .key(END_FEATURE, KeyOrder::Reverse)
            .type_priority()
            .build()?;
        Ok(Self::sorted(ANNOTATION_INDEX, cmp))
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    #[inline]
    pub fn type_code(&self) -> TypeCode {
        self.comparator.type_code()
    }

    #[inline]
    pub fn comparator(&self) -> &Arc<FsComparator> {
        &self.comparator
    }

    #[inline]
    pub fn duplicate_policy(&self) -> Option<DuplicatePolicy> {
        self.duplicate_policy
    }
}
