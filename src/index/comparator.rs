//! Index comparators.
//!
//! An [`FsComparator`] orders feature structures of one type (and its
//! subtypes) by a list of keys. Two structures that agree on every key are
//! "key-equal"; [`FsComparator::compare_with_id`] extends the order with an
//! ascending-id tie-break, which turns it into a total order over distinct
//! structures. Sorted indexes and merge iteration use the extended order;
//! set indexes use the key order for uniqueness.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::cas_error::CasIndexError;
use crate::fs::FeatureStructure;
use crate::type_system::{TypeCode, TypeSystem};

/// Direction of one key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum KeyOrder {
    #[default]
    Standard,
    Reverse,
}

impl KeyOrder {
    #[inline]
    fn apply(self, o: Ordering) -> Ordering {
        match self {
            KeyOrder::Standard => o,
            KeyOrder::Reverse => o.reverse(),
        }
    }
}

/// One comparison key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComparatorKey {
    /// Compare the value at `slot` (resolved from `name` on the index type).
    Feature {
        name: String,
        slot: usize,
        order: KeyOrder,
    },
    /// Compare by the type system's linear type order.
    TypePriority,
}

/// Key-based ordering bound to one type system.
#[derive(Clone)]
pub struct FsComparator {
    ts: Arc<TypeSystem>,
    ty: TypeCode,
    keys: Vec<ComparatorKey>,
}

impl FsComparator {
    /// Start a comparator over `ty`.
    pub fn builder(ts: &Arc<TypeSystem>, ty: TypeCode) -> ComparatorBuilder {
        ComparatorBuilder {
            ts: Arc::clone(ts),
            ty,
            keys: Vec::new(),
            error: None,
        }
    }

    /// A comparator without keys: every pair is key-equal, so the extended
    /// order is pure id order.
    pub fn identity(ts: &Arc<TypeSystem>, ty: TypeCode) -> Self {
        Self {
            ts: Arc::clone(ts),
            ty,
            keys: Vec::new(),
        }
    }

    #[inline]
    pub fn type_code(&self) -> TypeCode {
        self.ty
    }

    #[inline]
    pub fn keys(&self) -> &[ComparatorKey] {
        &self.keys
    }

    #[inline]
    pub fn type_system(&self) -> &Arc<TypeSystem> {
        &self.ts
    }

    /// Key order only.
    pub fn compare(&self, a: &FeatureStructure, b: &FeatureStructure) -> Ordering {
        for key in &self.keys {
            let o = match key {
                ComparatorKey::Feature { slot, order, .. } => {
                    let o = match (a.value_at(*slot), b.value_at(*slot)) {
                        (Some(x), Some(y)) => x.total_cmp(y),
                        (x, y) => x.is_some().cmp(&y.is_some()),
                    };
                    order.apply(o)
                }
                ComparatorKey::TypePriority => self
                    .ts
                    .priority(a.type_code())
                    .cmp(&self.ts.priority(b.type_code())),
            };
            if o != Ordering::Equal {
                return o;
            }
        }
        Ordering::Equal
    }

    /// Key order, ties broken by ascending id.
    #[inline]
    pub fn compare_with_id(&self, a: &FeatureStructure, b: &FeatureStructure) -> Ordering {
        self.compare(a, b).then_with(|| a.id().cmp(&b.id()))
    }

    /// `true` if both comparators produce the same order: same type system,
    /// same keys. The index type may differ (subtype views of one index).
    pub fn same_ordering(&self, other: &FsComparator) -> bool {
        Arc::ptr_eq(&self.ts, &other.ts) && self.keys == other.keys
    }
}

impl fmt::Debug for FsComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsComparator")
            .field("ty", &self.ts.name(self.ty))
            .field("keys", &self.keys)
            .finish()
    }
}

/// Builder for [`FsComparator`]; errors are reported by [`build`](Self::build).
pub struct ComparatorBuilder {
    ts: Arc<TypeSystem>,
    ty: TypeCode,
    keys: Vec<ComparatorKey>,
    error: Option<CasIndexError>,
}

impl ComparatorBuilder {
    /// Add a feature key; the feature must be visible on the index type.
    pub fn key(mut self, feature: &str, order: KeyOrder) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.ts.feature(self.ty, feature) {
            Ok(info) => {
                let slot = info.slot;
                self.keys.push(ComparatorKey::Feature {
                    name: feature.to_string(),
                    slot,
                    order,
                });
            }
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Add a type-priority key.
    pub fn type_priority(mut self) -> Self {
        self.keys.push(ComparatorKey::TypePriority);
        self
    }

    pub fn build(self) -> Result<FsComparator, CasIndexError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.ts.info(self.ty)?;
        Ok(FsComparator {
            ts: self.ts,
            ty: self.ty,
            keys: self.keys,
        })
    }
}
