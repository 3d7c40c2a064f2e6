//! Committed, immutable type hierarchy.
//!
//! A [`TypeSystem`] is created once by
//! [`TypeSystemBuilder::commit`](super::TypeSystemBuilder::commit) and shared
//! as `Arc<TypeSystem>` by every CAS, index and comparator built on it. It is
//! never mutated afterwards, so all queries take `&self`.
//!
//! Subsumption and "type plus subtypes" queries run on a pre-order
//! numbering: the subtree of `t` is the contiguous range
//! `preorder[pre[t]..end[t]]`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use itertools::Itertools;

use super::type_code::TypeCode;
use crate::cas_error::CasIndexError;

/// Value range of a feature.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FeatureRange {
    Int,
    Float,
    Bool,
    Str,
}

impl FeatureRange {
    /// Short name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            FeatureRange::Int => "int",
            FeatureRange::Float => "float",
            FeatureRange::Bool => "bool",
            FeatureRange::Str => "string",
        }
    }
}

/// A feature as seen from one type (inherited features included).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureInfo {
    pub name: String,
    pub range: FeatureRange,
    /// Position of the value inside a feature structure of this type.
    pub slot: usize,
    /// Type that declared the feature.
    pub declared_on: TypeCode,
}

/// Per-type table entry.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub code: TypeCode,
    pub name: String,
    pub supertype: Option<TypeCode>,
    pub direct_subtypes: Vec<TypeCode>,
    /// All features, inherited ones first.
    pub features: Vec<FeatureInfo>,
}

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Immutable type hierarchy shared by all CAS instances built on it.
pub struct TypeSystem {
    uid: u64,
    types: Vec<TypeInfo>,
    by_name: HashMap<String, TypeCode>,
    preorder: Vec<TypeCode>,
    pre: Vec<usize>,
    end: Vec<usize>,
    priority: Vec<u32>,
}

impl TypeSystem {
    pub(super) fn from_parts(
        types: Vec<TypeInfo>,
        by_name: HashMap<String, TypeCode>,
        preorder: Vec<TypeCode>,
        pre: Vec<usize>,
        end: Vec<usize>,
        priority: Vec<u32>,
    ) -> Self {
        Self {
            uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
            types,
            by_name,
            preorder,
            pre,
            end,
            priority,
        }
    }

    /// Process-unique identity of this committed type system. Structures
    /// remember it so they are never read through another layout.
    #[inline]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Number of types, `TOP` included.
    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: `TOP` is always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The root type.
    #[inline]
    pub fn top(&self) -> TypeCode {
        TypeCode::TOP
    }

    /// Table entry for `ty`.
    pub fn info(&self, ty: TypeCode) -> Result<&TypeInfo, CasIndexError> {
        self.types
            .get(ty.index())
            .ok_or(CasIndexError::InvalidTypeCode(ty.get()))
    }

    /// Resolve a type by name.
    pub fn type_by_name(&self, name: &str) -> Result<TypeCode, CasIndexError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CasIndexError::UnknownType(name.to_string()))
    }

    /// Name of `ty`, or `"<invalid>"` for a foreign code.
    pub fn name(&self, ty: TypeCode) -> &str {
        self.types
            .get(ty.index())
            .map_or("<invalid>", |t| t.name.as_str())
    }

    /// Parent of `ty`; `None` for `TOP`.
    pub fn supertype(&self, ty: TypeCode) -> Option<TypeCode> {
        self.types.get(ty.index()).and_then(|t| t.supertype)
    }

    /// `true` iff `sub` is `sup` or a (transitive) subtype of it.
    #[inline]
    pub fn subsumes(&self, sup: TypeCode, sub: TypeCode) -> bool {
        let (Some(&lo), Some(&hi), Some(&p)) = (
            self.pre.get(sup.index()),
            self.end.get(sup.index()),
            self.pre.get(sub.index()),
        ) else {
            return false;
        };
        lo <= p && p < hi
    }

    /// `ty` followed by all its subtypes, in pre-order.
    pub fn subtypes_inclusive(&self, ty: TypeCode) -> Result<&[TypeCode], CasIndexError> {
        let i = ty.index();
        if i >= self.types.len() {
            return Err(CasIndexError::InvalidTypeCode(ty.get()));
        }
        Ok(&self.preorder[self.pre[i]..self.end[i]])
    }

    /// Resolve a feature visible on `ty`.
    pub fn feature(&self, ty: TypeCode, name: &str) -> Result<&FeatureInfo, CasIndexError> {
        let info = self.info(ty)?;
        info.features
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| CasIndexError::UnknownFeature {
                ty: info.name.clone(),
                feature: name.to_string(),
            })
    }

    /// Linear type order used by [`ComparatorKey::TypePriority`]; lower is
    /// earlier.
    ///
    /// [`ComparatorKey::TypePriority`]: crate::index::comparator::ComparatorKey::TypePriority
    #[inline]
    pub fn priority(&self, ty: TypeCode) -> u32 {
        self.priority.get(ty.index()).copied().unwrap_or(u32::MAX)
    }
}

impl fmt::Debug for TypeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.preorder.iter().map(|&t| self.name(t)).join(", ");
        write!(f, "TypeSystem[{names}]")
    }
}
