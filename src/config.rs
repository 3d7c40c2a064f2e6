//! Tunables for index stores and declarative index specifications.
//!
//! [`IndexConfig`] follows the usual `..Default::default()` struct-update
//! style:
//!
//! ```rust
//! use cas_index::config::IndexConfig;
//! let cfg = IndexConfig { bag_promotion_threshold: 8, ..Default::default() };
//! assert_eq!(cfg.initial_capacity, IndexConfig::default().initial_capacity);
//! ```
//!
//! [`IndexSpec`] is a serializable description of an index, resolved against
//! a committed type system into an [`IndexDefinition`].

use std::sync::Arc;

use crate::cas_error::CasIndexError;
use crate::index::{DuplicatePolicy, FsComparator, IndexDefinition, IndexKind, KeyOrder};
use crate::type_system::TypeSystem;

/// Store tuning shared by all indexes of a repository.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// A bag leaf switches from the hashed to the ordered representation
    /// once it holds more than this many structures.
    pub bag_promotion_threshold: usize,
    /// Initial capacity of sorted/set leaf arrays.
    pub initial_capacity: usize,
    /// Policy of set indexes that do not set their own.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            bag_promotion_threshold: 64,
            initial_capacity: 0,
            duplicate_policy: DuplicatePolicy::Reject,
        }
    }
}

/// One key of an [`IndexSpec`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum KeySpec {
    Feature {
        name: String,
        #[serde(default)]
        order: KeyOrder,
    },
    TypePriority,
}

/// Serializable index declaration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IndexSpec {
    pub label: String,
    pub type_name: String,
    pub kind: IndexKind,
    #[serde(default)]
    pub keys: Vec<KeySpec>,
    #[serde(default)]
    pub duplicate_policy: Option<DuplicatePolicy>,
}

impl IndexSpec {
    /// Resolve type and feature names against `ts`.
    pub fn resolve(&self, ts: &Arc<TypeSystem>) -> Result<IndexDefinition, CasIndexError> {
        let ty = ts.type_by_name(&self.type_name)?;
        let def = match self.kind {
            IndexKind::Bag => IndexDefinition::bag(&self.label, ts, ty),
            kind => {
                let mut b = FsComparator::builder(ts, ty);
                for key in &self.keys {
                    b = match key {
                        KeySpec::Feature { name, order } => b.key(name, *order),
                        KeySpec::TypePriority => b.type_priority(),
                    };
                }
                let cmp = b.build()?;
                if kind == IndexKind::Set {
                    IndexDefinition::set(&self.label, cmp)
                } else {
                    IndexDefinition::sorted(&self.label, cmp)
                }
            }
        };
        Ok(match self.duplicate_policy {
            Some(p) => def.with_duplicate_policy(p),
            None => def,
        })
    }
}
