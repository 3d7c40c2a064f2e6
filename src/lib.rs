#![cfg_attr(docsrs, feature(doc_cfg))]
//! # cas-index
//!
//! cas-index stores typed, identity-bearing feature structures in ordered,
//! set and bag indexes, and iterates them through cursors that stay valid
//! while the indexes change underneath.
//!
//! ## Features
//! - Single-inheritance type system with inherited features and type priorities
//! - Sorted indexes (key order, ties by ascending id), set indexes (unique by key)
//!   and bag indexes (unique by identity)
//! - Copy-on-write snapshots: iterators see the index as it was when they were
//!   positioned, at no cost unless the index is written while they live
//! - Merged type-plus-subtypes iteration, predicate filtering and constraints
//! - Views, repositories and a reusable CAS pool
//!
//! ## Example
//!
//! ```rust
//! # fn main() -> Result<(), cas_index::CasIndexError> {
//! use cas_index::prelude::*;
//!
//! let mut b = TypeSystemBuilder::new();
//! let ann = b.with_annotation_type()?;
//! let ts = b.commit()?;
//! let mut cas = Cas::new(&ts, vec![IndexDefinition::annotation_index(&ts)?])?;
//!
//! for (begin, end) in [(5, 9), (0, 4), (0, 9)] {
//!     let fs = cas.create_fs(ann)?.with_int("begin", begin)?.with_int("end", end)?.build();
//!     cas.add_fs(fs)?;
//! }
//! let spans: Vec<(i64, i64)> = cas
//!     .iterator(ANNOTATION_INDEX, true)?
//!     .to_vec()
//!     .iter()
//!     .map(|fs| (fs.int(&ts, "begin").unwrap(), fs.int(&ts, "end").unwrap()))
//!     .collect();
//! assert_eq!(spans, vec![(0, 9), (0, 4), (5, 9)]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Invariant checks
//!
//! Index stores validate their ordering after every mutation in debug builds,
//! or in release builds with the `check-invariants` feature.

pub mod cas;
pub mod cas_error;
pub mod config;
pub mod constraint;
pub mod debug_invariants;
pub mod fs;
pub mod index;
pub mod iterator;
pub mod pool;
pub mod repository;
pub mod type_system;

pub use cas_error::CasIndexError;
pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::cas::{Cas, INITIAL_VIEW, View};
    pub use crate::cas_error::CasIndexError;
    pub use crate::config::IndexConfig;
    pub use crate::constraint::{CmpOp, ConstraintFactory, FsConstraint};
    pub use crate::fs::{FeatureStructure, FeatureValue, FsBuilder, FsId, FsRef};
    pub use crate::index::{
        ANNOTATION_INDEX, DuplicatePolicy, FsComparator, IndexDefinition, IndexKind, KeyOrder,
    };
    pub use crate::iterator::{ComparableIterator, FsIterator, FsPredicate, LowLevelIterator};
    pub use crate::pool::{CasPool, ReleaseError};
    pub use crate::repository::IndexRepository;
    pub use crate::type_system::{FeatureRange, TypeCode, TypeSystem, TypeSystemBuilder};
}
