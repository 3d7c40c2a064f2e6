//! Type hierarchy for feature structures.
//!
//! Types form a single-inheritance tree rooted at `TOP`. Declarations go
//! through [`TypeSystemBuilder`]; once committed the resulting
//! [`TypeSystem`] is immutable and passed explicitly (as `Arc<TypeSystem>`)
//! to every CAS, comparator and index. There is no global type registry.

pub mod builder;
pub mod hierarchy;
pub mod type_code;

pub use builder::{
    ANNOTATION_TYPE_NAME, BEGIN_FEATURE, END_FEATURE, TOP_TYPE_NAME, TypeSystemBuilder,
};
pub use hierarchy::{FeatureInfo, FeatureRange, TypeInfo, TypeSystem};
pub use type_code::TypeCode;
