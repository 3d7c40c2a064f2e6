//! Feature structures: identity-bearing typed records stored in indexes.

pub mod feature_structure;
pub mod id;
pub mod value;

pub use feature_structure::{FeatureStructure, FsBuilder, FsRef};
pub use id::{FsId, FsIdAllocator};
pub use value::FeatureValue;
