//! Typed feature-structure records and their builder.

use std::fmt;
use std::sync::Arc;

use super::id::FsId;
use super::value::FeatureValue;
use crate::cas_error::CasIndexError;
use crate::type_system::{FeatureRange, TypeCode, TypeSystem};

/// Shared handle to a feature structure. Cloning is a reference-count bump.
pub type FsRef = Arc<FeatureStructure>;

/// A typed record: identity, type and one value per feature slot.
///
/// Values are fixed once the structure is built, so the sort keys of an
/// indexed structure cannot change underneath its index.
pub struct FeatureStructure {
    id: FsId,
    ty: TypeCode,
    ts_uid: u64,
    values: Box<[FeatureValue]>,
}

impl FeatureStructure {
    #[inline]
    pub fn id(&self) -> FsId {
        self.id
    }

    #[inline]
    pub fn type_code(&self) -> TypeCode {
        self.ty
    }

    /// `true` if this structure was built against `ts`.
    #[inline]
    pub fn built_for(&self, ts: &TypeSystem) -> bool {
        self.ts_uid == ts.uid()
    }

    /// Value stored at `slot`, if the type has that many features.
    #[inline]
    pub fn value_at(&self, slot: usize) -> Option<&FeatureValue> {
        self.values.get(slot)
    }

    /// Value of the named feature.
    pub fn value(&self, ts: &TypeSystem, feature: &str) -> Result<&FeatureValue, CasIndexError> {
        if !self.built_for(ts) {
            return Err(CasIndexError::ForeignTypeSystem(format!("FS {}", self.id.get())));
        }
        let info = ts.feature(self.ty, feature)?;
        self.values
            .get(info.slot)
            .ok_or_else(|| CasIndexError::UnknownFeature {
                ty: ts.name(self.ty).to_string(),
                feature: feature.to_string(),
            })
    }

    pub fn int(&self, ts: &TypeSystem, feature: &str) -> Result<i64, CasIndexError> {
        let v = self.value(ts, feature)?;
        v.as_int().ok_or_else(|| range_mismatch(feature, FeatureRange::Int, v))
    }

    pub fn string(&self, ts: &TypeSystem, feature: &str) -> Result<Option<&str>, CasIndexError> {
        let v = self.value(ts, feature)?;
        match v {
            FeatureValue::Str(s) => Ok(s.as_deref()),
            _ => Err(range_mismatch(feature, FeatureRange::Str, v)),
        }
    }
}

impl fmt::Debug for FeatureStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureStructure")
            .field("id", &self.id)
            .field("ty", &self.ty)
            .field("values", &self.values)
            .finish()
    }
}

/// Equality is identity: two handles are equal iff they carry the same id.
impl PartialEq for FeatureStructure {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FeatureStructure {}

fn range_mismatch(feature: &str, expected: FeatureRange, found: &FeatureValue) -> CasIndexError {
    CasIndexError::FeatureRangeMismatch {
        feature: feature.to_string(),
        expected: expected.name(),
        found: found.range().name(),
    }
}

/// Collects feature values for a new structure.
///
/// ```rust
/// # fn main() -> Result<(), cas_index::CasIndexError> {
/// use cas_index::fs::{FsBuilder, FsId};
/// use cas_index::type_system::TypeSystemBuilder;
///
/// let mut b = TypeSystemBuilder::new();
/// let ann = b.with_annotation_type()?;
/// let ts = b.commit()?;
/// let fs = FsBuilder::new(&ts, FsId::new(1)?, ann)?
///     .with_int("begin", 3)?
///     .with_int("end", 8)?
///     .build();
/// assert_eq!(fs.int(&ts, "end")?, 8);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FsBuilder {
    ts: Arc<TypeSystem>,
    id: FsId,
    ty: TypeCode,
    values: Vec<FeatureValue>,
}

impl FsBuilder {
    /// Start a structure of type `ty` with every feature at its default.
    pub fn new(ts: &Arc<TypeSystem>, id: FsId, ty: TypeCode) -> Result<Self, CasIndexError> {
        let values = ts
            .info(ty)?
            .features
            .iter()
            .map(|f| FeatureValue::default_for(f.range))
            .collect();
        Ok(Self {
            ts: Arc::clone(ts),
            id,
            ty,
            values,
        })
    }

    /// Set a feature value; the value's range must match the feature's.
    pub fn set(mut self, feature: &str, value: FeatureValue) -> Result<Self, CasIndexError> {
        let info = self.ts.feature(self.ty, feature)?;
        if info.range != value.range() {
            return Err(range_mismatch(feature, info.range, &value));
        }
        let slot = info.slot;
        self.values[slot] = value;
        Ok(self)
    }

    pub fn with_int(self, feature: &str, v: i64) -> Result<Self, CasIndexError> {
        self.set(feature, FeatureValue::Int(v))
    }

    pub fn with_float(self, feature: &str, v: f64) -> Result<Self, CasIndexError> {
        self.set(feature, FeatureValue::Float(v))
    }

    pub fn with_bool(self, feature: &str, v: bool) -> Result<Self, CasIndexError> {
        self.set(feature, FeatureValue::Bool(v))
    }

    pub fn with_str(self, feature: &str, v: &str) -> Result<Self, CasIndexError> {
        self.set(feature, FeatureValue::from(v))
    }

    /// Finish the structure.
    pub fn build(self) -> FsRef {
        Arc::new(FeatureStructure {
            id: self.id,
            ty: self.ty,
            ts_uid: self.ts.uid(),
            values: self.values.into_boxed_slice(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_system::TypeSystemBuilder;

    #[test]
    fn builder_checks_feature_range() {
        let mut b = TypeSystemBuilder::new();
        let ann = b.with_annotation_type().unwrap();
        let ts = b.commit().unwrap();
        let err = FsBuilder::new(&ts, FsId::new(1).unwrap(), ann)
            .unwrap()
            .with_str("begin", "x")
            .unwrap_err();
        assert_eq!(
            err,
            CasIndexError::FeatureRangeMismatch {
                feature: "begin".into(),
                expected: "int",
                found: "string",
            }
        );
    }

    #[test]
    fn unset_features_take_defaults() {
        let mut b = TypeSystemBuilder::new();
        let ann = b.with_annotation_type().unwrap();
        let tok = b.add_type("Token", ann).unwrap();
        b.add_feature(tok, "pos", FeatureRange::Str).unwrap();
        let ts = b.commit().unwrap();
        let fs = FsBuilder::new(&ts, FsId::new(9).unwrap(), tok)
            .unwrap()
            .with_int("end", 4)
            .unwrap()
            .build();
        assert_eq!(fs.int(&ts, "begin").unwrap(), 0);
        assert_eq!(fs.int(&ts, "end").unwrap(), 4);
        assert_eq!(fs.string(&ts, "pos").unwrap(), None);
        assert_eq!(fs.id().get(), 9);
    }

    #[test]
    fn feature_lookup_errors_name_type_and_feature() {
        let mut b = TypeSystemBuilder::new();
        let ann = b.with_annotation_type().unwrap();
        let tok = b.add_type("Token", ann).unwrap();
        b.add_feature(tok, "pos", FeatureRange::Str).unwrap();
        let ts = b.commit().unwrap();
        let fs = FsBuilder::new(&ts, FsId::new(3).unwrap(), ann).unwrap().build();
        assert_eq!(
            fs.string(&ts, "pos").unwrap_err(),
            CasIndexError::UnknownFeature {
                ty: "Annotation".into(),
                feature: "pos".into(),
            }
        );

        let mut b = TypeSystemBuilder::new();
        b.with_annotation_type().unwrap();
        let twin = b.commit().unwrap();
        assert!(fs.built_for(&ts));
        assert!(!fs.built_for(&twin));
        assert_eq!(
            fs.int(&twin, "begin").unwrap_err(),
            CasIndexError::ForeignTypeSystem("FS 3".into())
        );
    }
}
