//! Declarative match conditions over feature structures.
//!
//! A [`ConstraintFactory`] resolves type and feature names once, producing
//! an [`FsConstraint`] tree that can be evaluated directly or turned into an
//! [`FsPredicate`] for filtered iteration.
//!
//! ```rust
//! # fn main() -> Result<(), cas_index::CasIndexError> {
//! use cas_index::constraint::{CmpOp, ConstraintFactory};
//! use cas_index::fs::{FeatureValue, FsBuilder, FsId};
//! use cas_index::type_system::TypeSystemBuilder;
//!
//! let mut b = TypeSystemBuilder::new();
//! let ann = b.with_annotation_type()?;
//! let ts = b.commit()?;
//! let f = ConstraintFactory::new(&ts);
//! let short = f.and(
//!     f.is_type(ann),
//!     f.feature(ann, "end", CmpOp::Le, FeatureValue::Int(10))?,
//! );
//! let fs = FsBuilder::new(&ts, FsId::new(1)?, ann)?.with_int("end", 7)?.build();
//! assert!(short.matches(&ts, &fs));
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;
use std::sync::Arc;

use crate::cas_error::CasIndexError;
use crate::fs::{FeatureStructure, FeatureValue};
use crate::iterator::FsPredicate;
use crate::type_system::{TypeCode, TypeSystem};

/// Comparison applied between a feature value and a constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    #[inline]
    fn holds(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord.is_eq(),
            CmpOp::Ne => ord.is_ne(),
            CmpOp::Lt => ord.is_lt(),
            CmpOp::Le => ord.is_le(),
            CmpOp::Gt => ord.is_gt(),
            CmpOp::Ge => ord.is_ge(),
        }
    }
}

/// Resolved constraint tree.
#[derive(Clone, Debug)]
pub enum FsConstraint {
    /// The structure's type is `ty` (or a subtype, if asked).
    Type { ty: TypeCode, include_subtypes: bool },
    /// The structure is of `ty` or a subtype and its feature at `slot`
    /// compares to `value` as `op` says.
    Feature {
        ty: TypeCode,
        slot: usize,
        name: String,
        op: CmpOp,
        value: FeatureValue,
    },
    And(Box<FsConstraint>, Box<FsConstraint>),
    Or(Box<FsConstraint>, Box<FsConstraint>),
    Not(Box<FsConstraint>),
}

impl FsConstraint {
    /// Evaluate against `fs`. Structures lacking the constrained feature do
    /// not match a feature test.
    pub fn matches(&self, ts: &TypeSystem, fs: &FeatureStructure) -> bool {
        match self {
            FsConstraint::Type {
                ty,
                include_subtypes: true,
            } => ts.subsumes(*ty, fs.type_code()),
            FsConstraint::Type {
                ty,
                include_subtypes: false,
            } => *ty == fs.type_code(),
            FsConstraint::Feature {
                ty, slot, op, value, ..
            } => {
                ts.subsumes(*ty, fs.type_code())
                    && fs
                        .value_at(*slot)
                        .is_some_and(|v| op.holds(v.total_cmp(value)))
            }
            FsConstraint::And(a, b) => a.matches(ts, fs) && b.matches(ts, fs),
            FsConstraint::Or(a, b) => a.matches(ts, fs) || b.matches(ts, fs),
            FsConstraint::Not(c) => !c.matches(ts, fs),
        }
    }

    /// Predicate evaluating this constraint against `ts`.
    pub fn into_predicate(self, ts: &Arc<TypeSystem>) -> FsPredicate {
        let ts = Arc::clone(ts);
        Arc::new(move |fs: &FeatureStructure| self.matches(&ts, fs))
    }
}

/// Builds constraints against one type system.
#[derive(Clone, Debug)]
pub struct ConstraintFactory {
    ts: Arc<TypeSystem>,
}

impl ConstraintFactory {
    pub fn new(ts: &Arc<TypeSystem>) -> Self {
        Self { ts: Arc::clone(ts) }
    }

    /// Type `ty` or any subtype.
    pub fn is_type(&self, ty: TypeCode) -> FsConstraint {
        FsConstraint::Type {
            ty,
            include_subtypes: true,
        }
    }

    /// Exactly type `ty`.
    pub fn is_exact_type(&self, ty: TypeCode) -> FsConstraint {
        FsConstraint::Type {
            ty,
            include_subtypes: false,
        }
    }

    /// Compare feature `name` of `ty` against `value`.
    ///
    /// # Errors
    /// [`CasIndexError::UnknownFeature`] if `ty` has no such feature,
    /// [`CasIndexError::FeatureRangeMismatch`] if `value` has another range.
    pub fn feature(
        &self,
        ty: TypeCode,
        name: &str,
        op: CmpOp,
        value: FeatureValue,
    ) -> Result<FsConstraint, CasIndexError> {
        let info = self.ts.feature(ty, name)?;
        if info.range != value.range() {
            return Err(CasIndexError::FeatureRangeMismatch {
                feature: name.to_string(),
                expected: info.range.name(),
                found: value.range().name(),
            });
        }
        Ok(FsConstraint::Feature {
            ty,
            slot: info.slot,
            name: name.to_string(),
            op,
            value,
        })
    }

    pub fn and(&self, a: FsConstraint, b: FsConstraint) -> FsConstraint {
        FsConstraint::And(Box::new(a), Box::new(b))
    }

    pub fn or(&self, a: FsConstraint, b: FsConstraint) -> FsConstraint {
        FsConstraint::Or(Box::new(a), Box::new(b))
    }

    pub fn not(&self, c: FsConstraint) -> FsConstraint {
        FsConstraint::Not(Box::new(c))
    }

    /// [`FsConstraint::into_predicate`] against this factory's type system.
    pub fn predicate(&self, c: FsConstraint) -> FsPredicate {
        c.into_predicate(&self.ts)
    }
}
