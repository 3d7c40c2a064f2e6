//! Mutable type-system declaration, frozen by [`TypeSystemBuilder::commit`].

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use super::hierarchy::{FeatureInfo, FeatureRange, TypeInfo, TypeSystem};
use super::type_code::TypeCode;
use crate::cas_error::CasIndexError;

/// Name of the root type.
pub const TOP_TYPE_NAME: &str = "TOP";
/// Name of the built-in annotation type added by
/// [`TypeSystemBuilder::with_annotation_type`].
pub const ANNOTATION_TYPE_NAME: &str = "Annotation";
/// Start offset feature of the annotation type.
pub const BEGIN_FEATURE: &str = "begin";
/// End offset feature of the annotation type.
pub const END_FEATURE: &str = "end";

#[derive(Clone, Debug)]
struct DeclaredType {
    name: String,
    supertype: Option<TypeCode>,
    features: Vec<(String, FeatureRange)>,
}

/// Collects type and feature declarations.
///
/// Types may be declared in any order as long as a supertype exists before
/// its subtypes. Feature slots are laid out at commit time: inherited
/// features first, then the type's own, so a feature keeps the same slot in
/// every subtype.
#[derive(Clone, Debug)]
pub struct TypeSystemBuilder {
    types: Vec<DeclaredType>,
    by_name: HashMap<String, TypeCode>,
    priorities: Vec<TypeCode>,
}

impl Default for TypeSystemBuilder {
    fn default() -> Self {
        let mut by_name = HashMap::new();
        by_name.insert(TOP_TYPE_NAME.to_string(), TypeCode::TOP);
        Self {
            types: vec![DeclaredType {
                name: TOP_TYPE_NAME.to_string(),
                supertype: None,
                features: Vec::new(),
            }],
            by_name,
            priorities: Vec::new(),
        }
    }
}

impl TypeSystemBuilder {
    /// A builder holding only the `TOP` type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new type below `supertype`.
    ///
    /// # Errors
    /// [`CasIndexError::DuplicateType`] if the name is taken,
    /// [`CasIndexError::InvalidTypeCode`] if `supertype` was not declared here.
    pub fn add_type(&mut self, name: &str, supertype: TypeCode) -> Result<TypeCode, CasIndexError> {
        if self.by_name.contains_key(name) {
            return Err(CasIndexError::DuplicateType(name.to_string()));
        }
        if supertype.index() >= self.types.len() {
            return Err(CasIndexError::InvalidTypeCode(supertype.get()));
        }
        let code = TypeCode::from_index(self.types.len());
        self.types.push(DeclaredType {
            name: name.to_string(),
            supertype: Some(supertype),
            features: Vec::new(),
        });
        self.by_name.insert(name.to_string(), code);
        Ok(code)
    }

    /// Declare a feature on `ty`. It is inherited by every subtype.
    pub fn add_feature(
        &mut self,
        ty: TypeCode,
        name: &str,
        range: FeatureRange,
    ) -> Result<(), CasIndexError> {
        let decl = self
            .types
            .get_mut(ty.index())
            .ok_or(CasIndexError::InvalidTypeCode(ty.get()))?;
        if decl.features.iter().any(|(n, _)| n == name) {
            return Err(CasIndexError::DuplicateFeature {
                ty: decl.name.clone(),
                feature: name.to_string(),
            });
        }
        decl.features.push((name.to_string(), range));
        Ok(())
    }

    /// Look up a declared type by name.
    pub fn type_code(&self, name: &str) -> Option<TypeCode> {
        self.by_name.get(name).copied()
    }

    /// Declare the built-in `Annotation` type with integer `begin`/`end`
    /// features, returning its code. Idempotent.
    pub fn with_annotation_type(&mut self) -> Result<TypeCode, CasIndexError> {
        if let Some(t) = self.type_code(ANNOTATION_TYPE_NAME) {
            return Ok(t);
        }
        let t = self.add_type(ANNOTATION_TYPE_NAME, TypeCode::TOP)?;
        self.add_feature(t, BEGIN_FEATURE, FeatureRange::Int)?;
        self.add_feature(t, END_FEATURE, FeatureRange::Int)?;
        Ok(t)
    }

    /// Give the listed types the highest priorities, in list order. Types
    /// not listed follow in hierarchy pre-order.
    pub fn set_type_priorities(&mut self, order: Vec<TypeCode>) {
        self.priorities = order;
    }

    /// Freeze the declarations into an immutable, shareable [`TypeSystem`].
    ///
    /// # Errors
    /// [`CasIndexError::DuplicateFeature`] if a type redeclares an inherited
    /// feature, [`CasIndexError::InvalidTypePriorities`] for an unknown or
    /// repeated type in the priority list.
    pub fn commit(self) -> Result<Arc<TypeSystem>, CasIndexError> {
        let n = self.types.len();
        let mut children: Vec<Vec<TypeCode>> = vec![Vec::new(); n];
        for (i, decl) in self.types.iter().enumerate() {
            if let Some(sup) = decl.supertype {
                children[sup.index()].push(TypeCode::from_index(i));
            }
        }

        // pre-order numbering: subtree of t = preorder[pre[t]..end[t]]
        let mut preorder = Vec::with_capacity(n);
        let mut pre = vec![0usize; n];
        let mut end = vec![0usize; n];
        let mut stack = vec![(TypeCode::TOP, false)];
        while let Some((t, done)) = stack.pop() {
            if done {
                end[t.index()] = preorder.len();
                continue;
            }
            pre[t.index()] = preorder.len();
            preorder.push(t);
            stack.push((t, true));
            for &c in children[t.index()].iter().rev() {
                stack.push((c, false));
            }
        }

        // feature layout, parents before children
        let mut features: Vec<Vec<FeatureInfo>> = vec![Vec::new(); n];
        for &t in &preorder {
            let decl = &self.types[t.index()];
            let mut feats = match decl.supertype {
                Some(sup) => features[sup.index()].clone(),
                None => Vec::new(),
            };
            for (name, range) in &decl.features {
                if feats.iter().any(|f| &f.name == name) {
                    return Err(CasIndexError::DuplicateFeature {
                        ty: decl.name.clone(),
                        feature: name.clone(),
                    });
                }
                feats.push(FeatureInfo {
                    name: name.clone(),
                    range: *range,
                    slot: feats.len(),
                    declared_on: t,
                });
            }
            features[t.index()] = feats;
        }

        let mut priority = vec![0u32; n];
        let mut seen = HashSet::new();
        let mut rank = 0u32;
        for &t in &self.priorities {
            if t.index() >= n {
                return Err(CasIndexError::InvalidTypePriorities(format!(
                    "unknown type code {t}"
                )));
            }
            if !seen.insert(t) {
                return Err(CasIndexError::InvalidTypePriorities(format!(
                    "type `{}` listed twice",
                    self.types[t.index()].name
                )));
            }
            priority[t.index()] = rank;
            rank += 1;
        }
        for &t in &preorder {
            if !seen.contains(&t) {
                priority[t.index()] = rank;
                rank += 1;
            }
        }

        let types = self
            .types
            .into_iter()
            .zip(children)
            .zip(features)
            .enumerate()
            .map(|(i, ((decl, direct_subtypes), features))| TypeInfo {
                code: TypeCode::from_index(i),
                name: decl.name,
                supertype: decl.supertype,
                direct_subtypes,
                features,
            })
            .collect();

        log::debug!("committed type system with {n} types");
        Ok(Arc::new(TypeSystem::from_parts(
            types,
            self.by_name,
            preorder,
            pre,
            end,
            priority,
        )))
    }
}
