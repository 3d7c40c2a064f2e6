//! Index repository: the set of indexes registered on one view.
//!
//! Besides the user-defined indexes the repository keeps a bag over `TOP`
//! holding every structure added to the view. It answers "is this indexed?",
//! feeds indexes defined after structures were added, and backs
//! [`IndexRepository::all_indexed`].

use std::sync::Arc;

use hashbrown::HashMap;

use crate::cas_error::CasIndexError;
use crate::config::IndexConfig;
use crate::fs::{FeatureStructure, FsRef};
use crate::index::{FsIndex, IndexDefinition};
use crate::iterator::{FsIterator, FsPredicate};
use crate::type_system::{TypeCode, TypeSystem};

const ALL_FS: &str = "_all";

#[derive(Debug)]
pub struct IndexRepository {
    ts: Arc<TypeSystem>,
    config: IndexConfig,
    indexes: Vec<FsIndex>,
    by_label: HashMap<String, usize>,
    all: FsIndex,
}

impl IndexRepository {
    /// Empty repository with the default configuration.
    pub fn new(ts: &Arc<TypeSystem>) -> Result<Self, CasIndexError> {
        Self::with_config(ts, IndexConfig::default())
    }

    pub fn with_config(ts: &Arc<TypeSystem>, config: IndexConfig) -> Result<Self, CasIndexError> {
        let all = FsIndex::new(IndexDefinition::bag(ALL_FS, ts, ts.top()), &config)?;
        Ok(Self {
            ts: Arc::clone(ts),
            config,
            indexes: Vec::new(),
            by_label: HashMap::new(),
            all,
        })
    }

    #[inline]
    pub fn type_system(&self) -> &Arc<TypeSystem> {
        &self.ts
    }

    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Register an index. Structures already in the repository are added to
    /// it.
    ///
    /// # Errors
    /// [`CasIndexError::DuplicateIndexLabel`] if the label is taken,
    /// [`CasIndexError::ForeignTypeSystem`] if the definition's comparator was
    /// built against another type system.
    pub fn define_index(&mut self, definition: IndexDefinition) -> Result<&FsIndex, CasIndexError> {
        if self.by_label.contains_key(definition.label()) {
            return Err(CasIndexError::DuplicateIndexLabel(
                definition.label().to_string(),
            ));
        }
        if !Arc::ptr_eq(definition.comparator().type_system(), &self.ts) {
            return Err(CasIndexError::ForeignTypeSystem(
                definition.label().to_string(),
            ));
        }
        let index = FsIndex::new(definition, &self.config)?;
        let mut existing = self.all.iterator_for(index.type_code(), true)?;
        for fs in existing.to_vec() {
            index.add(fs)?;
        }
        let slot = self.indexes.len();
        self.by_label.insert(index.label().to_string(), slot);
        self.indexes.push(index);
        Ok(&self.indexes[slot])
    }

    /// Labels in definition order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.indexes.iter().map(FsIndex::label)
    }

    pub fn indexes(&self) -> &[FsIndex] {
        &self.indexes
    }

    /// The index registered under `label`.
    pub fn index(&self, label: &str) -> Result<&FsIndex, CasIndexError> {
        self.by_label
            .get(label)
            .map(|&i| &self.indexes[i])
            .ok_or_else(|| CasIndexError::UnknownIndex(label.to_string()))
    }

    fn check_type_system(&self, fs: &FeatureStructure) -> Result<(), CasIndexError> {
        if !fs.built_for(&self.ts) {
            return Err(CasIndexError::ForeignTypeSystem(format!("FS {}", fs.id().get())));
        }
        self.ts.info(fs.type_code()).map(|_| ())
    }

    /// Add `fs` to every index covering its type.
    ///
    /// Returns `false` (and changes nothing) if `fs` is already in the
    /// repository.
    pub fn add_fs(&self, fs: FsRef) -> Result<bool, CasIndexError> {
        self.check_type_system(&fs)?;
        if !self.all.add(Arc::clone(&fs))? {
            return Ok(false);
        }
        for index in self.indexes.iter().filter(|ix| ix.covers(fs.type_code())) {
            if let Err(e) = index.add(Arc::clone(&fs)) {
                // undo the partial add
                for ix in &self.indexes {
                    ix.remove(&fs);
                }
                self.all.remove(&fs);
                return Err(e);
            }
        }
        Ok(true)
    }

    /// Remove `fs` from every index. Returns `false` if it was not added.
    pub fn remove_fs(&self, fs: &FeatureStructure) -> bool {
        if !self.all.remove(fs) {
            return false;
        }
        for index in self.indexes.iter().filter(|ix| ix.covers(fs.type_code())) {
            index.remove(fs);
        }
        true
    }

    /// `true` if `fs` was added and not removed since.
    pub fn contains(&self, fs: &FeatureStructure) -> bool {
        self.all.contains(fs)
    }

    /// Remove every structure of `ty` (and its subtypes, if asked). Returns
    /// the number removed.
    pub fn remove_all_of_type(
        &self,
        ty: TypeCode,
        include_subtypes: bool,
    ) -> Result<usize, CasIndexError> {
        let doomed = self.all.iterator_for(ty, include_subtypes)?.to_vec();
        for fs in &doomed {
            self.remove_fs(fs);
        }
        log::debug!(
            "removed {} structures of `{}`{}",
            doomed.len(),
            self.ts.name(ty),
            if include_subtypes { " and subtypes" } else { "" }
        );
        Ok(doomed.len())
    }

    /// Iterator over the index type of `label`.
    pub fn iterator(&self, label: &str, include_subtypes: bool) -> Result<FsIterator, CasIndexError> {
        self.index(label)?.iterator(include_subtypes)
    }

    /// Iterator over `ty` in the index `label`.
    pub fn iterator_for(
        &self,
        label: &str,
        ty: TypeCode,
        include_subtypes: bool,
    ) -> Result<FsIterator, CasIndexError> {
        self.index(label)?.iterator_for(ty, include_subtypes)
    }

    /// [`Self::iterator_for`] restricted to elements accepted by `predicate`.
    pub fn filtered_iterator(
        &self,
        label: &str,
        ty: TypeCode,
        include_subtypes: bool,
        predicate: FsPredicate,
    ) -> Result<FsIterator, CasIndexError> {
        Ok(self
            .iterator_for(label, ty, include_subtypes)?
            .filtered(predicate))
    }

    /// Every structure of `ty` (and subtypes, if asked) in the repository,
    /// whatever indexes hold it. Ascending id within each type.
    pub fn all_indexed(&self, ty: TypeCode, include_subtypes: bool) -> Result<FsIterator, CasIndexError> {
        self.all.iterator_for(ty, include_subtypes)
    }

    /// Number of structures in the index `label`.
    pub fn size(&self, label: &str) -> Result<usize, CasIndexError> {
        Ok(self.index(label)?.size())
    }

    /// Number of structures added to the repository.
    pub fn len(&self) -> usize {
        self.all.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty every index. Definitions stay registered; live iterators keep
    /// the snapshot they were walking.
    pub fn reset(&self) {
        for index in &self.indexes {
            index.clear();
        }
        self.all.clear();
        log::debug!("reset repository ({} indexes)", self.indexes.len());
    }
}
