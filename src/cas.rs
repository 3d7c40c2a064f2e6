//! The common analysis structure: a type system, an id allocator and a set
//! of named views, each with its own index repository.
//!
//! Every view registers the same index definitions. Structures are created
//! once on the CAS and may be added to any number of views.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::cas_error::CasIndexError;
use crate::config::IndexConfig;
use crate::fs::{FeatureStructure, FsBuilder, FsIdAllocator, FsRef};
use crate::index::IndexDefinition;
use crate::iterator::FsIterator;
use crate::repository::IndexRepository;
use crate::type_system::{TypeCode, TypeSystem};

/// Name of the view every CAS starts with.
pub const INITIAL_VIEW: &str = "_InitialView";

/// A named view and its indexes.
#[derive(Debug)]
pub struct View {
    name: String,
    indexes: IndexRepository,
}

impl View {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn indexes(&self) -> &IndexRepository {
        &self.indexes
    }

    pub fn add_fs(&self, fs: FsRef) -> Result<bool, CasIndexError> {
        self.indexes.add_fs(fs)
    }

    pub fn remove_fs(&self, fs: &FeatureStructure) -> bool {
        self.indexes.remove_fs(fs)
    }
}

#[derive(Debug)]
pub struct Cas {
    ts: Arc<TypeSystem>,
    config: IndexConfig,
    definitions: Vec<IndexDefinition>,
    ids: FsIdAllocator,
    views: Vec<View>,
    by_name: HashMap<String, usize>,
}

impl Cas {
    /// New CAS whose views register `definitions`.
    ///
    /// # Errors
    /// Any error [`IndexRepository::define_index`] reports for a definition.
    pub fn new(
        ts: &Arc<TypeSystem>,
        definitions: Vec<IndexDefinition>,
    ) -> Result<Self, CasIndexError> {
        Self::with_config(ts, definitions, IndexConfig::default())
    }

    pub fn with_config(
        ts: &Arc<TypeSystem>,
        definitions: Vec<IndexDefinition>,
        config: IndexConfig,
    ) -> Result<Self, CasIndexError> {
        let mut cas = Self {
            ts: Arc::clone(ts),
            config,
            definitions,
            ids: FsIdAllocator::default(),
            views: Vec::new(),
            by_name: HashMap::new(),
        };
        cas.create_view(INITIAL_VIEW)?;
        Ok(cas)
    }

    #[inline]
    pub fn type_system(&self) -> &Arc<TypeSystem> {
        &self.ts
    }

    #[inline]
    pub fn definitions(&self) -> &[IndexDefinition] {
        &self.definitions
    }

    /// Start a structure of type `ty` with a fresh id.
    pub fn create_fs(&mut self, ty: TypeCode) -> Result<FsBuilder, CasIndexError> {
        self.ts.info(ty)?;
        let id = self.ids.allocate()?;
        FsBuilder::new(&self.ts, id, ty)
    }

    /// Add a view registering this CAS's index definitions.
    pub fn create_view(&mut self, name: &str) -> Result<&View, CasIndexError> {
        if self.by_name.contains_key(name) {
            return Err(CasIndexError::DuplicateView(name.to_string()));
        }
        let mut indexes = IndexRepository::with_config(&self.ts, self.config.clone())?;
        for def in &self.definitions {
            indexes.define_index(def.clone())?;
        }
        log::debug!("created view `{name}` with {} indexes", self.definitions.len());
        let slot = self.views.len();
        self.by_name.insert(name.to_string(), slot);
        self.views.push(View {
            name: name.to_string(),
            indexes,
        });
        Ok(&self.views[slot])
    }

    pub fn view(&self, name: &str) -> Result<&View, CasIndexError> {
        self.by_name
            .get(name)
            .map(|&i| &self.views[i])
            .ok_or_else(|| CasIndexError::UnknownView(name.to_string()))
    }

    /// The initial view, which exists for the whole life of the CAS.
    pub fn initial_view(&self) -> &View {
        &self.views[0]
    }

    /// Views in creation order.
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.iter()
    }

    /// Add `fs` to the initial view.
    pub fn add_fs(&self, fs: FsRef) -> Result<bool, CasIndexError> {
        self.initial_view().add_fs(fs)
    }

    /// Remove `fs` from the initial view.
    pub fn remove_fs(&self, fs: &FeatureStructure) -> bool {
        self.initial_view().remove_fs(fs)
    }

    /// Iterator over `label` in the initial view.
    pub fn iterator(&self, label: &str, include_subtypes: bool) -> Result<FsIterator, CasIndexError> {
        self.initial_view().indexes().iterator(label, include_subtypes)
    }

    /// Number of ids handed out so far.
    pub fn allocated_ids(&self) -> u64 {
        self.ids.allocated()
    }

    /// Drop every view but the initial one and empty its indexes. Ids keep
    /// counting from where they were, so structures from before the reset
    /// never collide with new ones.
    pub fn reset(&mut self) {
        self.views.truncate(1);
        self.by_name.retain(|_, slot| *slot == 0);
        self.views[0].indexes.reset();
        log::debug!("reset CAS ({} ids allocated)", self.ids.allocated());
    }
}
