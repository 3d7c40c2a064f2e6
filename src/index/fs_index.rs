//! One registered index: a definition plus one store per covered type.
//!
//! Every covered type (the index type and each of its subtypes) gets its own
//! leaf store, holding only structures of exactly that type. Iterating a
//! type without subtypes walks one leaf; with subtypes the leaves of the
//! whole subtree are combined: merged for sorted indexes, visited one after
//! another for set and bag indexes.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use super::bag::BagStore;
use super::comparator::FsComparator;
use super::cow::SnapshotSource;
use super::ordered_set::{OrderedFsSet, Uniqueness};
use super::{IndexDefinition, IndexKind};
use crate::cas_error::CasIndexError;
use crate::config::IndexConfig;
use crate::fs::{FeatureStructure, FsRef};
use crate::iterator::{
    BagIndexIterator, FsIterator, MergeIterator, SortedIndexIterator, UnorderedIterator,
};
use crate::type_system::{TypeCode, TypeSystem};

/// Store for one exact type, shared with the iterators walking it.
#[derive(Clone, Debug)]
pub(crate) enum Leaf {
    Ordered(Arc<RwLock<OrderedFsSet>>),
    Bag(Arc<RwLock<BagStore>>),
}

impl Leaf {
    fn insert(&self, fs: FsRef) -> Result<bool, CasIndexError> {
        match self {
            Leaf::Ordered(set) => set.write().insert(fs),
            Leaf::Bag(bag) => bag.write().insert(fs),
        }
    }

    fn remove(&self, fs: &FeatureStructure) -> bool {
        match self {
            Leaf::Ordered(set) => set.write().remove(fs),
            Leaf::Bag(bag) => bag.write().remove(fs),
        }
    }

    fn contains(&self, fs: &FeatureStructure) -> bool {
        match self {
            Leaf::Ordered(set) => set.read().contains(fs),
            Leaf::Bag(bag) => bag.read().contains(fs),
        }
    }

    fn len(&self) -> usize {
        match self {
            Leaf::Ordered(set) => set.read().len(),
            Leaf::Bag(bag) => bag.read().len(),
        }
    }

    fn clear(&self) {
        match self {
            Leaf::Ordered(set) => set.write().clear(),
            Leaf::Bag(bag) => bag.write().clear(),
        }
    }

    fn iterator(&self) -> FsIterator {
        match self {
            Leaf::Ordered(set) => FsIterator::Sorted(SortedIndexIterator::new(Arc::clone(set))),
            Leaf::Bag(bag) => FsIterator::Bag(BagIndexIterator::new(Arc::clone(bag))),
        }
    }
}

/// A registered index bound to one view.
#[derive(Debug)]
pub struct FsIndex {
    definition: IndexDefinition,
    ts: Arc<TypeSystem>,
    /// Covered types in pre-order, index type first.
    leaves: Vec<(TypeCode, Leaf)>,
    position: HashMap<TypeCode, usize>,
}

impl FsIndex {
    /// Create empty leaf stores for the index type and all its subtypes.
    pub fn new(definition: IndexDefinition, config: &IndexConfig) -> Result<Self, CasIndexError> {
        let ts = Arc::clone(definition.comparator().type_system());
        let covered = ts.subtypes_inclusive(definition.type_code())?;
        let mut leaves = Vec::with_capacity(covered.len());
        let mut position = HashMap::with_capacity(covered.len());
        for &ty in covered {
            let leaf = match definition.kind() {
                IndexKind::Sorted | IndexKind::Set => {
                    let cmp = Arc::clone(definition.comparator());
                    let uniqueness = match definition.kind() {
                        IndexKind::Set => Uniqueness::KeyUnique(
                            definition
                                .duplicate_policy()
                                .unwrap_or(config.duplicate_policy),
                        ),
                        _ => Uniqueness::Sorted,
                    };
                    Leaf::Ordered(Arc::new(RwLock::new(OrderedFsSet::with_capacity(
                        cmp,
                        uniqueness,
                        config.initial_capacity,
                    ))))
                }
                IndexKind::Bag => Leaf::Bag(Arc::new(RwLock::new(BagStore::new(
                    Arc::new(FsComparator::identity(&ts, ty)),
                    config.bag_promotion_threshold,
                )))),
            };
            position.insert(ty, leaves.len());
            leaves.push((ty, leaf));
        }
        log::debug!(
            "defined {:?} index `{}` over `{}` ({} leaf stores)",
            definition.kind(),
            definition.label(),
            ts.name(definition.type_code()),
            leaves.len()
        );
        Ok(Self {
            definition,
            ts,
            leaves,
            position,
        })
    }

    #[inline]
    pub fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    #[inline]
    pub fn label(&self) -> &str {
        self.definition.label()
    }

    #[inline]
    pub fn kind(&self) -> IndexKind {
        self.definition.kind()
    }

    #[inline]
    pub fn type_code(&self) -> TypeCode {
        self.definition.type_code()
    }

    /// `true` if structures of type `ty` belong in this index.
    #[inline]
    pub fn covers(&self, ty: TypeCode) -> bool {
        self.position.contains_key(&ty)
    }

    fn leaf(&self, ty: TypeCode) -> Result<&Leaf, CasIndexError> {
        self.position
            .get(&ty)
            .map(|&i| &self.leaves[i].1)
            .ok_or_else(|| self.not_covered(ty))
    }

    fn not_covered(&self, ty: TypeCode) -> CasIndexError {
        CasIndexError::TypeNotInIndex {
            index: self.label().to_string(),
            ty: self.ts.name(ty).to_string(),
        }
    }

    /// Leaves of `ty` (and its subtypes, if asked), in pre-order.
    fn leaves_for(&self, ty: TypeCode, include_subtypes: bool) -> Result<&[(TypeCode, Leaf)], CasIndexError> {
        let start = *self.position.get(&ty).ok_or_else(|| self.not_covered(ty))?;
        let count = if include_subtypes {
            self.ts.subtypes_inclusive(ty)?.len()
        } else {
            1
        };
        Ok(&self.leaves[start..start + count])
    }

    /// Add `fs` to the leaf of its type.
    pub fn add(&self, fs: FsRef) -> Result<bool, CasIndexError> {
        if !fs.built_for(&self.ts) {
            return Err(CasIndexError::ForeignTypeSystem(format!("FS {}", fs.id().get())));
        }
        self.leaf(fs.type_code())?.insert(fs)
    }

    /// Remove this exact structure.
    pub fn remove(&self, fs: &FeatureStructure) -> bool {
        self.leaf(fs.type_code()).is_ok_and(|leaf| leaf.remove(fs))
    }

    pub fn contains(&self, fs: &FeatureStructure) -> bool {
        self.leaf(fs.type_code()).is_ok_and(|leaf| leaf.contains(fs))
    }

    /// Number of structures over all covered types.
    pub fn size(&self) -> usize {
        self.leaves.iter().map(|(_, leaf)| leaf.len()).sum()
    }

    /// Number of structures of `ty` (and subtypes, if asked).
    pub fn size_of(&self, ty: TypeCode, include_subtypes: bool) -> Result<usize, CasIndexError> {
        Ok(self
            .leaves_for(ty, include_subtypes)?
            .iter()
            .map(|(_, leaf)| leaf.len())
            .sum())
    }

    /// Empty every leaf. Live iterators keep their snapshots.
    pub fn clear(&self) {
        for (_, leaf) in &self.leaves {
            leaf.clear();
        }
    }

    /// Iterator over the index type, positioned at the first element.
    pub fn iterator(&self, include_subtypes: bool) -> Result<FsIterator, CasIndexError> {
        self.iterator_for(self.type_code(), include_subtypes)
    }

    /// Iterator over `ty`, which must be covered by this index.
    pub fn iterator_for(
        &self,
        ty: TypeCode,
        include_subtypes: bool,
    ) -> Result<FsIterator, CasIndexError> {
        let leaves = self.leaves_for(ty, include_subtypes)?;
        if let [(_, leaf)] = leaves {
            return Ok(leaf.iterator());
        }
        match self.kind() {
            IndexKind::Sorted => {
                let subs = leaves
                    .iter()
                    .filter_map(|(_, leaf)| match leaf {
                        Leaf::Ordered(set) => Some(SortedIndexIterator::new(Arc::clone(set))),
                        Leaf::Bag(_) => None,
                    })
                    .collect();
                Ok(FsIterator::Merge(MergeIterator::new(subs)?))
            }
            IndexKind::Set | IndexKind::Bag => {
                let subs = leaves.iter().map(|(_, leaf)| leaf.iterator()).collect();
                Ok(FsIterator::Unordered(UnorderedIterator::new(
                    subs,
                    Arc::clone(self.definition.comparator()),
                    self.kind(),
                )))
            }
        }
    }
}
