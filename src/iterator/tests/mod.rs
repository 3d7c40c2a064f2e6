use std::sync::Arc;

use crate::config::IndexConfig;
use crate::fs::{FsBuilder, FsId, FsRef};
use crate::index::{FsComparator, FsIndex, IndexDefinition, KeyOrder};
use crate::type_system::{TypeCode, TypeSystem, TypeSystemBuilder};

#[path = "merge_property_tests.rs"]
mod merge_property_tests;

/// `Annotation` with three subtypes, `Token` having one of its own.
struct World {
    ts: Arc<TypeSystem>,
    ann: TypeCode,
    /// Ann, Token, Word, Sentence, in declaration order.
    types: Vec<TypeCode>,
}

impl World {
    fn new() -> Self {
        let mut b = TypeSystemBuilder::new();
        let ann = b.with_annotation_type().unwrap();
        let token = b.add_type("Token", ann).unwrap();
        let word = b.add_type("Word", token).unwrap();
        let sentence = b.add_type("Sentence", ann).unwrap();
        Self {
            ts: b.commit().unwrap(),
            ann,
            types: vec![ann, token, word, sentence],
        }
    }

    fn fs(&self, id: u64, ty: usize, begin: i64) -> FsRef {
        FsBuilder::new(&self.ts, FsId::new(id).unwrap(), self.types[ty])
            .unwrap()
            .with_int("begin", begin)
            .unwrap()
            .build()
    }

    fn by_begin(&self) -> FsComparator {
        FsComparator::builder(&self.ts, self.ann)
            .key("begin", KeyOrder::Standard)
            .build()
            .unwrap()
    }

    fn sorted_index(&self) -> FsIndex {
        FsIndex::new(
            IndexDefinition::sorted("ByBegin", self.by_begin()),
            &IndexConfig::default(),
        )
        .unwrap()
    }

    fn set_index(&self) -> FsIndex {
        FsIndex::new(
            IndexDefinition::set("UniqueBegin", self.by_begin()),
            &IndexConfig::default(),
        )
        .unwrap()
    }

    fn bag_index(&self, threshold: usize) -> FsIndex {
        let cfg = IndexConfig {
            bag_promotion_threshold: threshold,
            ..Default::default()
        };
        FsIndex::new(IndexDefinition::bag("All", &self.ts, self.ann), &cfg).unwrap()
    }
}

fn ids(v: &[FsRef]) -> Vec<u64> {
    v.iter().map(|fs| fs.id().get()).collect()
}
