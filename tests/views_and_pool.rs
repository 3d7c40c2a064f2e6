use std::sync::Arc;

use cas_index::config::IndexSpec;
use cas_index::prelude::*;

fn type_system() -> (Arc<TypeSystem>, TypeCode) {
    let mut b = TypeSystemBuilder::new();
    let ann = b.with_annotation_type().unwrap();
    let entity = b.add_type("Entity", ann).unwrap();
    b.add_feature(entity, "label", FeatureRange::Str).unwrap();
    (b.commit().unwrap(), entity)
}

fn definitions(ts: &Arc<TypeSystem>) -> Vec<IndexDefinition> {
    let specs: Vec<IndexSpec> = serde_json::from_str(
        r#"[
            {"label": "EntityByLabel", "type_name": "Entity", "kind": "Set",
             "keys": [{"Feature": {"name": "label"}}], "duplicate_policy": "Replace"},
            {"label": "Entities", "type_name": "Entity", "kind": "Bag"}
        ]"#,
    )
    .unwrap();
    let mut defs: Vec<IndexDefinition> = specs.iter().map(|s| s.resolve(ts).unwrap()).collect();
    defs.push(IndexDefinition::annotation_index(ts).unwrap());
    defs
}

fn entity(cas: &mut Cas, ty: TypeCode, label: &str) -> FsRef {
    cas.create_fs(ty)
        .unwrap()
        .with_str("label", label)
        .unwrap()
        .build()
}

#[test]
fn replace_policy_keeps_the_latest_key_equal_structure() {
    let (ts, ty) = type_system();
    let mut cas = Cas::new(&ts, definitions(&ts)).unwrap();
    let first = entity(&mut cas, ty, "PER");
    let second = entity(&mut cas, ty, "PER");
    cas.add_fs(Arc::clone(&first)).unwrap();
    cas.add_fs(Arc::clone(&second)).unwrap();

    let repo = cas.initial_view().indexes();
    assert_eq!(repo.size("EntityByLabel").unwrap(), 1);
    assert_eq!(repo.size("Entities").unwrap(), 2);
    let it = repo.iterator("EntityByLabel", false).unwrap();
    assert_eq!(it.get().unwrap().id(), second.id());
    assert!(it.comparator().is_some());
    assert!(repo.iterator("Entities", false).unwrap().comparator().is_none());
}

#[test]
fn views_share_definitions_but_not_contents() {
    let (ts, ty) = type_system();
    let mut cas = Cas::new(&ts, definitions(&ts)).unwrap();
    cas.create_view("gold").unwrap();
    let e = entity(&mut cas, ty, "ORG");
    cas.view("gold").unwrap().add_fs(Arc::clone(&e)).unwrap();

    let labels: Vec<&str> = cas.view("gold").unwrap().indexes().labels().collect();
    assert_eq!(labels, vec!["EntityByLabel", "Entities", ANNOTATION_INDEX]);
    assert!(!cas.initial_view().indexes().contains(&e));
    assert!(cas.view("gold").unwrap().indexes().contains(&e));
}

#[test]
fn pooled_cas_comes_back_empty() {
    let (ts, ty) = type_system();
    let pool = CasPool::new(2, &ts, &definitions(&ts), &IndexConfig::default()).unwrap();
    let mut a = pool.checkout().unwrap();
    let b = pool.checkout().unwrap();
    assert!(pool.checkout().is_none());

    let e = entity(&mut a, ty, "LOC");
    a.add_fs(e).unwrap();
    let used = a.allocated_ids();
    pool.release(a).unwrap();
    pool.release(b).unwrap();
    assert_eq!(pool.available(), 2);

    // whichever instance comes out first, it holds nothing
    for _ in 0..2 {
        let cas = pool.checkout().unwrap();
        assert!(cas.initial_view().indexes().is_empty());
        assert!(cas.allocated_ids() == 0 || cas.allocated_ids() == used);
    }
}
