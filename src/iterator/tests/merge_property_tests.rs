use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{World, ids};
use crate::cas_error::CasIndexError;
use crate::config::IndexConfig;
use crate::fs::{FeatureStructure, FsRef};
use crate::index::{FsComparator, FsIndex, IndexDefinition, KeyOrder};
use crate::iterator::{ComparableIterator, FsIterator, LowLevelIterator, MergeIterator};

/// (type slot, begin) pairs; ids are assigned 1.. in order.
fn entries() -> impl Strategy<Value = Vec<(usize, i64)>> {
    prop::collection::vec((0usize..4, 0i64..6), 0..40)
}

fn populate(world: &World, entries: &[(usize, i64)]) -> (crate::index::FsIndex, Vec<FsRef>) {
    let index = world.sorted_index();
    let mut all = Vec::new();
    for (i, &(ty, begin)) in entries.iter().enumerate() {
        let fs = world.fs(i as u64 + 1, ty, begin);
        index.add(fs.clone()).unwrap();
        all.push(fs);
    }
    (index, all)
}

fn reference(world: &World, all: &[FsRef]) -> Vec<u64> {
    let mut v: Vec<(i64, u64)> = all
        .iter()
        .map(|fs| (fs.int(&world.ts, "begin").unwrap(), fs.id().get()))
        .collect();
    v.sort_unstable();
    v.into_iter().map(|(_, id)| id).collect()
}

proptest! {
    #[test]
    fn merged_iteration_is_key_then_id(entries in entries()) {
        let world = World::new();
        let (index, all) = populate(&world, &entries);
        let mut it = index.iterator(true).unwrap();
        prop_assert_eq!(ids(&it.to_vec()), reference(&world, &all));
    }

    #[test]
    fn backward_is_reverse_of_forward(entries in entries()) {
        let world = World::new();
        let (index, _) = populate(&world, &entries);
        let mut it = index.iterator(true).unwrap();
        let forward = ids(&it.to_vec());
        let mut backward = Vec::new();
        it.move_to_last();
        while it.is_valid() {
            backward.push(it.get_nvc().id().get());
            it.move_to_previous();
        }
        backward.reverse();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn single_type_iteration_skips_subtypes(entries in entries(), ty in 0usize..4) {
        let world = World::new();
        let (index, all) = populate(&world, &entries);
        let own: Vec<FsRef> = all
            .iter()
            .filter(|fs| fs.type_code() == world.types[ty])
            .cloned()
            .collect();
        let mut it = index.iterator_for(world.types[ty], false).unwrap();
        prop_assert_eq!(ids(&it.to_vec()), reference(&world, &own));
    }

    #[test]
    fn filtered_iteration_only_visits_accepted(entries in entries(), m in 1i64..4) {
        let world = World::new();
        let (index, all) = populate(&world, &entries);
        let ts = world.ts.clone();
        let accepted: Vec<FsRef> = all
            .iter()
            .filter(|fs| fs.int(&ts, "begin").unwrap() % m == 0)
            .cloned()
            .collect();
        let pred_ts = ts.clone();
        let mut it = index
            .iterator(true)
            .unwrap()
            .filtered(std::sync::Arc::new(move |fs: &FeatureStructure| {
                fs.int(&pred_ts, "begin").map(|b| b % m == 0).unwrap_or(false)
            }));
        prop_assert_eq!(ids(&it.to_vec()), reference(&world, &accepted));
        it.move_to_last();
        while it.is_valid() {
            prop_assert_eq!(it.get_nvc().int(&ts, "begin").unwrap() % m, 0);
            it.move_to_previous();
        }
    }
}

/// Random next/previous walks over a merge agree with the reference order,
/// including across direction changes.
#[test]
fn random_walks_match_reference() {
    let mut rng = SmallRng::seed_from_u64(42);
    for _ in 0..50 {
        let world = World::new();
        let n = rng.gen_range(1..30);
        let entries: Vec<(usize, i64)> = (0..n)
            .map(|_| (rng.gen_range(0..4), rng.gen_range(0..5)))
            .collect();
        let (index, all) = populate(&world, &entries);
        let want = reference(&world, &all);

        let mut it = index.iterator(true).unwrap();
        let mut pos = 0usize;
        for _ in 0..60 {
            assert!(it.is_valid());
            assert_eq!(it.get_nvc().id().get(), want[pos]);
            if rng.gen_bool(0.5) {
                it.move_to_next();
                if pos + 1 == want.len() {
                    assert!(!it.is_valid());
                    break;
                }
                pos += 1;
            } else {
                it.move_to_previous();
                if pos == 0 {
                    assert!(!it.is_valid());
                    break;
                }
                pos -= 1;
            }
        }
    }
}

#[test]
fn move_to_positions_merge_at_leftmost_key() {
    let world = World::new();
    let (index, _) = populate(&world, &[(1, 3), (0, 1), (3, 3), (2, 5), (0, 3)]);
    let mut it = index.iterator(true).unwrap();
    it.move_to(&world.fs(99, 0, 3));
    let rest = ids(&it.copy().forward().collect::<Vec<_>>());
    assert_eq!(rest, vec![1, 3, 5, 4]);
    it.move_to(&world.fs(99, 0, 6));
    assert!(!it.is_valid());
}

#[test]
fn merged_iterators_compare_by_position() {
    let world = World::new();
    let (index, _) = populate(&world, &[(1, 2), (3, 2), (0, 7)]);
    let a = index.iterator(true).unwrap();
    let mut b = a.copy();
    b.move_to_next();
    assert_eq!(a.compare_to(&b), Ok(std::cmp::Ordering::Less));
    let FsIterator::Merge(m) = &a else {
        panic!("expected a merge iterator, got {a:?}");
    };
    assert_eq!(m.width(), 4);
    assert!(m.compare_to(m).unwrap().is_eq());
}

#[test]
fn merge_over_different_orderings_fails_fast() {
    let world = World::new();
    let by_begin = world.sorted_index();
    let by_end = FsIndex::new(
        IndexDefinition::sorted(
            "ByEnd",
            FsComparator::builder(&world.ts, world.ann)
                .key("end", KeyOrder::Standard)
                .build()
                .unwrap(),
        ),
        &IndexConfig::default(),
    )
    .unwrap();
    by_begin.add(world.fs(1, 0, 4)).unwrap();
    by_end.add(world.fs(2, 0, 2)).unwrap();

    let (FsIterator::Sorted(a), FsIterator::Sorted(b)) = (
        by_begin.iterator_for(world.ann, false).unwrap(),
        by_end.iterator_for(world.ann, false).unwrap(),
    ) else {
        panic!("single-type iteration over a sorted index walks one leaf");
    };
    assert!(matches!(
        MergeIterator::new(vec![a.clone(), b.clone()]),
        Err(CasIndexError::NotComparable(_))
    ));
    assert!(matches!(
        MergeIterator::new(Vec::new()),
        Err(CasIndexError::UnsupportedOperation(_))
    ));
    assert_eq!(MergeIterator::new(vec![a.clone()]).unwrap().width(), 1);
    assert!(matches!(
        FsIterator::Sorted(a).compare_to(&FsIterator::Sorted(b)),
        Err(CasIndexError::NotComparable(_))
    ));
}

#[test]
fn bag_and_unordered_iterators_are_not_comparable() {
    let world = World::new();
    let sorted = world.sorted_index();
    let bag = world.bag_index(4);
    let set = world.set_index();
    for index in [&sorted, &bag, &set] {
        index.add(world.fs(1, 1, 3)).unwrap();
    }

    let ordered = sorted.iterator_for(world.types[1], false).unwrap();
    let bag_it = bag.iterator_for(world.types[1], false).unwrap();
    let unordered = set.iterator(true).unwrap();
    assert!(matches!(bag_it, FsIterator::Bag(_)));
    assert!(matches!(unordered, FsIterator::Unordered(_)));
    assert!(ordered.compare_to(&ordered).unwrap().is_eq());

    for (x, y) in [
        (&bag_it, &ordered),
        (&ordered, &bag_it),
        (&bag_it, &bag_it),
        (&unordered, &unordered),
    ] {
        assert!(matches!(
            x.compare_to(y),
            Err(CasIndexError::NotComparable(_))
        ));
    }
}
