use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use cas_index::prelude::*;

fn setup() -> (Arc<TypeSystem>, TypeCode, TypeCode) {
    let mut b = TypeSystemBuilder::new();
    let ann = b.with_annotation_type().expect("annotation type");
    let token = b.add_type("Token", ann).expect("token type");
    (b.commit().expect("type system"), ann, token)
}

fn populated(n: usize) -> (Cas, Vec<FsRef>) {
    let (ts, ann, token) = setup();
    let def = IndexDefinition::annotation_index(&ts).expect("annotation index");
    let mut cas = Cas::new(&ts, vec![def]).expect("cas");
    let mut rng = SmallRng::seed_from_u64(17);
    let mut all = Vec::with_capacity(n);
    for _ in 0..n {
        let ty = if rng.gen_bool(0.7) { token } else { ann };
        let begin = rng.gen_range(0..(n as i64));
        let fs = cas
            .create_fs(ty)
            .and_then(|b| b.with_int("begin", begin))
            .and_then(|b| b.with_int("end", begin + 5))
            .expect("fs")
            .build();
        cas.add_fs(Arc::clone(&fs)).expect("add");
        all.push(fs);
    }
    (cas, all)
}

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("annotation_index");

    for &n in &[1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("insert", n), &n, |b, &n| {
            b.iter(|| black_box(populated(n)));
        });

        let (cas, all) = populated(n);
        group.bench_with_input(BenchmarkId::new("merged_walk", n), &n, |b, _| {
            b.iter(|| {
                let it = cas.iterator(ANNOTATION_INDEX, true).expect("iterator");
                black_box(it.forward().count());
            });
        });

        // every write while an iterator is live pays one copy
        group.bench_with_input(BenchmarkId::new("cow_remove_add", n), &n, |b, _| {
            let mut i = 0usize;
            b.iter(|| {
                let it = cas.iterator(ANNOTATION_INDEX, true).expect("iterator");
                let fs = &all[i % all.len()];
                cas.remove_fs(fs);
                cas.add_fs(Arc::clone(fs)).expect("add");
                i += 1;
                black_box(it.is_valid());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_indexing);
criterion_main!(benches);
