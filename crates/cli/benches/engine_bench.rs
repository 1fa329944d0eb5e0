use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use engine::Engine;
use tempfile::tempdir;

const N_KEYS: usize = 10_000;
const VALUE_SIZE: usize = 100;

fn fill(db: &mut Engine) {
    for i in 0..N_KEYS {
        db.put(format!("key{}", i).as_bytes(), &vec![b'x'; VALUE_SIZE])
            .unwrap();
    }
}

fn put_benchmark(c: &mut Criterion) {
    c.bench_function("engine_put_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let db = Engine::open(dir.path()).unwrap();
                (dir, db)
            },
            |(_dir, mut db)| {
                fill(&mut db);
            },
            BatchSize::SmallInput,
        );
    });
}

fn get_hit_benchmark(c: &mut Criterion) {
    c.bench_function("engine_get_hit_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let mut db = Engine::open(dir.path()).unwrap();
                fill(&mut db);
                (dir, db)
            },
            |(_dir, db)| {
                for i in 0..N_KEYS {
                    let v = db.get(format!("key{}", i).as_bytes()).unwrap();
                    assert!(v.is_some());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn sealed_get_benchmark(c: &mut Criterion) {
    c.bench_function("engine_get_sealed_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let mut db = Engine::open(dir.path()).unwrap();
                fill(&mut db);
                db.rotate().unwrap();
                (dir, db)
            },
            |(_dir, db)| {
                for i in 0..N_KEYS {
                    let v = db.get(format!("key{}", i).as_bytes()).unwrap();
                    assert!(v.is_some());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn rotate_benchmark(c: &mut Criterion) {
    c.bench_function("engine_rotate_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let mut db = Engine::open(dir.path()).unwrap();
                fill(&mut db);
                (dir, db)
            },
            |(_dir, mut db)| {
                db.rotate().unwrap();
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    put_benchmark,
    get_hit_benchmark,
    sealed_get_benchmark,
    rotate_benchmark
);
criterion_main!(benches);
