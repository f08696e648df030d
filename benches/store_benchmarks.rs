use criterion::{black_box, criterion_group, criterion_main, Criterion};
use peercache::byteview::ByteView;
use peercache::lru::LruStore;

const CACHE_SIZE: usize = 1000;

fn filled_store(entries: usize) -> LruStore<ByteView> {
    let mut store = LruStore::new(0);
    for i in 0..entries {
        store.set(format!("key-{i}"), ByteView::new(format!("value-{i}").into_bytes()));
    }
    store
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("LruStore");

    {
        let mut store = filled_store(CACHE_SIZE);
        group.bench_function("get hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(store.get(&format!("key-{}", i % CACHE_SIZE)));
                }
            });
        });

        group.bench_function("get miss", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(store.get(&format!("absent-{}", i + CACHE_SIZE)));
                }
            });
        });
    }

    {
        // Bounded store sized so every insert forces one eviction, to
        // measure the steady-state eviction path rather than unbounded
        // growth.
        let mut store: LruStore<ByteView> = LruStore::new(CACHE_SIZE * 16);
        for i in 0..CACHE_SIZE {
            store.set(format!("key-{i}"), ByteView::new(format!("value-{i}").into_bytes()));
        }
        group.bench_function("set causing eviction", |b| {
            let mut i = CACHE_SIZE;
            b.iter(|| {
                store.set(format!("key-{i}"), ByteView::new(format!("value-{i}").into_bytes()));
                i += 1;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
