use chained_map::{ChainedTable, Map, StrHash, TableBuilder, Visit};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn table(hint: usize) -> ChainedTable<String, u64, StrHash> {
    TableBuilder::new()
        .hasher(StrHash)
        .size_hint(hint)
        .build()
        .unwrap()
}

fn bench_put_fresh(c: &mut Criterion) {
    c.bench_function("chained::put_fresh_10k", |b| {
        b.iter_batched(
            || table(10_000),
            |mut t| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    t.put(key(x), i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

// Load factor 8: chains are long on purpose since the table never grows.
fn bench_put_overloaded(c: &mut Criterion) {
    c.bench_function("chained::put_10k_into_1k_buckets", |b| {
        b.iter_batched(
            || table(1_024),
            |mut t| {
                for (i, x) in lcg(2).take(10_000).enumerate() {
                    t.put(key(x), i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("chained::get_hit", |b| {
        let mut t = table(20_000);
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            t.put(k.clone(), i as u64).unwrap();
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(t.get(k));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("chained::get_miss", |b| {
        let mut t = table(10_000);
        for (i, x) in lcg(11).take(10_000).enumerate() {
            t.put(key(x), i as u64).unwrap();
        }
        let mut miss = lcg(0xdead_beef).map(key);
        b.iter(|| {
            let k = miss.next().unwrap();
            black_box(t.get(&k));
        })
    });
}

fn bench_remove_all(c: &mut Criterion) {
    c.bench_function("chained::remove_10k", |b| {
        b.iter_batched(
            || {
                let mut t = table(10_000);
                let keys: Vec<_> = lcg(5).take(10_000).map(key).collect();
                for (i, k) in keys.iter().enumerate() {
                    t.put(k.clone(), i as u64).unwrap();
                }
                (t, keys)
            },
            |(mut t, keys)| {
                for k in &keys {
                    let _ = t.remove(k);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_dyn_walk(c: &mut Criterion) {
    c.bench_function("chained::dyn_for_each_10k", |b| {
        let mut m: Box<dyn Map<String, u64>> = Box::new(table(10_000));
        for (i, x) in lcg(13).take(10_000).enumerate() {
            m.put(key(x), i as u64).unwrap();
        }
        b.iter(|| {
            let mut sum = 0u64;
            m.for_each(&mut |_, v| {
                sum = sum.wrapping_add(*v);
                Visit::Continue
            });
            black_box(sum)
        })
    });
}

fn config() -> Criterion {
    Criterion::default().measurement_time(Duration::from_secs(3))
}

criterion_group! {
    name = benches;
    config = config();
    targets = bench_put_fresh, bench_put_overloaded, bench_get_hit, bench_get_miss, bench_remove_all, bench_dyn_walk
}
criterion_main!(benches);
