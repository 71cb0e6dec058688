use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use primehash::BidiMap;
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

fn filled(seed: u64, n: usize) -> BidiMap<String, u64> {
    let mut m = BidiMap::new(1, 0.75).unwrap();
    for (i, x) in lcg(seed).take(n).enumerate() {
        m.insert(key(x), i as u64).unwrap();
    }
    m
}

fn bench_insert_100k(c: &mut Criterion) {
    c.bench_function("bidimap::insert_100k", |b| {
        b.iter_batched(
            || BidiMap::<String, u64>::new(1, 0.75).unwrap(),
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(key(x), i as u64).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_lookup_both_ways_10k(c: &mut Criterion) {
    let m = filled(2, 100_000);
    let probes: Vec<String> = lcg(2).take(10_000).map(key).collect();
    c.bench_function("bidimap::get_val_10k", |b| {
        b.iter(|| {
            for k in &probes {
                black_box(m.get_val(k.as_str()));
            }
        })
    });
    c.bench_function("bidimap::get_key_10k", |b| {
        b.iter(|| {
            for v in 0..10_000u64 {
                black_box(m.get_key(&v));
            }
        })
    });
}

fn bench_update_val_10k(c: &mut Criterion) {
    c.bench_function("bidimap::update_val_10k", |b| {
        b.iter_batched(
            || filled(3, 50_000),
            |mut m| {
                for (i, x) in lcg(3).take(10_000).enumerate() {
                    black_box(m.update_val(key(x).as_str(), 1_000_000 + i as u64).unwrap());
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert_100k, bench_lookup_both_ways_10k, bench_update_val_10k
}
criterion_main!(benches);
