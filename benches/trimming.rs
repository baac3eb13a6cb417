//! Performance benchmarks for degree trimming and cached loads.
//!
//! Run with: `cargo bench --bench trimming`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Trim 10k population | <250ms | Default S/W caps |
//! | Cached load | <50ms p99 | LRU hit, clone only |
//! | Normalize 10k population | <100ms | Sorted contact lists |

use criterion::{
    black_box, criterion_group, criterion_main,
    BenchmarkId, Criterion, Throughput,
};

use popnet_kernel::{
    normalize, DegreeCaps, DegreeTrimmer, GenerationOptions, InMemoryPopulationStore, Location,
    LruPopulationStore, Population, PopulationKey, PopulationStore, ReferenceGenerator,
    SyntheticGenerator,
};

fn make_population(size: usize) -> Population {
    ReferenceGenerator::new(42)
        .synthesize(size, &Location::default(), "United States of America")
        .expect("reference population")
}

/// Benchmark trimming a fresh population to the default caps.
fn bench_trim(c: &mut Criterion) {
    let mut group = c.benchmark_group("trim_default_caps");
    group.sample_size(10);
    let caps = DegreeCaps::defaults();
    let trimmer = DegreeTrimmer::new(0);

    for size in [5_000, 10_000, 20_000] {
        let population = make_population(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("people", size), &population, |b, population| {
            b.iter_batched(
                || population.clone(),
                |mut population| {
                    let report = trimmer.trim(&mut population, black_box(&caps));
                    assert!(!report.is_noop());
                    report
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

/// Benchmark cached loads through the LRU store.
fn bench_cached_load(c: &mut Criterion) {
    let key = PopulationKey::new(Location::default(), 10_000, GenerationOptions::default());
    let mut inner = InMemoryPopulationStore::new();
    inner.insert(key.clone(), make_population(10_000));
    let store = LruPopulationStore::new(inner, 4);

    // Warm the cache
    store.load(&key).expect("warm load");

    c.bench_function("cached_load_10k", |b| {
        b.iter(|| {
            let population = store.load(black_box(&key)).expect("cached load");
            assert_eq!(population.len(), 10_000);
            population
        })
    });
}

/// Benchmark normalization into sorted contact lists.
fn bench_normalize(c: &mut Criterion) {
    let mut population = make_population(10_000);
    DegreeTrimmer::new(0).trim(&mut population, &DegreeCaps::defaults());

    c.bench_function("normalize_10k", |b| {
        b.iter(|| normalize(black_box(&population)))
    });
}

criterion_group!(
    benches,
    bench_trim,
    bench_cached_load,
    bench_normalize,
);

criterion_main!(benches);
