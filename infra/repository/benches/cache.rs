use criterion::{Criterion, criterion_group, criterion_main};
use lhub_domain::config::SignalsConfig;
use lhub_repository::{Absorb, EntityCache};
use std::hint::black_box;

#[derive(Clone, Debug)]
struct Row {
    id: u64,
    label: Option<String>,
    amount: Option<i64>,
}

impl Absorb for Row {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }

    fn absorb(&mut self, update: Self) {
        if update.label.is_some() {
            self.label = update.label;
        }
        if update.amount.is_some() {
            self.amount = update.amount;
        }
    }
}

fn row(id: u64) -> Row {
    Row { id, label: Some(format!("row-{id}")), amount: Some(i64::try_from(id).unwrap_or(0)) }
}

fn build_cache() -> EntityCache<Row, ()> {
    EntityCache::new(
        &SignalsConfig::default(),
        |id| Box::pin(async move { Ok(row(id)) }),
        |()| Box::pin(async { Ok((0..64).map(row).collect()) }),
    )
}

// ============================================================================
// Benchmark: Synchronous read path
// ============================================================================

fn bench_cached_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_read");

    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = build_cache();
    rt.block_on(async {
        for id in 0..64 {
            cache.get(id).await.unwrap();
        }
    });

    group.bench_function("hit", |b| {
        b.iter(|| {
            black_box(cache.cached(black_box(&7)).unwrap());
        });
    });

    group.bench_function("version", |b| {
        b.iter(|| {
            black_box(cache.version(black_box(&7)).unwrap());
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: Authoritative fetch + merge
// ============================================================================

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = build_cache();

    group.bench_function("warm_merge", |b| {
        b.iter(|| {
            let value = rt.block_on(cache.get(black_box(3)));
            black_box(value.unwrap());
        });
    });

    group.bench_function("list_merge", |b| {
        b.iter(|| {
            let values = rt.block_on(cache.get_list(()));
            black_box(values.unwrap());
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: Subscription churn
// ============================================================================

fn bench_subscribe(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscribe");

    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = build_cache();
    rt.block_on(async {
        cache.get(1).await.unwrap();
    });

    group.bench_function("attach_and_replay", |b| {
        b.iter(|| {
            let rx = cache.subscribe(black_box(&1)).unwrap();
            black_box(rx.borrow().clone());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cached_read, bench_get, bench_subscribe);
criterion_main!(benches);
