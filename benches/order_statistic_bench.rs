//! Benchmark for the order-statistic set implementations.
//!
//! Compares the naive linear-scan baseline against the tree-backed set
//! whose subtree sizes answer rank queries in O(log n).

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use percol::persistent::{NaiveOrderStatisticSet, OrderStatisticSet, OrderStatisticTreeSet};

// =============================================================================
// get_by_rank Benchmark
// =============================================================================

fn benchmark_get_by_rank(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("get_by_rank");

    for size in [100, 1000, 10000] {
        let naive: NaiveOrderStatisticSet<i32> = (0..size).collect();
        let tree: OrderStatisticTreeSet<i32> = (0..size).collect();
        let ranks: Vec<usize> = (0..usize::try_from(size).unwrap_or(0)).step_by(13).collect();

        group.bench_with_input(BenchmarkId::new("Naive", size), &size, |bencher, _| {
            bencher.iter(|| {
                let mut sum = 0;
                for rank in &ranks {
                    if let Some(&element) = naive.get_by_rank(black_box(*rank)) {
                        sum += element;
                    }
                }
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("Tree", size), &size, |bencher, _| {
            bencher.iter(|| {
                let mut sum = 0;
                for rank in &ranks {
                    if let Some(&element) = tree.get_by_rank(black_box(*rank)) {
                        sum += element;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

// =============================================================================
// rank_of Benchmark
// =============================================================================

fn benchmark_rank_of(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("rank_of");

    for size in [100, 1000, 10000] {
        let naive: NaiveOrderStatisticSet<i32> = (0..size).collect();
        let tree: OrderStatisticTreeSet<i32> = (0..size).collect();
        let probes: Vec<i32> = (0..size).step_by(13).collect();

        group.bench_with_input(BenchmarkId::new("Naive", size), &size, |bencher, _| {
            bencher.iter(|| {
                let mut sum = 0;
                for probe in &probes {
                    if let Some(rank) = naive.rank_of(black_box(probe)) {
                        sum += rank;
                    }
                }
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("Tree", size), &size, |bencher, _| {
            bencher.iter(|| {
                let mut sum = 0;
                for probe in &probes {
                    if let Some(rank) = tree.rank_of(black_box(probe)) {
                        sum += rank;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

// =============================================================================
// insert Benchmark
// =============================================================================

fn benchmark_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("set_insert");

    for size in [100, 1000] {
        group.bench_with_input(BenchmarkId::new("Naive", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut set = NaiveOrderStatisticSet::new();
                for element in 0..size {
                    set = set.insert(black_box(element));
                }
                black_box(set)
            });
        });

        group.bench_with_input(BenchmarkId::new("Tree", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut set = OrderStatisticTreeSet::new();
                for element in 0..size {
                    set = set.insert(black_box(element));
                }
                black_box(set)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_get_by_rank,
    benchmark_rank_of,
    benchmark_insert
);
criterion_main!(benches);
