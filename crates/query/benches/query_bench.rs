//! Benchmarks for query operations.
//!
//! Data is inserted in shuffled order so sorts and index scans do real work.
//! Setup is excluded with `iter_batched` where the operator consumes its input.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::rc::Rc;
use tally_core::schema::{column, TableBuilder};
use tally_core::Row;
use tally_query::ast::{col, SortOrder};
use tally_query::executor::{find, HashJoin, SortExecutor};
use tally_query::planner::{FindOptions, OrderBy};
use tally_storage::{IndexedTable, SharedTable};

/// Simple LCG for reproducible pseudo-random shuffling
fn shuffle_indices(count: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..count).collect();
    let mut s = seed;
    for i in (1..count).rev() {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        let j = (s as usize) % (i + 1);
        indices.swap(i, j);
    }
    indices
}

fn create_shuffled_rows(count: usize) -> Vec<Row> {
    shuffle_indices(count, 12345)
        .into_iter()
        .map(|i| {
            Row::new()
                .with("id", i as i64)
                .with("name", format!("name_{}", i))
                .with("score", (i % 100) as i64)
        })
        .collect()
}

fn create_table(count: usize) -> SharedTable {
    let schema = TableBuilder::new("items")
        .column(column("id").int64().primary_key())
        .column(column("name").string())
        .column(column("score").int64().indexed())
        .build()
        .unwrap();
    SharedTable::new(IndexedTable::from_rows(schema, create_shuffled_rows(count)).unwrap())
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for size in [100, 1000, 10000].iter() {
        let rows: Vec<Rc<Row>> = create_shuffled_rows(*size).into_iter().map(Rc::new).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter_batched(
                || rows.clone(),
                |rows| {
                    let executor = SortExecutor::new(vec![OrderBy::asc("name")]);
                    black_box(executor.execute(rows))
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_find_indexed_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_indexed_order");

    for size in [100, 1000, 10000].iter() {
        let table = create_table(*size);
        let options = FindOptions::new().order_by("score", SortOrder::Desc).limit(10);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(find(&table, &options).unwrap()))
        });
    }

    group.finish();
}

fn bench_find_manual_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_manual_sort");

    for size in [100, 1000, 10000].iter() {
        let table = create_table(*size);
        let options = FindOptions::new()
            .filter(col("score").lt(50))
            .order_by("name", SortOrder::Asc)
            .limit(10);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(find(&table, &options).unwrap()))
        });
    }

    group.finish();
}

fn bench_hash_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_join");

    for size in [100, 1000, 10000].iter() {
        let left: Vec<Rc<Row>> = create_shuffled_rows(*size).into_iter().map(Rc::new).collect();
        let right: Vec<Rc<Row>> = (0..100)
            .map(|i| Rc::new(Row::new().with("score", i as i64).with("label", format!("s{}", i))))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let join = HashJoin::left_outer("items", "score", "labels", "score");
            b.iter(|| black_box(join.execute(&left, &right)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sort,
    bench_find_indexed_order,
    bench_find_manual_sort,
    bench_hash_join,
);

criterion_main!(benches);
