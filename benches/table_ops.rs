//! Benchmarks for search, sort and pager construction.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::expect_used, clippy::cast_possible_truncation)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeSet;

use dtview::pager::truncated_links;
use dtview::search::{apply_search, SearchMode};
use dtview::sort::{sort_rows, EmptyPlacement};
use dtview::{Row, SortDirection, TableConfig, TableController, TableInput, TableSnapshot};

const SIZES: [usize; 3] = [100, 1_000, 10_000];

fn snapshot(rows: usize) -> TableSnapshot {
    let body: Vec<serde_json::Value> = (0..rows)
        .map(|i| {
            serde_json::json!([
                format!("Customer {i}"),
                format!("${}.{:02}", (i * 7919) % 10_000, i % 100),
                if i % 13 == 0 { String::new() } else { format!("{}%", i % 97) },
            ])
        })
        .collect();
    let input: TableInput = serde_json::from_value(serde_json::json!({
        "header": ["Name", "Amount", "Share"],
        "rows": body,
    }))
    .expect("bench table is valid");
    TableSnapshot::from_input(&input)
}

fn data_rows(rows: usize) -> Vec<Row> {
    snapshot(rows).data_rows().to_vec()
}

/// Full and partial search over growing tables
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let none = BTreeSet::new();

    for size in SIZES {
        let rows = data_rows(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("partial", size), &rows, |b, rows| {
            b.iter_batched(
                || rows.clone(),
                |mut rows| {
                    apply_search(
                        &mut rows,
                        black_box("customer 4 99"),
                        SearchMode::Partial,
                        &none,
                    )
                },
                criterion::BatchSize::LargeInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("full", size), &rows, |b, rows| {
            b.iter_batched(
                || rows.clone(),
                |mut rows| {
                    apply_search(
                        &mut rows,
                        black_box("customer 4 99"),
                        SearchMode::Full,
                        &none,
                    )
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

/// Numeric column sort with empties
fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for size in SIZES {
        let rows = data_rows(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("amount_desc", size), &rows, |b, rows| {
            b.iter_batched(
                || rows.clone(),
                |mut rows| {
                    sort_rows(&mut rows, 1, SortDirection::Desc, EmptyPlacement::First);
                    rows
                },
                criterion::BatchSize::LargeInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("share_asc", size), &rows, |b, rows| {
            b.iter_batched(
                || rows.clone(),
                |mut rows| {
                    sort_rows(&mut rows, 2, SortDirection::Asc, EmptyPlacement::Last);
                    rows
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

/// Page link lists for long tables
fn bench_truncated_links(c: &mut Criterion) {
    c.bench_function("truncated_links_2000_pages", |b| {
        b.iter(|| truncated_links(black_box(1_000), black_box(2_000), 2, "&hellip;"))
    });
}

/// A full local refresh: search, sort, then a page frame
fn bench_frame(c: &mut Criterion) {
    let table = snapshot(1_000);
    c.bench_function("frame_1000_rows", |b| {
        b.iter_batched(
            || {
                TableController::new(table.clone(), TableConfig::default())
                    .expect("default config is valid")
            },
            |mut controller| {
                controller.search("customer");
                controller
                    .sort(1, SortDirection::Asc)
                    .expect("column exists");
                controller.paginate(black_box(7))
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_search,
    bench_sort,
    bench_truncated_links,
    bench_frame
);
criterion_main!(benches);
