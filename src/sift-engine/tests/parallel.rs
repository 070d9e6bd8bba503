//! Parallel-mode tests for the sift-engine crate.
//!
//! Implicit parallelism is a process-wide switch, so every test in this
//! binary enables it with the same worker count and none disables it; the
//! sequential suites live in their own binaries.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use proptest::prelude::*;

use sift_engine::{
    enable_implicit_parallelism, DataFrame, Hist1D, MemTable, SiftError, SiftResult,
};

const WORKERS: usize = 4;

fn wide_table(rows: i64) -> MemTable {
    MemTable::new()
        .with_i64("A", (0..rows).collect())
        .unwrap()
}

#[test]
fn test_parallel_sum_matches_analytic() {
    enable_implicit_parallelism(WORKERS);
    let rows = 100_000i64;
    let df = DataFrame::new(wide_table(rows));
    let chained = df
        .named_filter("all", |_a: i64| true, &["A"])
        .unwrap();
    let total = chained.reduce(|a: i64, b: i64| a + b, 0, &["A"]).unwrap();

    assert_eq!(total.value().unwrap(), rows * (rows - 1) / 2);

    // per-slot accept counts sum to the full row count
    let report = df.report().unwrap();
    assert_eq!(report.entries()[0].accepted, rows as u64);
    assert_eq!(report.entries()[0].observed, rows as u64);
}

#[test]
fn test_parallel_count_and_extrema() {
    enable_implicit_parallelism(WORKERS);
    let df = DataFrame::new(wide_table(10_000));
    let filtered = df.filter(|a: i64| a % 2 == 0, &["A"]).unwrap();
    let count = filtered.count().unwrap();
    let low = filtered.min::<i64>(&["A"]).unwrap();
    let high = filtered.max::<i64>(&["A"]).unwrap();

    assert_eq!(count.value().unwrap(), 5_000);
    assert_eq!(low.value().unwrap(), 0);
    assert_eq!(high.value().unwrap(), 9_998);
}

#[test]
fn test_parallel_take_is_slot_merged() {
    enable_implicit_parallelism(WORKERS);
    let df = DataFrame::new(wide_table(1_000));
    let taken = df.take::<i64>(&["A"]).unwrap();

    // merge order follows slot indices, not original row order; the
    // content is exactly the source column
    let mut values = taken.value().unwrap();
    values.sort_unstable();
    assert_eq!(values, (0..1_000).collect::<Vec<_>>());
}

#[test]
fn test_parallel_histogram_matches_row_count() {
    enable_implicit_parallelism(WORKERS);
    let df = DataFrame::new(wide_table(10_000));
    let hist = df
        .fill(Hist1D::new(100, 0.0, 10_000.0), &["A"])
        .unwrap()
        .value()
        .unwrap();
    assert_eq!(hist.entries(), 10_000);
    // uniform input: every bin holds the same share
    for i in 0..hist.num_bins() {
        assert_eq!(hist.bin(i), 100);
    }
}

#[test]
fn test_parallel_mean() {
    enable_implicit_parallelism(WORKERS);
    let df = DataFrame::new(wide_table(10_001));
    let avg = df.mean(&["A"]).unwrap();
    assert!((avg.value().unwrap() - 5_000.0).abs() < 1e-9);
}

#[test]
fn test_single_row_with_many_workers() {
    enable_implicit_parallelism(WORKERS);
    let table = MemTable::new().with_i64("A", vec![42]).unwrap();
    let df = DataFrame::new(table);
    let count = df.count().unwrap();
    let low = df.min::<i64>(&["A"]).unwrap();

    // exactly one worker sees the row; the other slots contribute identity
    assert_eq!(count.value().unwrap(), 1);
    assert_eq!(low.value().unwrap(), 42);
}

#[test]
fn test_foreach_slot_partitions_state() {
    enable_implicit_parallelism(WORKERS);
    let per_slot: Arc<Vec<AtomicI64>> =
        Arc::new((0..WORKERS).map(|_| AtomicI64::new(0)).collect());
    let sink = Arc::clone(&per_slot);

    let rows = 10_000i64;
    let df = DataFrame::new(wide_table(rows));
    let walked = df
        .foreach_slot(
            move |slot: usize, a: i64| {
                sink[slot].fetch_add(a, Ordering::Relaxed);
            },
            &["A"],
        )
        .unwrap();
    walked.value().unwrap();

    let total: i64 = per_slot.iter().map(|a| a.load(Ordering::Relaxed)).sum();
    assert_eq!(total, rows * (rows - 1) / 2);
}

#[test]
fn test_worker_failure_marshalled_to_caller() {
    enable_implicit_parallelism(WORKERS);
    let df = DataFrame::new(wide_table(10_000));
    let taken = df
        .define(
            "D",
            |a: i64| -> SiftResult<i64> {
                if a == 7_777 {
                    Err(SiftError::user_callable("poisoned row"))
                } else {
                    Ok(a)
                }
            },
            &["A"],
        )
        .unwrap()
        .take::<i64>(&["D"])
        .unwrap();

    // the first worker error aborts the pass and surfaces here, on the
    // observing thread
    let err = taken.value().unwrap_err();
    assert!(matches!(err, SiftError::UserCallable(_)));

    // handles stay unready; the pass can be retried
    let err = taken.value().unwrap_err();
    assert!(matches!(err, SiftError::UserCallable(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Merging per-slot accumulators reproduces the plain single-threaded
    /// answer for any input.
    #[test]
    fn prop_parallel_merge_equals_ground_truth(data in prop::collection::vec(-1_000i64..1_000, 0..300)) {
        enable_implicit_parallelism(WORKERS);
        let expected_sum: i64 = data.iter().filter(|v| **v > 0).sum();
        let expected_count = data.iter().filter(|v| **v > 0).count() as u64;

        let table = MemTable::new().with_i64("A", data).unwrap();
        let df = DataFrame::new(table);
        let positive = df.filter(|a: i64| a > 0, &["A"]).unwrap();
        let total = positive.reduce(|a: i64, b: i64| a + b, 0, &["A"]).unwrap();
        let count = positive.count().unwrap();

        prop_assert_eq!(total.value().unwrap(), expected_sum);
        prop_assert_eq!(count.value().unwrap(), expected_count);
    }
}
