#![allow(unused_must_use)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use linescout::{search_with_config, SearchConfig};
use std::{fs::File, io::Write, num::NonZeroUsize};
use tempfile::tempdir;

fn create_test_files(
    dir: &tempfile::TempDir,
    file_count: usize,
    lines_per_file: usize,
) -> std::io::Result<()> {
    for i in 0..file_count {
        let file_path = dir.path().join(format!("test_{}.txt", i));
        let mut file = File::create(file_path)?;
        for j in 0..lines_per_file {
            writeln!(
                file,
                "Line {} TODO: fix bug {} FIXME: optimize line {} NOTE: important task {}",
                j, j, j, j
            )?;
        }
    }
    Ok(())
}

fn create_base_config(dir: &tempfile::TempDir) -> SearchConfig {
    SearchConfig::new("TODO", dir.path())
}

fn bench_queries(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, 10, 100)?;

    let queries = ["TODO", "FIXME: optimize", "important task", "e"];

    let mut group = c.benchmark_group("Queries");
    for (i, query) in queries.iter().enumerate() {
        let mut config = create_base_config(&dir);
        config.query = query.to_string();

        group.bench_function(format!("query_{}", i), |b| {
            b.iter(|| black_box(search_with_config(&config).count()));
        });
    }
    group.finish();
    Ok(())
}

fn bench_file_scaling(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    let file_counts = vec![1, 10, 100, 1000];
    let base_config = create_base_config(&dir);

    let mut group = c.benchmark_group("File Scaling");
    for &count in &file_counts {
        create_test_files(&dir, count, 10)?;

        group.bench_function(format!("files_{}", count), |b| {
            b.iter(|| black_box(search_with_config(&base_config).count()));
        });
    }
    group.finish();
    Ok(())
}

fn bench_worker_count(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, 200, 50)?;

    let mut group = c.benchmark_group("Worker Count");
    for workers in [1, 2, 4, 8] {
        let config = create_base_config(&dir)
            .with_thread_count(NonZeroUsize::new(workers).unwrap());

        group.bench_function(format!("workers_{}", workers), |b| {
            b.iter(|| black_box(search_with_config(&config).count()));
        });
    }
    group.finish();
    Ok(())
}

fn bench_first_result(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, 500, 20)?;
    let config = create_base_config(&dir);

    let mut group = c.benchmark_group("Latency");
    group.bench_function("first_occurrence", |b| {
        b.iter(|| black_box(search_with_config(&config).next()));
    });
    group.finish();
    Ok(())
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_queries, bench_file_scaling, bench_worker_count, bench_first_result
}

#[test]
fn ensure_benchmarks_valid() {
    benches();
}

criterion_main!(benches);
