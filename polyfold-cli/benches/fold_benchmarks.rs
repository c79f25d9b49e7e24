use std::process::Command;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

#[path = "../tests/common/mod.rs"]
mod common;

/// Benchmark the findmfe driver end to end (table load + fill +
/// traceback) over sequences of increasing length.
fn bench_findmfe(criterion: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    common::write_param_dir(&dir.path().join("params"));

    let mut group = criterion.benchmark_group("findmfe");
    group.sample_size(10).measurement_time(Duration::from_secs(20));

    for length in [20usize, 40, 60] {
        let body: String = "GGGAAACCCAUAUGCGCAUAU"
            .chars()
            .cycle()
            .take(length)
            .collect();
        let fasta = dir.path().join(format!("bench-{length}.fasta"));
        common::write_fasta(&fasta, &body);

        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, _| {
            b.iter(|| {
                let status = Command::new(env!("CARGO_BIN_EXE_findmfe"))
                    .args([
                        "--sequence",
                        fasta.to_str().unwrap(),
                        "--paramdir",
                        dir.path().join("params").to_str().unwrap(),
                        "--dangle-model",
                        "1",
                        "--outfile",
                        dir.path().join("bench.out").to_str().unwrap(),
                    ])
                    .status()
                    .expect("findmfe runs");
                assert!(status.success());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_findmfe);
criterion_main!(benches);
