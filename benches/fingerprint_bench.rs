use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use reductor::core::{CoverageLine, TestRecord};
use reductor::fingerprint::{FingerprintBuilder, FingerprintOptions};

/// A synthetic run: `num_tests` tests sharing a bootstrap block plus a few
/// unique lines each, roughly the shape real suites produce.
fn synthetic_run(num_tests: usize, shared_lines: u32, unique_lines: u32) -> Vec<TestRecord> {
    (0..num_tests)
        .map(|i| {
            let mut record = TestRecord::new(format!("Suite{i}Test::testCase{i}"));
            record.execution_time_ms = 25;
            record.coverage = (1..=shared_lines)
                .map(|l| CoverageLine::new("bootstrap.php", l))
                .chain((1..=unique_lines).map(|l| CoverageLine::new(format!("f{i}.php"), l)))
                .collect();
            record
        })
        .collect()
}

fn benchmark_fingerprint_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint_build");

    for size in [50, 200, 500].iter() {
        let tests = synthetic_run(*size, 120, 8);
        group.bench_with_input(BenchmarkId::new("tests", size), &tests, |b, tests| {
            b.iter(|| {
                let mut builder = FingerprintBuilder::new(FingerprintOptions::default());
                black_box(builder.build(black_box(tests)));
            })
        });
    }
    group.finish();
}

fn benchmark_unweighted_build(c: &mut Criterion) {
    let tests = synthetic_run(200, 120, 8);
    let options = FingerprintOptions {
        exclude_shared_coverage: false,
        use_idf_weighting: false,
    };
    c.bench_function("fingerprint_build_unweighted", |b| {
        b.iter(|| {
            let mut builder = FingerprintBuilder::new(options);
            black_box(builder.build(black_box(&tests)));
        })
    });
}

criterion_group!(benches, benchmark_fingerprint_build, benchmark_unweighted_build);
criterion_main!(benches);
