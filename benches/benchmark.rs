use criterion::{Criterion, criterion_group, criterion_main};
use njtree::{AlgorithmRegistry, ConstructOptions, DistanceInput};

const REGRESSION_SIZES: &[usize] = &[20, 50];

const REPORTING_SIZES: &[usize] = &[200, 500];

/// Deterministic symmetric matrix with entries in (0.1, 10.0).
fn random_matrix(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) as f64) / (u32::MAX as f64) * 9.9 + 0.1
    };

    let mut data = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = next();
            data[i * n + j] = d;
            data[j * n + i] = d;
        }
    }
    data
}

fn construct(algorithm: &str, labels: &[String], data: &[f64]) {
    let registry = AlgorithmRegistry::with_default_algorithms();
    let result = registry
        .construct(
            algorithm,
            labels,
            DistanceInput::Flat(data),
            &ConstructOptions::default(),
        )
        .unwrap();
    assert!(result.newick.ends_with(';'));
}

fn bench_sizes(c: &mut Criterion, sizes: &[usize]) {
    for &n in sizes {
        let labels: Vec<String> = (0..n).map(|i| format!("taxon{i:04}")).collect();
        let data = random_matrix(n, n as u64);

        for algorithm in ["NJ", "NJ-R", "STITCH", "UPGMA"] {
            c.bench_function(&format!("{algorithm}-n{n}"), |b| {
                b.iter(|| construct(algorithm, &labels, &data));
            });
        }
    }
}

fn tree_construction(c: &mut Criterion) {
    bench_sizes(c, REGRESSION_SIZES);
}

fn tree_construction_large(c: &mut Criterion) {
    bench_sizes(c, REPORTING_SIZES);
}

criterion_group!(regression, tree_construction);
criterion_group! {
    name = reporting;
    config = Criterion::default().sample_size(10);
    targets = tree_construction_large
}
criterion_main!(regression, reporting);
