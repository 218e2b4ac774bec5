use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use modelbench::prelude::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_regression_data(n_rows: usize, n_features: usize) -> (FeatureTable, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 10.0);
    let y = x.sum_axis(ndarray::Axis(1)) + Array1::from_shape_fn(n_rows, |_| rng.gen::<f64>() * 0.1);
    (FeatureTable::from_array(x), y)
}

fn bench_cross_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_validation");
    group.sample_size(10);

    let (x, y) = create_regression_data(2000, 10);
    for parallel in [false, true] {
        let evaluator =
            Evaluator::new(EvaluationConfig::default().with_parallel_folds(parallel)).unwrap();
        let model = DecisionTreeRegressor::new().with_max_depth(8);

        group.bench_with_input(
            BenchmarkId::new("tree_5fold", if parallel { "parallel" } else { "sequential" }),
            &(&x, &y),
            |b, (x, y)| {
                b.iter(|| {
                    evaluator
                        .cross_val_score(&model, black_box(x), black_box(y), "tree")
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_weighted_ensemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("weighted_ensemble");

    let (x, y) = create_regression_data(5000, 10);
    let mut ensemble = WeightedEnsemble::new(vec![
        WeightedComponent::new("ols", Box::new(LinearRegression::new()), 0.5),
        WeightedComponent::new("ridge", Box::new(RidgeRegression::new(1.0)), 0.5),
    ])
    .unwrap();
    ensemble.fit(&x, &y).unwrap();

    for n_rows in [100, 1000, 10000] {
        let (test, _) = create_regression_data(n_rows, 10);
        group.bench_with_input(BenchmarkId::new("predict", n_rows), &test, |b, test| {
            b.iter(|| ensemble.predict(black_box(test)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cross_validation, bench_weighted_ensemble);
criterion_main!(benches);
