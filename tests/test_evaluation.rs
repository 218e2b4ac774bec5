//! Integration test: evaluation harness end-to-end

use modelbench::prelude::*;
use ndarray::{s, Array1, Array2};
use polars::prelude::*;

fn housing_df() -> DataFrame {
    let n = 48;
    let rooms: Vec<f64> = (0..n).map(|i| 3.0 + (i % 6) as f64).collect();
    let age: Vec<f64> = (0..n).map(|i| 5.0 + ((i * 7) % 11) as f64 * 3.0).collect();
    let income: Vec<f64> = (0..n).map(|i| 1.0 + (i / 4) as f64 * 0.5).collect();
    let value: Vec<f64> = (0..n)
        .map(|i| {
            let wobble = if i % 2 == 0 { 0.05 } else { -0.05 };
            1.5 * income[i] + 0.4 * rooms[i] - 0.02 * age[i] + wobble
        })
        .collect();

    df!(
        "rooms" => &rooms,
        "age" => &age,
        "income" => &income,
        "value" => &value
    )
    .unwrap()
}

fn housing_split() -> DatasetSplit {
    let (x, y) = FeatureTable::features_and_target(&housing_df(), "value").unwrap();
    train_test_split(&x, &y, 0.25, 3).unwrap()
}

/// Returns one prediction too few for any table of at least `from_rows` rows
#[derive(Debug, Clone)]
struct TruncatingModel {
    from_rows: usize,
}

impl Regressor for TruncatingModel {
    fn fit(&mut self, _x: &FeatureTable, _y: &Array1<f64>) -> modelbench::Result<()> {
        Ok(())
    }

    fn predict(&self, x: &FeatureTable) -> modelbench::Result<Array1<f64>> {
        let n = x.nrows();
        let len = if n >= self.from_rows { n.saturating_sub(1) } else { n };
        Ok(Array1::zeros(len))
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(self.clone())
    }
}

fn r2_by_hand(y: &Array1<f64>, pred: &Array1<f64>) -> f64 {
    let mean = y.sum() / y.len() as f64;
    let ss_tot: f64 = y.iter().map(|v| (v - mean) * (v - mean)).sum();
    let ss_res: f64 = y.iter().zip(pred.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
    1.0 - ss_res / ss_tot
}

#[test]
fn test_metrics_are_non_negative() {
    let split = housing_split();
    let evaluator = Evaluator::default();
    let models: Vec<(&str, Box<dyn Regressor>)> = vec![
        ("ols", Box::new(LinearRegression::new())),
        ("lasso", Box::new(LassoRegression::new(0.05))),
        ("tree", Box::new(DecisionTreeRegressor::new().with_max_depth(4))),
        ("forest", Box::new(RandomForestRegressor::new(10).with_random_state(1))),
    ];

    for (name, model) in models {
        let result = evaluator.evaluate_split(model, &split, name).unwrap();
        assert!(result.rmse() >= 0.0, "{} rmse", name);
        assert!(result.mae() >= 0.0, "{} mae", name);
        assert!(result.rmse() >= result.mae() - 1e-12, "{}: rmse >= mae", name);
        assert!(result.fit_time_secs() >= 0.0);
    }
}

#[test]
fn test_r2_matches_independent_computation() {
    let split = housing_split();
    let evaluator = Evaluator::default();

    for (name, model) in [
        ("ridge", Box::new(RidgeRegression::new(2.0)) as Box<dyn Regressor>),
        ("tree", Box::new(DecisionTreeRegressor::new().with_max_depth(3))),
    ] {
        let result = evaluator.evaluate_split(model, &split, name).unwrap();
        let pred = result.model().predict(&split.x_test).unwrap();
        let expected = r2_by_hand(&split.y_test, &pred);
        assert!(
            (result.r2() - expected).abs() < 1e-9,
            "{}: {} vs {}",
            name,
            result.r2(),
            expected
        );
    }
}

#[test]
fn test_dimension_mismatch_100_vs_99() {
    let x = FeatureTable::from_array(Array2::from_shape_fn((100, 3), |(i, j)| (i * j) as f64));
    let y_train = Array1::from_shape_fn(99, |i| i as f64);
    let x_test = FeatureTable::from_array(Array2::zeros((10, 3)));
    let y_test = Array1::zeros(10);

    let err = Evaluator::default()
        .evaluate(
            Box::new(LinearRegression::new()),
            &x,
            &x_test,
            &y_train,
            &y_test,
            "ols",
        )
        .unwrap_err();
    assert!(matches!(err, ModelBenchError::DimensionMismatch { .. }));

    assert!(matches!(
        DatasetSplit::new(x, x_test, y_train, y_test),
        Err(ModelBenchError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_schema_mismatch_between_train_and_test() {
    let split = housing_split();
    let renamed = FeatureTable::new(
        vec!["a".into(), "b".into(), "c".into()],
        split.x_test.values().clone(),
    )
    .unwrap();

    let err = Evaluator::default()
        .evaluate(
            Box::new(LinearRegression::new()),
            &split.x_train,
            &renamed,
            &split.y_train,
            &split.y_test,
            "ols",
        )
        .unwrap_err();
    assert!(matches!(err, ModelBenchError::DimensionMismatch { .. }));
}

#[test]
fn test_batch_isolates_fit_failure() {
    // `double` is an exact multiple of `x`, so ordinary least squares is singular
    let x: Vec<f64> = (0..30).map(|i| i as f64).collect();
    let double: Vec<f64> = x.iter().map(|v| 2.0 * v).collect();
    let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
    let df = df!("x" => &x, "double" => &double, "y" => &y).unwrap();

    let (features, target) = FeatureTable::features_and_target(&df, "y").unwrap();
    let split = train_test_split(&features, &target, 0.2, 11).unwrap();

    let registry = ModelRegistry::new()
        .with("ols", Box::new(LinearRegression::new()))
        .unwrap()
        .with("ridge", Box::new(RidgeRegression::new(1.0)))
        .unwrap()
        .with("tree", Box::new(DecisionTreeRegressor::new()))
        .unwrap();

    let batch = Evaluator::default().evaluate_all(registry, &split).unwrap();

    let evaluated: Vec<&str> = batch.results.iter().map(|r| r.name()).collect();
    assert_eq!(evaluated, vec!["ridge", "tree"]);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].name, "ols");

    let table = batch.comparison();
    assert_eq!(table.len(), 2);
    assert_eq!(table.failures().len(), 1);
}

#[test]
fn test_batch_isolates_short_predictions() {
    let split = housing_split();
    assert!(split.x_test.nrows() >= 10);

    let registry = ModelRegistry::new()
        .with("ols", Box::new(LinearRegression::new()))
        .unwrap()
        // fails inside cross-validation
        .with("short", Box::new(TruncatingModel { from_rows: 0 }))
        .unwrap()
        // cross-validation folds are smaller than the test split, so only the final score fails
        .with("short_on_test", Box::new(TruncatingModel { from_rows: 10 }))
        .unwrap()
        .with("ridge", Box::new(RidgeRegression::new(1.0)))
        .unwrap();

    let batch = Evaluator::default().evaluate_all(registry, &split).unwrap();

    let evaluated: Vec<&str> = batch.results.iter().map(|r| r.name()).collect();
    assert_eq!(evaluated, vec!["ols", "ridge"]);
    let failed: Vec<&str> = batch.failures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(failed, vec!["short", "short_on_test"]);
    assert!(batch.failures[1].reason.contains("predictions"), "{}", batch.failures[1].reason);
}

#[test]
fn test_single_evaluation_attributes_short_predictions() {
    let split = housing_split();
    let err = Evaluator::default()
        .evaluate_split(Box::new(TruncatingModel { from_rows: 10 }), &split, "short")
        .unwrap_err();
    match err {
        ModelBenchError::FitFailure { model, .. } => assert_eq!(model, "short"),
        other => panic!("expected FitFailure, got {:?}", other),
    }
}

#[test]
fn test_batch_aborts_on_model_config_error() {
    let split = housing_split();
    let registry = ModelRegistry::new()
        .with("ols", Box::new(LinearRegression::new()))
        .unwrap()
        .with("ridge", Box::new(RidgeRegression::new(-1.0)))
        .unwrap()
        .with("tree", Box::new(DecisionTreeRegressor::new()))
        .unwrap();
    assert!(matches!(
        Evaluator::default().evaluate_all(registry, &split),
        Err(ModelBenchError::ConfigError(_))
    ));

    let no_rounds = GradientBoostingRegressor::new(GradientBoostingConfig {
        n_estimators: 0,
        ..Default::default()
    });
    let registry = ModelRegistry::new()
        .with("empty_forest", Box::new(RandomForestRegressor::new(0)))
        .unwrap();
    assert!(matches!(
        Evaluator::default().evaluate_all(registry, &split),
        Err(ModelBenchError::ConfigError(_))
    ));
    assert!(matches!(
        Evaluator::default().evaluate_split(Box::new(no_rounds), &split, "boosting"),
        Err(ModelBenchError::ConfigError(_))
    ));
}

#[test]
fn test_batch_aborts_on_misaligned_split() {
    let split = housing_split();
    let broken = DatasetSplit {
        y_train: split.y_train.slice(s![1..]).to_owned(),
        ..split
    };
    let registry = ModelRegistry::new()
        .with("ols", Box::new(LinearRegression::new()))
        .unwrap();

    assert!(matches!(
        Evaluator::default().evaluate_all(registry, &broken),
        Err(ModelBenchError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_importance_follows_model_kind() {
    let split = housing_split();
    let registry = ModelRegistry::new()
        .with("ols", Box::new(LinearRegression::new()))
        .unwrap()
        .with("forest", Box::new(RandomForestRegressor::new(20).with_random_state(5)))
        .unwrap()
        .with(
            "voting",
            Box::new(
                VotingRegressor::new(vec![(
                    "ols".into(),
                    Box::new(LinearRegression::new()) as Box<dyn Regressor>,
                )])
                .unwrap(),
            ),
        )
        .unwrap();

    let batch = Evaluator::default().evaluate_all(registry, &split).unwrap();

    let ols = batch.get("ols").unwrap().importance().unwrap();
    assert_eq!(ols.kind, ImportanceKind::LinearCoefficient);
    let names: Vec<&str> = ols.features.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["rooms", "age", "income"]);

    let forest = batch.get("forest").unwrap().importance().unwrap();
    assert_eq!(forest.kind, ImportanceKind::TreeBased);
    assert_eq!(forest.top(1)[0].0, "income");

    assert!(batch.get("voting").unwrap().importance().is_none());
}

#[test]
fn test_cross_validation_does_not_touch_the_model() {
    let split = housing_split();
    let model = LinearRegression::new();
    let cv = Evaluator::new(EvaluationConfig::default().with_cv_folds(4))
        .unwrap()
        .cross_val_score(&model, &split.x_train, &split.y_train, "ols")
        .unwrap();

    assert_eq!(cv.n_folds(), 4);
    assert!(cv.mean_score > 0.95);
    assert!(matches!(
        model.predict(&split.x_test),
        Err(ModelBenchError::ModelNotFitted)
    ));
}
