//! Housing Model Comparison
//!
//! Evaluates linear, tree, boosting and ensemble regressors on a synthetic
//! housing dataset and prints the comparison table.
//!
//! Run with `RUST_LOG=modelbench=debug` to see per-fold scores.

use modelbench::prelude::*;
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const FEATURES: [&str; 6] = [
    "median_income",
    "house_age",
    "avg_rooms",
    "avg_bedrooms",
    "population",
    "latitude",
];

fn synthetic_housing(n: usize, seed: u64) -> anyhow::Result<DataFrame> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(n); FEATURES.len()];
    let mut target = Vec::with_capacity(n);

    for _ in 0..n {
        let income: f64 = rng.gen_range(0.5..15.0);
        let age: f64 = rng.gen_range(1.0..52.0);
        let rooms: f64 = rng.gen_range(2.0..9.0);
        let bedrooms: f64 = rooms * rng.gen_range(0.15..0.3);
        let population: f64 = rng.gen_range(100.0..5000.0);
        let latitude: f64 = rng.gen_range(32.5..42.0);

        let coastal = if latitude < 35.0 { 0.6 } else { 0.0 };
        let value = 0.45 * income + 0.04 * income * income - 0.006 * age + 0.12 * rooms
            - 0.3 * bedrooms
            - 0.00004 * population
            + coastal
            + rng.gen_range(-0.25..0.25);

        for (col, v) in columns
            .iter_mut()
            .zip([income, age, rooms, bedrooms, population, latitude])
        {
            col.push(v);
        }
        target.push(value.max(0.15));
    }

    let mut series: Vec<Column> = FEATURES
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new((*name).into(), values).into())
        .collect();
    series.push(Series::new("median_house_value".into(), target).into());
    Ok(DataFrame::new(series)?)
}

fn registry() -> modelbench::Result<ModelRegistry> {
    let weighted = WeightedEnsemble::new(vec![
        WeightedComponent::new("ridge", Box::new(RidgeRegression::new(1.0)), 0.3),
        WeightedComponent::new(
            "gbm",
            Box::new(GradientBoostingRegressor::new(GradientBoostingConfig::default())),
            0.7,
        ),
    ])?;

    let voting = VotingRegressor::new(vec![
        ("ridge".into(), Box::new(RidgeRegression::new(1.0)) as Box<dyn Regressor>),
        (
            "forest".into(),
            Box::new(RandomForestRegressor::new(50).with_max_depth(10).with_random_state(42)),
        ),
        (
            "gbm".into(),
            Box::new(GradientBoostingRegressor::new(GradientBoostingConfig::default())),
        ),
    ])?
    .with_aggregation(AggregationMethod::Median);

    let stacking = StackingRegressor::new(vec![
        ("lasso".into(), Box::new(LassoRegression::new(0.01)) as Box<dyn Regressor>),
        (
            "tree".into(),
            Box::new(DecisionTreeRegressor::new().with_max_depth(8)),
        ),
        (
            "gbm".into(),
            Box::new(GradientBoostingRegressor::new(GradientBoostingConfig::default())),
        ),
    ])?;

    ModelRegistry::new()
        .with("Linear Regression", Box::new(LinearRegression::new()))?
        .with("Ridge Regression", Box::new(RidgeRegression::new(1.0)))?
        .with("Lasso Regression", Box::new(LassoRegression::new(0.01)))?
        .with(
            "Polynomial Regression",
            Box::new(Pipeline::polynomial_regression(2, 1.0)),
        )?
        .with(
            "Decision Tree",
            Box::new(DecisionTreeRegressor::new().with_max_depth(8)),
        )?
        .with(
            "Random Forest",
            Box::new(
                RandomForestRegressor::new(100)
                    .with_max_depth(12)
                    .with_max_features(MaxFeatures::Sqrt)
                    .with_random_state(42),
            ),
        )?
        .with(
            "Gradient Boosting",
            Box::new(GradientBoostingRegressor::new(GradientBoostingConfig::default())),
        )?
        .with("Weighted Ensemble", Box::new(weighted))?
        .with("Voting Ensemble", Box::new(voting))?
        .with("Stacking Ensemble", Box::new(stacking))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modelbench=info".into()),
        )
        .init();

    let df = synthetic_housing(1000, 7)?;
    println!("Dataset: {} samples, {} features\n", df.height(), FEATURES.len());

    let (x, y) = FeatureTable::features_and_target(&df, "median_house_value")?;
    let split = train_test_split(&x, &y, 0.2, 42)?;

    let evaluator = Evaluator::new(EvaluationConfig::default().with_parallel_folds(true))?;
    let batch = evaluator.evaluate_all(registry()?, &split)?;

    let table = batch.comparison().sorted_by_r2();
    println!("{}", table);

    if let Some(best) = table.best() {
        println!("Best model: {} (R² = {:.4})", best.model, best.r2);
    }

    if let Some(importance) = batch
        .get("Random Forest")
        .and_then(|result| result.importance())
    {
        println!("\nRandom Forest feature importances:");
        for (feature, value) in importance.top(FEATURES.len()) {
            println!("  {:<20} {:>8.4}", feature, value);
        }
    }

    Ok(())
}
