// Runs the full pipeline on synthetic data and prints per-stage timings.
//
// Usage:
//   cargo run --package benchmarks --release -- [n_rows] [n_features]
//   RUST_LOG=tabular_nn=debug cargo run --package benchmarks

use benchmarks::{StageTimings, SyntheticTable, SyntheticTarget};
use std::error::Error;
use tabular_nn::architecture::recommend_for;
use tabular_nn::dataset::{analyze, parse_csv};
use tabular_nn::model::{LinearModelBuilder, ModelBuilder};
use tabular_nn::preprocessing::{train_test_split, CategoricalPolicy, Preprocessor};
use tabular_nn::trainer::Trainer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn run(table: &SyntheticTable) -> Result<(), Box<dyn Error>> {
    info!(
        rows = table.n_rows,
        features = table.n_features,
        kind = ?table.target,
        "running pipeline"
    );
    let csv = table.to_csv();
    let mut timings = StageTimings::new();

    let raw = timings.time("parse", || parse_csv(&csv))?;
    let descriptor = timings.time("analyze", || analyze(&raw, table.target_name()))?;
    let (preprocessor, encoded) = timings.time("encode + normalize", || {
        Preprocessor::fit(&raw, descriptor, CategoricalPolicy::Zero)
    })?;
    drop(raw);
    let split = timings.time("split", || {
        train_test_split(encoded.features, encoded.targets, 0.2, Some(table.seed))
    })?;
    let recommendation = timings.time("recommend", || recommend_for(preprocessor.descriptor()));

    let spec = recommendation
        .model_spec(preprocessor.descriptor().n_features())
        .build()?;
    let mut model = LinearModelBuilder::new()
        .with_learning_rate(0.05)
        .build(&spec)
        .map_err(|e| e as Box<dyn Error>)?;
    let trainer = Trainer::from_recommendation(&recommendation).with_class_values(
        preprocessor
            .target_encoder()
            .encoding()
            .class_values(),
    );
    let report = timings.time("train + evaluate", || {
        trainer.fit(model.as_mut(), &split, &mut |_| {})
    })?;

    println!(
        "{} rows, {} features, task {}, layers {:?}, loss {}",
        table.n_rows,
        table.n_features,
        recommendation.task,
        recommendation.neurons_per_layer,
        trainer.loss()
    );
    println!(
        "reconcile: {}, final loss {:.5}, test {:?}",
        report.reconciliation, report.summary.final_loss, report.evaluation
    );
    print!("{}", timings.report());
    println!();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let n_rows: usize = args.next().map(|a| a.parse()).transpose()?.unwrap_or(5_000);
    let n_features: usize = args.next().map(|a| a.parse()).transpose()?.unwrap_or(8);

    println!("tabular-nn pipeline timings\n");
    run(&SyntheticTable::new(n_rows, n_features, SyntheticTarget::Classes(3)))?;
    run(&SyntheticTable::new(n_rows, n_features, SyntheticTarget::Classes(2)))?;
    run(&SyntheticTable::new(n_rows, n_features, SyntheticTarget::Regression))?;
    Ok(())
}
