//! Fruit classification from a small CSV upload.
//!
//! Walks the whole session flow: load a table with text labels, inspect the
//! analysis and the recommended architecture, train the baseline model and
//! predict a few unseen samples.
//!
//! Run with: cargo run --example fruit_classifier
//! More logs: RUST_LOG=tabular_nn=debug cargo run --example fruit_classifier

use std::error::Error;
use tabular_nn::config::PipelineConfig;
use tabular_nn::dataset::RawValue;
use tabular_nn::model::LinearModelBuilder;
use tabular_nn::preprocessing::Prediction;
use tabular_nn::session::Session;
use tracing_subscriber::EnvFilter;

/// weight (g), diameter (cm), color, fruit
fn fruit_csv() -> String {
    let mut csv = String::from("weight,diameter,color,fruit\n");
    for i in 0..40 {
        let jitter = (i % 7) as f64;
        let (weight, diameter, color, fruit) = match i % 3 {
            0 => (150.0 + jitter * 4.0, 7.0 + jitter * 0.2, "red", "apple"),
            1 => (120.0 + jitter * 3.0, 3.5 + jitter * 0.1, "yellow", "banana"),
            _ => (8.0 + jitter, 1.5 + jitter * 0.05, "purple", "grape"),
        };
        csv.push_str(&format!("{},{},{},{}\n", weight, diameter, color, fruit));
    }
    csv
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut session = Session::new(PipelineConfig::new().with_seed(42))?;
    let descriptor = session.load_csv(&fruit_csv(), "fruit")?;
    println!(
        "{} samples, features {:?}, task {}, labels {:?}",
        descriptor.n_samples,
        descriptor.feature_names,
        descriptor.task,
        descriptor.label_names()
    );

    let rec = session.recommendation()?.clone();
    println!(
        "recommended: layers {:?}, {} / {}, lr {}, batch {}, epochs {}, loss {}",
        rec.neurons_per_layer,
        rec.activation,
        rec.output_activation,
        rec.learning_rate,
        rec.batch_size,
        rec.epochs,
        rec.recommended_loss()
    );

    let builder = LinearModelBuilder::new().with_learning_rate(0.1);
    let report = session.train(&builder, &mut |log| {
        if log.epoch % 50 == 0 {
            println!(
                "epoch {:>4}  loss {:.4}  accuracy {:.3}",
                log.epoch,
                log.loss,
                log.accuracy.unwrap_or(f64::NAN)
            );
        }
    })?;
    println!(
        "finished after {} epochs, final loss {:.4}",
        report.summary.epochs_run, report.summary.final_loss
    );
    if let Some(eval) = &report.evaluation {
        println!(
            "test loss {:.4}, test accuracy {:.3}",
            eval.loss,
            eval.accuracy.unwrap_or(f64::NAN)
        );
    }

    let samples = [
        (160.0, 7.5, "red"),
        (125.0, 3.8, "yellow"),
        (10.0, 1.6, "purple"),
    ];
    for (weight, diameter, color) in samples {
        let raw = [
            RawValue::Number(weight),
            RawValue::Number(diameter),
            RawValue::Text(color.to_string()),
        ];
        match session.predict(&raw)? {
            Prediction::Class { label, score, .. } => {
                println!("{:>6} g, {:>4} cm -> {} ({:.3})", weight, diameter, label, score)
            }
            Prediction::Value(v) => println!("{:>6} g, {:>4} cm -> {:.3}", weight, diameter, v),
        }
    }

    Ok(())
}
