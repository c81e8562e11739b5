use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gaussian_bayes::{
    accuracy_score, dataset, GaussianNaiveBayes, ScoringConfig, REFERENCE_SCORE_OFFSET,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gaussian-bayes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a Gaussian Naive Bayes classifier on a CSV file and classify another")]
struct Cli {
    /// Training data: label in the first column, features after it
    #[arg(long)]
    train: PathBuf,

    /// Data to classify, laid out like the training data unless --unlabeled is set
    #[arg(long)]
    test: PathBuf,

    /// Where to write the `ID,Label` predictions
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The first column of the test data is a row id rather than a label
    #[arg(long)]
    unlabeled: bool,

    /// Constant every class score starts at
    #[arg(long, default_value_t = REFERENCE_SCORE_OFFSET, value_parser = parse_finite)]
    score_offset: f64,

    /// Weight class scores by how often each class occurs in the training data
    #[arg(long)]
    class_priors: bool,

    /// Added to every per-class feature variance before fitting
    #[arg(long, default_value_t = 0.0, value_parser = parse_finite)]
    var_smoothing: f64,
}

fn parse_finite(value: &str) -> std::result::Result<f64, String> {
    let parsed: f64 = value.parse().map_err(|err| format!("{err}"))?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(format!("{value} is not a finite number"))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaussian_bayes=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let train = dataset::load_labeled(&cli.train)
        .with_context(|| format!("failed to read training data from {}", cli.train.display()))?;
    let classifier =
        GaussianNaiveBayes::fit_smoothed(&train.features, &train.labels, cli.var_smoothing)
            .context("failed to fit classifier")?
            .with_config(ScoringConfig {
                score_offset: cli.score_offset,
                use_class_priors: cli.class_priors,
            })
            .context("invalid scoring configuration")?;

    let (features, labels) = if cli.unlabeled {
        let features = dataset::load_unlabeled(&cli.test)
            .with_context(|| format!("failed to read test data from {}", cli.test.display()))?;
        (features, None)
    } else {
        let test = dataset::load_labeled(&cli.test)
            .with_context(|| format!("failed to read test data from {}", cli.test.display()))?;
        (test.features, Some(test.labels))
    };

    let predictions = classifier
        .predict(&features)
        .context("failed to classify test data")?;

    if let Some(labels) = labels {
        let accuracy =
            accuracy_score(&predictions, &labels).context("failed to score predictions")?;
        info!(accuracy, "evaluated predictions");
        println!("Accuracy: {:.4}", accuracy);
    }

    if let Some(output) = &cli.output {
        dataset::write_predictions(output, &predictions)
            .with_context(|| format!("failed to write predictions to {}", output.display()))?;
        info!(path = %output.display(), "wrote predictions");
    }

    println!("Done");

    Ok(())
}
