//! Error types for fitting, predicting and scoring.

use thiserror::Error;

use crate::bayes::Label;

pub type Result<T> = std::result::Result<T, BayesError>;

#[derive(Error, Debug)]
pub enum BayesError {
    #[error("dataset is empty")]
    EmptyDataset,

    #[error("examples must have at least one feature")]
    EmptyFeatureVector,

    #[error("example {row} has {actual} features, expected {expected}")]
    InconsistentFeatureLength {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("example {row} has {actual} features but the model was trained on {expected}")]
    UnknownFeatureLength {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A feature is constant within a class, so its density is undefined.
    #[error("feature {feature} has zero variance for class {label}")]
    DegenerateVariance { label: Label, feature: usize },

    #[error("score for class {label} is not finite")]
    NonFiniteScore { label: Label },

    #[error("model has no trained classes")]
    NoTrainedClasses,

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("feature {feature} of example {row} is not a finite number")]
    NonFiniteFeature { row: usize, feature: usize },

    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
