//! Gaussian Naive Bayes classification.
//!
//! [`GaussianNaiveBayes::fit`] learns the mean and population standard deviation
//! of every feature within every class. [`GaussianNaiveBayes::predict`] then picks,
//! per example, the class with the highest summed log-density, and
//! [`accuracy_score`] reports the fraction of correct predictions.

pub mod bayes;
pub mod dataset;
pub mod error;

pub use bayes::{
    accuracy_score, gaussian_pdf, log_gaussian_pdf, ClassParameters, GaussianNaiveBayes, Label,
    ScoringConfig, REFERENCE_SCORE_OFFSET,
};
pub use dataset::LabeledData;
pub use error::{BayesError, Result};
