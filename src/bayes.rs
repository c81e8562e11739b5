use std::{
    collections::{btree_map::Entry, BTreeMap},
    f64::consts::PI,
};

use tracing::{debug, info};

use crate::error::{BayesError, Result};

pub type Label = i64;

/// Constant the reference scoring formula starts every class score at.
///
/// It is added to every class alike, so it shifts scores without changing which
/// class wins.
pub const REFERENCE_SCORE_OFFSET: f64 = 1.0;

/// How class scores are accumulated at prediction time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Value each class score starts at before log-densities are added. Must be finite.
    pub score_offset: f64,
    /// Add `ln(count / total)` of each class to its score instead of assuming a uniform prior.
    pub use_class_priors: bool,
}

impl ScoringConfig {
    fn validate(&self) -> Result<()> {
        if !self.score_offset.is_finite() {
            return Err(BayesError::InvalidParameter {
                name: "score_offset",
                value: self.score_offset,
            });
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            score_offset: REFERENCE_SCORE_OFFSET,
            use_class_priors: false,
        }
    }
}

/// Per-feature Gaussian parameters learned for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassParameters {
    pub means: Vec<f64>,
    pub stddevs: Vec<f64>,
    /// Number of training examples the parameters were estimated from.
    pub count: usize,
}

impl ClassParameters {
    /// Estimates population mean and standard deviation (divisor = count) of every feature.
    fn estimate(examples: &[&[f64]], n_features: usize, var_smoothing: f64) -> Self {
        let count = examples.len() as f64;

        // Calculate mean values for each feature:
        let means: Vec<f64> = (0..n_features)
            .map(|feature| examples.iter().map(|example| example[feature]).sum::<f64>() / count)
            .collect();

        // Calculate standard deviations for each feature:
        let stddevs = means
            .iter()
            .enumerate()
            .map(|(feature, &mean)| {
                // A constant column is exactly zero, even when the mean picked up rounding error.
                let first = examples[0][feature];
                let variance = if examples.iter().all(|example| example[feature] == first) {
                    0.0
                } else {
                    examples
                        .iter()
                        .map(|example| (example[feature] - mean).powi(2))
                        .sum::<f64>()
                        / count
                };
                (variance + var_smoothing).sqrt()
            })
            .collect();

        ClassParameters {
            means,
            stddevs,
            count: examples.len(),
        }
    }
}

/// Gaussian probability density function.
pub fn gaussian_pdf(x: f64, mean: f64, stddev: f64) -> f64 {
    (1.0 / (stddev * (2.0 * PI).sqrt())) * (-(x - mean).powi(2) / (2.0 * stddev.powi(2))).exp()
}

/// Natural log of [`gaussian_pdf`], computed without leaving log space.
///
/// Stays finite far into the tails, where the density itself underflows to zero.
pub fn log_gaussian_pdf(x: f64, mean: f64, stddev: f64) -> f64 {
    -((x - mean) / stddev).powi(2) / 2.0 - (stddev * (2.0 * PI).sqrt()).ln()
}

/// A fitted Gaussian Naive Bayes model.
///
/// The model is immutable once built; refitting means building a new one.
#[derive(Debug, Clone)]
pub struct GaussianNaiveBayes {
    classes: BTreeMap<Label, ClassParameters>,
    n_features: usize,
    n_examples: usize,
    config: ScoringConfig,
}

impl GaussianNaiveBayes {
    /// Learns per-class feature means and standard deviations from a labeled dataset.
    ///
    /// Fails with [`BayesError::DegenerateVariance`] if a feature is constant within a class.
    pub fn fit<E: AsRef<[f64]>>(features: &[E], labels: &[Label]) -> Result<Self> {
        Self::fit_smoothed(features, labels, 0.0)
    }

    /// Like [`GaussianNaiveBayes::fit`], but adds `var_smoothing` to every variance first.
    ///
    /// A positive smoothing value makes constant features usable.
    pub fn fit_smoothed<E: AsRef<[f64]>>(
        features: &[E],
        labels: &[Label],
        var_smoothing: f64,
    ) -> Result<Self> {
        if !var_smoothing.is_finite() || var_smoothing < 0.0 {
            return Err(BayesError::InvalidParameter {
                name: "var_smoothing",
                value: var_smoothing,
            });
        }

        let n_features = validate_dataset(features, labels)?;

        // Divide the dataset into classes:
        let mut class_examples: BTreeMap<Label, Vec<&[f64]>> = BTreeMap::new();
        for (example, &label) in features.iter().zip(labels) {
            match class_examples.entry(label) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(Vec::new()),
            }
            .push(example.as_ref());
        }

        let classes: BTreeMap<Label, ClassParameters> = class_examples
            .iter()
            .map(|(&label, examples)| {
                let params = ClassParameters::estimate(examples, n_features, var_smoothing);
                debug!(
                    label,
                    count = params.count,
                    means = ?params.means,
                    stddevs = ?params.stddevs,
                    "estimated class parameters"
                );
                (label, params)
            })
            .collect();

        check_variances(&classes)?;

        info!(
            classes = classes.len(),
            features = n_features,
            examples = labels.len(),
            "fitted gaussian naive bayes"
        );

        Ok(GaussianNaiveBayes {
            classes,
            n_features,
            n_examples: labels.len(),
            config: ScoringConfig::default(),
        })
    }

    /// Builds a model from already known parameters.
    ///
    /// An empty map is accepted; predicting with such a model fails with
    /// [`BayesError::NoTrainedClasses`].
    pub fn from_parameters(
        classes: BTreeMap<Label, ClassParameters>,
        config: ScoringConfig,
    ) -> Result<Self> {
        config.validate()?;

        let n_features = classes
            .values()
            .next()
            .map(|params| params.means.len())
            .unwrap_or(0);

        for (row, params) in classes.values().enumerate() {
            if params.count == 0 {
                return Err(BayesError::InvalidParameter {
                    name: "count",
                    value: 0.0,
                });
            }
            for actual in [params.means.len(), params.stddevs.len()] {
                if actual != n_features {
                    return Err(BayesError::InconsistentFeatureLength {
                        row,
                        expected: n_features,
                        actual,
                    });
                }
            }
        }
        if !classes.is_empty() && n_features == 0 {
            return Err(BayesError::EmptyFeatureVector);
        }
        for params in classes.values() {
            if let Some(&mean) = params.means.iter().find(|mean| !mean.is_finite()) {
                return Err(BayesError::InvalidParameter { name: "means", value: mean });
            }
        }
        check_variances(&classes)?;

        let n_examples = classes.values().map(|params| params.count).sum();
        Ok(GaussianNaiveBayes {
            classes,
            n_features,
            n_examples,
            config,
        })
    }

    /// Returns the model with a different scoring configuration.
    ///
    /// Fails with [`BayesError::InvalidParameter`] if the score offset is not finite.
    pub fn with_config(mut self, config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        if config.score_offset != REFERENCE_SCORE_OFFSET {
            debug!(score_offset = config.score_offset, "using non-reference score offset");
        }
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Trained class labels in ascending order.
    pub fn classes(&self) -> impl Iterator<Item = Label> + '_ {
        self.classes.keys().copied()
    }

    pub fn parameters(&self, label: Label) -> Option<&ClassParameters> {
        self.classes.get(&label)
    }

    /// Predicts a label for every example, in input order.
    ///
    /// All examples are validated before any of them is scored.
    pub fn predict<E: AsRef<[f64]>>(&self, features: &[E]) -> Result<Vec<Label>> {
        if self.classes.is_empty() {
            return Err(BayesError::NoTrainedClasses);
        }
        for (row, example) in features.iter().enumerate() {
            self.check_example(row, example.as_ref())?;
        }

        let predictions = features
            .iter()
            .map(|example| self.best_class(example.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        info!(examples = predictions.len(), "predicted labels");
        Ok(predictions)
    }

    /// Predicts the label of a single example.
    pub fn predict_one(&self, example: &[f64]) -> Result<Label> {
        if self.classes.is_empty() {
            return Err(BayesError::NoTrainedClasses);
        }
        self.check_example(0, example)?;
        self.best_class(example)
    }

    /// Raw score of every class for one example, in ascending label order.
    pub fn scores(&self, example: &[f64]) -> Result<Vec<(Label, f64)>> {
        if self.classes.is_empty() {
            return Err(BayesError::NoTrainedClasses);
        }
        self.check_example(0, example)?;
        self.classes
            .iter()
            .map(|(&label, params)| {
                self.class_score(label, params, example)
                    .map(|score| (label, score))
            })
            .collect()
    }

    fn check_example(&self, row: usize, example: &[f64]) -> Result<()> {
        if example.len() != self.n_features {
            return Err(BayesError::UnknownFeatureLength {
                row,
                expected: self.n_features,
                actual: example.len(),
            });
        }
        check_finite(row, example)
    }

    /// Classes are visited in ascending label order and only a strictly greater score
    /// replaces the current best, so ties go to the lowest label.
    fn best_class(&self, example: &[f64]) -> Result<Label> {
        let mut best: Option<(Label, f64)> = None;
        for (&label, params) in &self.classes {
            let score = self.class_score(label, params, example)?;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((label, score));
            }
        }

        best.map(|(label, _)| label).ok_or(BayesError::NoTrainedClasses)
    }

    /// Score offset (plus log-prior if enabled) plus the log-density of every feature.
    fn class_score(&self, label: Label, params: &ClassParameters, example: &[f64]) -> Result<f64> {
        let mut score = self.config.score_offset;
        if self.config.use_class_priors {
            score += (params.count as f64 / self.n_examples as f64).ln();
        }

        for ((&x, &mean), &stddev) in example.iter().zip(&params.means).zip(&params.stddevs) {
            score += log_gaussian_pdf(x, mean, stddev);
        }

        // Only reachable when the scaled distance overflows, e.g. with subnormal stddevs.
        if !score.is_finite() {
            return Err(BayesError::NonFiniteScore { label });
        }
        Ok(score)
    }
}

/// Fraction of positions where the prediction matches the actual label.
pub fn accuracy_score<T: PartialEq>(predicted: &[T], actual: &[T]) -> Result<f64> {
    if predicted.len() != actual.len() {
        return Err(BayesError::LengthMismatch {
            expected: actual.len(),
            actual: predicted.len(),
        });
    }
    if predicted.is_empty() {
        return Err(BayesError::EmptyDataset);
    }

    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(prediction, label)| prediction == label)
        .count();

    Ok(correct as f64 / predicted.len() as f64)
}

/// Checks the dataset shape and returns the shared feature count.
fn validate_dataset<E: AsRef<[f64]>>(features: &[E], labels: &[Label]) -> Result<usize> {
    let first = features.first().ok_or(BayesError::EmptyDataset)?;
    if features.len() != labels.len() {
        return Err(BayesError::LengthMismatch {
            expected: features.len(),
            actual: labels.len(),
        });
    }

    let n_features = first.as_ref().len();
    if n_features == 0 {
        return Err(BayesError::EmptyFeatureVector);
    }

    for (row, example) in features.iter().enumerate() {
        let example = example.as_ref();
        if example.len() != n_features {
            return Err(BayesError::InconsistentFeatureLength {
                row,
                expected: n_features,
                actual: example.len(),
            });
        }
        check_finite(row, example)?;
    }

    Ok(n_features)
}

fn check_finite(row: usize, example: &[f64]) -> Result<()> {
    match example.iter().position(|value| !value.is_finite()) {
        Some(feature) => Err(BayesError::NonFiniteFeature { row, feature }),
        None => Ok(()),
    }
}

fn check_variances(classes: &BTreeMap<Label, ClassParameters>) -> Result<()> {
    for (&label, params) in classes {
        if let Some(feature) = params
            .stddevs
            .iter()
            .position(|&stddev| !(stddev > 0.0 && stddev.is_finite()))
        {
            return Err(BayesError::DegenerateVariance { label, feature });
        }
    }
    Ok(())
}
