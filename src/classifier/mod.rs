//! Text classification behind a trait so handlers only see a read-only handle.
//!
//! [`transformer::CandleClassifier`] is the production implementation loaded
//! from a saved model directory; [`mock::MockClassifier`] is used by tests.

use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

pub mod mock;
pub mod transformer;

pub use mock::MockClassifier;
pub use transformer::CandleClassifier;

/// Number of decimal places kept in reported confidences.
pub const CONFIDENCE_DECIMALS: i32 = 6;

/// A loaded classifier. Implementations are immutable after construction and
/// shared across worker threads.
pub trait TextClassifier: Send + Sync {
    /// Class names in class-id order. Fixed for the lifetime of the handle.
    fn labels(&self) -> &[String];

    /// Per-class probabilities for `text`, in the same order as [`labels`](Self::labels).
    fn scores(&self, text: &str) -> Result<Vec<f32>, InferenceError>;

    fn classify(&self, text: &str) -> Result<Prediction, InferenceError> {
        let scores = self.scores(text)?;
        Prediction::from_scores(self.labels(), &scores)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreActivation {
    Softmax,
    Sigmoid,
}

impl ScoreActivation {
    pub fn apply(self, logits: &[f32]) -> Vec<f32> {
        match self {
            ScoreActivation::Softmax => softmax(logits),
            ScoreActivation::Sigmoid => logits.iter().map(|x| 1.0 / (1.0 + (-x).exp())).collect(),
        }
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

pub fn round_confidence(score: f32) -> f64 {
    let scale = 10f64.powi(CONFIDENCE_DECIMALS);
    (f64::from(score) * scale).round() / scale
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub confidence: f64,
}

/// Result of one classification: the best class plus every class score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
    pub all_scores: Vec<LabelScore>,
}

impl Prediction {
    /// Pairs `labels` with `scores`. The best class is picked on the raw
    /// scores; the first one wins a tie.
    pub fn from_scores(labels: &[String], scores: &[f32]) -> Result<Self, InferenceError> {
        if scores.len() != labels.len() {
            return Err(InferenceError::ScoreShape {
                expected: labels.len(),
                got: scores.len(),
            });
        }
        if scores.is_empty() {
            return Err(InferenceError::EmptyScores);
        }

        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = i;
            }
        }

        let all_scores = labels
            .iter()
            .zip(scores)
            .map(|(label, score)| LabelScore {
                label: label.clone(),
                confidence: round_confidence(*score),
            })
            .collect();

        Ok(Prediction {
            label: labels[best].clone(),
            confidence: round_confidence(scores[best]),
            all_scores,
        })
    }
}
