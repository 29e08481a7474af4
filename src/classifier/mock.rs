//! Mock classifier for testing

use super::{ScoreActivation, TextClassifier};
use crate::error::InferenceError;

/// Deterministic classifier whose scores depend only on the input bytes.
///
/// Texts containing the configured failure trigger return an error, and texts
/// containing the panic trigger panic, so callers can exercise both failure
/// paths of a real model.
pub struct MockClassifier {
    labels: Vec<String>,
    fail_on: Option<String>,
    panic_on: Option<String>,
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new(&["positive", "neutral", "negative"])
    }
}

impl MockClassifier {
    pub fn new(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            fail_on: None,
            panic_on: None,
        }
    }

    pub fn fail_on(mut self, trigger: impl Into<String>) -> Self {
        self.fail_on = Some(trigger.into());
        self
    }

    pub fn panic_on(mut self, trigger: impl Into<String>) -> Self {
        self.panic_on = Some(trigger.into());
        self
    }

    // FNV-1a
    fn fingerprint(text: &str) -> u64 {
        text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        })
    }
}

impl TextClassifier for MockClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn scores(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        if let Some(trigger) = &self.panic_on {
            if text.contains(trigger.as_str()) {
                panic!("mock classifier panicked on '{}'", trigger);
            }
        }
        if let Some(trigger) = &self.fail_on {
            if text.contains(trigger.as_str()) {
                return Err(candle_core::Error::Msg(format!(
                    "mock classifier failed on '{}'",
                    trigger
                ))
                .into());
            }
        }

        let hash = Self::fingerprint(text);
        let logits: Vec<f32> = (0..self.labels.len())
            .map(|i| ((hash >> ((i % 8) * 8)) & 0xff) as f32 / 32.0)
            .collect();
        Ok(ScoreActivation::Softmax.apply(&logits))
    }
}
