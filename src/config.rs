use std::collections::HashMap;

use serde::Deserialize;

use crate::classifier::ScoreActivation;

pub const DEFAULT_MODEL_DIR: &str = "models/distilbert_reply_classifier";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_dir: String,
    pub workers: Option<usize>,
    pub max_payload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_dir: DEFAULT_MODEL_DIR.to_string(),
            workers: None,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelArch {
    DistilBert,
    Bert,
}

/// The part of a saved model's `config.json` the service depends on.
///
/// The full file is also handed to the candle model config; this struct only
/// carries what the classification head and label table need.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub hidden_size: Option<usize>,
    #[serde(default)]
    pub dim: Option<usize>,
    #[serde(default = "default_max_position_embeddings")]
    pub max_position_embeddings: usize,
    #[serde(default)]
    pub id2label: Option<HashMap<String, String>>,
    #[serde(default)]
    pub num_labels: Option<usize>,
    #[serde(default)]
    pub problem_type: Option<String>,
}

fn default_max_position_embeddings() -> usize {
    512
}

impl ModelConfig {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(raw)?;
        if config.hidden_size.is_none() && config.dim.is_none() {
            return Err(serde::de::Error::missing_field("hidden_size"));
        }
        Ok(config)
    }

    /// Encoder width. DistilBERT configs name it `dim`, BERT configs
    /// `hidden_size`; the architecture's own key wins when both are present.
    pub fn hidden_width(&self) -> usize {
        let width = if self.model_type.as_deref() == Some("distilbert") {
            self.dim.or(self.hidden_size)
        } else {
            self.hidden_size.or(self.dim)
        };
        width.unwrap_or_default()
    }

    pub fn arch(&self) -> Result<ModelArch, String> {
        match self.model_type.as_deref() {
            Some("distilbert") => Ok(ModelArch::DistilBert),
            Some("bert") => Ok(ModelArch::Bert),
            Some(other) => Err(other.to_string()),
            None => Err("<missing>".to_string()),
        }
    }

    /// Class names ordered by class id.
    pub fn labels(&self) -> Result<Vec<String>, String> {
        let Some(id2label) = &self.id2label else {
            let n = self.num_labels.unwrap_or(2);
            return Ok((0..n).map(|i| format!("LABEL_{}", i)).collect());
        };
        if id2label.is_empty() {
            return Err("id2label is empty".to_string());
        }

        let mut entries = id2label
            .iter()
            .map(|(id, label)| {
                id.parse::<usize>()
                    .map(|id| (id, label.clone()))
                    .map_err(|_| format!("id2label key '{}' is not a class id", id))
            })
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|(id, _)| *id);

        for (expected, (id, _)) in entries.iter().enumerate() {
            if *id != expected {
                return Err(format!("id2label is missing class id {}", expected));
            }
        }
        Ok(entries.into_iter().map(|(_, label)| label).collect())
    }

    pub fn activation(&self, num_labels: usize) -> ScoreActivation {
        if num_labels == 1 || self.problem_type.as_deref() == Some("multi_label_classification") {
            ScoreActivation::Sigmoid
        } else {
            ScoreActivation::Softmax
        }
    }
}
