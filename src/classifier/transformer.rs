//! Sequence classification on top of the candle BERT-family encoders.

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{Linear, VarBuilder, linear};
use candle_transformers::models::{bert, distilbert};
use tokenizers::{Tokenizer, TruncationParams};

use super::{ScoreActivation, TextClassifier};
use crate::config::{ModelArch, ModelConfig};
use crate::error::{InferenceError, LoadError};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";

enum Encoder {
    /// `distilbert.*` weights, then `pre_classifier` + ReLU on the first token.
    DistilBert {
        model: distilbert::DistilBertModel,
        pre_classifier: Linear,
    },
    /// `bert.*` weights, then the tanh pooler on the first token.
    Bert { model: bert::BertModel, pooler: Linear },
}

/// Tokenizer, encoder and classification head loaded from a saved model
/// directory and bound to one device.
pub struct CandleClassifier {
    tokenizer: Tokenizer,
    encoder: Encoder,
    classifier: Linear,
    labels: Vec<String>,
    activation: ScoreActivation,
    device: Device,
}

impl CandleClassifier {
    pub fn load(model_dir: &Path, device: &Device) -> Result<Self, LoadError> {
        if !model_dir.is_dir() {
            return Err(LoadError::MissingDirectory(model_dir.to_path_buf()));
        }

        let config_path = model_dir.join(CONFIG_FILE);
        let config_err = |reason: String| LoadError::Config {
            path: config_path.clone(),
            reason,
        };
        let raw_config = std::fs::read_to_string(&config_path).map_err(|e| config_err(e.to_string()))?;
        let config = ModelConfig::parse(&raw_config).map_err(|e| config_err(e.to_string()))?;
        let arch = config.arch().map_err(LoadError::UnsupportedModel)?;
        let labels = config.labels().map_err(config_err)?;
        let activation = config.activation(labels.len());

        let tokenizer = load_tokenizer(&model_dir.join(TOKENIZER_FILE), config.max_position_embeddings)?;

        let (weights_path, vb) = load_weights(model_dir, device)?;
        let weights_err = |source| LoadError::Weights {
            path: weights_path.clone(),
            source,
        };

        let hidden = config.hidden_width();
        let encoder = match arch {
            ModelArch::DistilBert => {
                let model_config: distilbert::Config =
                    serde_json::from_str(&raw_config).map_err(|e| config_err(e.to_string()))?;
                let model = distilbert::DistilBertModel::load(vb.clone(), &model_config)
                    .map_err(weights_err)?;
                let pre_classifier =
                    linear(hidden, hidden, vb.pp("pre_classifier")).map_err(weights_err)?;
                Encoder::DistilBert {
                    model,
                    pre_classifier,
                }
            }
            ModelArch::Bert => {
                let model_config: bert::Config =
                    serde_json::from_str(&raw_config).map_err(|e| config_err(e.to_string()))?;
                let model = bert::BertModel::load(vb.clone(), &model_config).map_err(weights_err)?;
                let pooler = linear(hidden, hidden, vb.pp("bert.pooler.dense")).map_err(weights_err)?;
                Encoder::Bert { model, pooler }
            }
        };
        let classifier = linear(hidden, labels.len(), vb.pp("classifier")).map_err(weights_err)?;

        log::debug!(
            "Loaded {:?} classifier from {} with {} labels",
            arch,
            weights_path.display(),
            labels.len()
        );

        Ok(Self {
            tokenizer,
            encoder,
            classifier,
            labels,
            activation,
            device: device.clone(),
        })
    }

    fn logits(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| InferenceError::Tokenization(e.to_string()))?;
        let ids = encoding.get_ids();
        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;

        let features = match &self.encoder {
            Encoder::DistilBert {
                model,
                pre_classifier,
            } => {
                // Nonzero entries are masked out; a single unpadded sequence masks nothing.
                let mask = Tensor::zeros((ids.len(), ids.len()), DType::U8, &self.device)?;
                let hidden = model.forward(&input_ids, &mask)?;
                pre_classifier.forward(&hidden.i((.., 0))?)?.relu()?
            }
            Encoder::Bert { model, pooler } => {
                let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
                let attention_mask =
                    Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;
                let hidden = model.forward(&input_ids, &type_ids, Some(&attention_mask))?;
                pooler.forward(&hidden.i((.., 0))?)?.tanh()?
            }
        };

        let logits = self
            .classifier
            .forward(&features)?
            .squeeze(0)?
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()?;
        Ok(logits)
    }
}

impl TextClassifier for CandleClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn scores(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        let logits = self.logits(text)?;
        Ok(self.activation.apply(&logits))
    }
}

/// Loads `tokenizer.json` with padding off and truncation at `max_length`
/// tokens, special tokens included.
fn load_tokenizer(path: &Path, max_length: usize) -> Result<Tokenizer, LoadError> {
    let tokenizer_err = |reason: String| LoadError::Tokenizer {
        path: path.to_path_buf(),
        reason,
    };
    if !path.is_file() {
        return Err(tokenizer_err("file not found".to_string()));
    }

    let mut tokenizer = Tokenizer::from_file(path).map_err(|e| tokenizer_err(e.to_string()))?;
    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| tokenizer_err(e.to_string()))?;
    Ok(tokenizer)
}

/// Prefers safetensors and falls back to a PyTorch checkpoint.
fn load_weights(
    model_dir: &Path,
    device: &Device,
) -> Result<(PathBuf, VarBuilder<'static>), LoadError> {
    let safetensors = model_dir.join(SAFETENSORS_FILE);
    if safetensors.is_file() {
        // SAFETY: the weights file is only read and is not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[safetensors.as_path()], DType::F32, device)
        }
        .map_err(|source| LoadError::Weights {
            path: safetensors.clone(),
            source,
        })?;
        return Ok((safetensors, vb));
    }

    let pytorch = model_dir.join(PYTORCH_FILE);
    if pytorch.is_file() {
        let vb = VarBuilder::from_pth(&pytorch, DType::F32, device).map_err(|source| {
            LoadError::Weights {
                path: pytorch.clone(),
                source,
            }
        })?;
        return Ok((pytorch, vb));
    }

    Err(LoadError::MissingWeights(model_dir.to_path_buf()))
}
