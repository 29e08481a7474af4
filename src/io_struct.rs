use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Body keys checked for the text to classify, in order of precedence.
pub const TEXT_KEYS: [&str; 2] = ["text", "input"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictRequest {
    pub text: String,
}

impl PredictRequest {
    /// Validates a raw `/predict` body.
    ///
    /// The body must be a JSON object. The text is taken from the first key in
    /// [`TEXT_KEYS`] holding a truthy value, and must be a string that is not
    /// blank. The text is returned untrimmed.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)?;
        let Value::Object(fields) = value else {
            return Err(ApiError::InvalidJson);
        };

        let selected = TEXT_KEYS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find(|value| is_truthy(value));

        match selected {
            Some(Value::String(text)) if !text.trim().is_empty() => Ok(PredictRequest {
                text: text.clone(),
            }),
            _ => Err(ApiError::MissingText),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_dir: String,
}

impl HealthResponse {
    pub fn ok(model_dir: &str) -> Self {
        HealthResponse {
            status: "ok".to_string(),
            model_dir: model_dir.to_string(),
        }
    }
}
