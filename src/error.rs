use std::path::PathBuf;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

/// Failures while building the classifier at startup. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("model directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("invalid model config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("unsupported model type '{0}', expected 'distilbert' or 'bert'")]
    UnsupportedModel(String),

    #[error("failed to load tokenizer {}: {reason}", .path.display())]
    Tokenizer { path: PathBuf, reason: String },

    #[error("no model.safetensors or pytorch_model.bin found in {}", .0.display())]
    MissingWeights(PathBuf),

    #[error("failed to build model from {}: {source}", .path.display())]
    Weights {
        path: PathBuf,
        #[source]
        source: candle_core::Error,
    },

    #[error("failed to initialize {device} device: {source}")]
    Device {
        device: String,
        #[source]
        source: candle_core::Error,
    },
}

/// Failures of a single classification call.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    #[error("tensor operation failed: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("model produced {got} scores for {expected} labels")]
    ScoreShape { expected: usize, got: usize },

    #[error("model produced no scores")]
    EmptyScores,
}

pub const INVALID_JSON_MESSAGE: &str = "Request must be JSON with {'text': '...'}";
pub const MISSING_TEXT_MESSAGE: &str = "Missing or empty 'text' field in JSON body.";

/// Errors surfaced to HTTP clients by the route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}", INVALID_JSON_MESSAGE)]
    InvalidJson,

    #[error("{}", MISSING_TEXT_MESSAGE)]
    MissingText,

    #[error("Request body is larger than the configured limit.")]
    PayloadTooLarge,

    #[error("Prediction failed")]
    Prediction { details: String },
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson | ApiError::MissingText => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Prediction { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Prediction { details } => json!({
                "error": self.to_string(),
                "details": details,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<InferenceError> for ApiError {
    fn from(e: InferenceError) -> Self {
        ApiError::Prediction {
            details: e.to_string(),
        }
    }
}
