use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, get, post, web};
use bytes::Bytes;
use serde_json::json;

use crate::classifier::TextClassifier;
use crate::config::{DEFAULT_MAX_PAYLOAD_SIZE, ServerConfig};
use crate::error::ApiError;
use crate::io_struct::{HealthResponse, PredictRequest};

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub classifier: Arc<dyn TextClassifier>,
    pub model_dir: String,
}

impl AppState {
    pub fn new(classifier: Arc<dyn TextClassifier>, model_dir: impl Into<String>) -> Self {
        Self {
            classifier,
            model_dir: model_dir.into(),
        }
    }
}

#[get("/health")]
pub async fn health(app_state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::ok(&app_state.model_dir))
}

#[post("/predict")]
pub async fn predict(
    body: Result<Bytes, actix_web::Error>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body = body.map_err(|e| {
        log::warn!("Failed to read request body: {}", e);
        if e.as_response_error().status_code() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::InvalidJson
        }
    })?;
    let request = PredictRequest::from_body(&body)?;

    let classifier = Arc::clone(&app_state.classifier);
    let prediction = web::block(move || classifier.classify(&request.text))
        .await
        .map_err(|e| {
            log::error!("Prediction task failed: {}", e);
            ApiError::Prediction {
                details: e.to_string(),
            }
        })?
        .map_err(|e| {
            log::error!("Prediction failed: {}", e);
            ApiError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(prediction))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Not found" }))
}

/// Registers the routes with the default body size limit. Callers provide
/// `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    configure_with_limit(DEFAULT_MAX_PAYLOAD_SIZE)(cfg)
}

pub fn configure_with_limit(max_payload_size: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::PayloadConfig::default().limit(max_payload_size))
            .service(health)
            .service(predict)
            .default_service(web::to(not_found));
    }
}

pub async fn startup(config: ServerConfig, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    log::info!("Starting server at {}:{}", config.host, config.port);

    let max_payload_size = config.max_payload_size;
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(configure_with_limit(max_payload_size))
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.bind((config.host, config.port))?.run().await
}
