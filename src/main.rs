use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use log::LevelFilter;
use reply_classifier::config::{
    DEFAULT_HOST, DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_MODEL_DIR, DEFAULT_PORT,
};
use reply_classifier::{AppState, CandleClassifier, ServerConfig, TextClassifier, device, logging};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(
        long,
        env = "MODEL_DIR",
        default_value = DEFAULT_MODEL_DIR,
        help = "Directory holding config.json, tokenizer.json and the model weights"
    )]
    model_dir: String,

    #[arg(long, env = "HOST", default_value = DEFAULT_HOST, help = "Host address to bind the server to")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT, help = "Port number to listen on")]
    port: u16,

    #[arg(
        long,
        env = "WORKERS",
        help = "Number of HTTP worker threads (defaults to one per core)"
    )]
    workers: Option<usize>,

    #[arg(
        long,
        env = "MAX_PAYLOAD_SIZE",
        default_value_t = DEFAULT_MAX_PAYLOAD_SIZE,
        help = "Maximum size of a request body in bytes"
    )]
    max_payload_size: usize,

    #[arg(long, env = "LOG_LEVEL", default_value = "info", help = "Log level, overridden by RUST_LOG")]
    log_level: LevelFilter,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            model_dir: self.model_dir.clone(),
            workers: self.workers,
            max_payload_size: self.max_payload_size,
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_level);
    let config = args.server_config();

    let (device_kind, device) = device::select_device();
    log::info!("MODEL_DIR = {}  |  DEVICE = {}", config.model_dir, device_kind);

    log::info!("Loading pipeline (this may take a moment)...");
    let classifier = CandleClassifier::load(Path::new(&config.model_dir), &device).map_err(|e| {
        log::error!(
            "Failed to load model pipeline. Make sure MODEL_DIR exists and contains a saved model/tokenizer: {}",
            e
        );
        e
    })?;
    log::info!("Model loaded successfully. Labels: {}", classifier.labels().join(", "));

    let app_state = AppState::new(Arc::new(classifier), config.model_dir.clone());
    reply_classifier::startup(config, app_state).await?;
    Ok(())
}
