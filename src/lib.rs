pub mod classifier;
pub mod config;
pub mod device;
pub mod error;
pub mod io_struct;
pub mod logging;
pub mod server;

pub use classifier::{CandleClassifier, MockClassifier, Prediction, TextClassifier};
pub use config::ServerConfig;
pub use server::{AppState, configure, startup};
