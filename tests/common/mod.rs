#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use reply_classifier::{AppState, MockClassifier, TextClassifier};

pub const TEST_MODEL_DIR: &str = "models/test_reply_classifier";
pub const FAIL_TRIGGER: &str = "[fail]";
pub const PANIC_TRIGGER: &str = "[panic]";

pub fn app_state(classifier: impl TextClassifier + 'static) -> web::Data<AppState> {
    web::Data::new(AppState::new(Arc::new(classifier), TEST_MODEL_DIR))
}

/// Three-class mock that errors on [`FAIL_TRIGGER`] and panics on [`PANIC_TRIGGER`].
pub fn default_state() -> web::Data<AppState> {
    app_state(
        MockClassifier::default()
            .fail_on(FAIL_TRIGGER)
            .panic_on(PANIC_TRIGGER),
    )
}
