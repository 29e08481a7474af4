mod common;

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{App, test};
use common::{FAIL_TRIGGER, PANIC_TRIGGER, TEST_MODEL_DIR, default_state};
use reply_classifier::classifier::Prediction;
use reply_classifier::error::MISSING_TEXT_MESSAGE;
use reply_classifier::server::configure_with_limit;
use reply_classifier::{MockClassifier, configure};
use serde_json::{Value, json};

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(App::new().app_data($state).configure(configure)).await
    };
}

fn predict_json(body: Value) -> test::TestRequest {
    test::TestRequest::post().uri("/predict").set_json(body)
}

fn assert_rejected(body: &Value) {
    assert!(body.get("error").is_some(), "missing error key in {}", body);
    assert!(body.get("label").is_none(), "unexpected label in {}", body);
}

#[actix_web::test]
async fn test_health() {
    let app = test_app!(default_state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "status": "ok", "model_dir": TEST_MODEL_DIR }));
}

#[actix_web::test]
async fn test_predict_returns_best_and_all_scores() {
    let app = test_app!(default_state());
    let resp = test::call_service(&app, predict_json(json!({ "text": "great product" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let prediction: Prediction = test::read_body_json(resp).await;
    let labels: Vec<&str> = prediction.all_scores.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["positive", "neutral", "negative"]);

    let max = prediction
        .all_scores
        .iter()
        .map(|s| s.confidence)
        .fold(f64::MIN, f64::max);
    assert_eq!(prediction.confidence, max);
    assert!(
        prediction
            .all_scores
            .iter()
            .any(|s| s.label == prediction.label && s.confidence == prediction.confidence)
    );

    let sum: f64 = prediction.all_scores.iter().map(|s| s.confidence).sum();
    assert!((sum - 1.0).abs() < 1e-4, "scores sum to {}", sum);
}

#[actix_web::test]
async fn test_scores_rounded_and_labels_fixed() {
    let app = test_app!(default_state());
    for text in ["great product", "terrible support", "ok I guess", "?", "ünïcödé ✓"] {
        let resp = test::call_service(&app, predict_json(json!({ "text": text })).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let prediction: Prediction = test::read_body_json(resp).await;
        assert_eq!(prediction.all_scores.len(), 3);
        for score in &prediction.all_scores {
            assert!(score.confidence >= 0.0);
            assert_eq!((score.confidence * 1e6).round() / 1e6, score.confidence);
        }
        let mut labels: Vec<String> = prediction.all_scores.into_iter().map(|s| s.label).collect();
        labels.sort();
        assert_eq!(labels, vec!["negative", "neutral", "positive"]);
    }
}

#[actix_web::test]
async fn test_predict_is_idempotent() {
    let app = test_app!(default_state());
    let first = test::call_and_read_body(&app, predict_json(json!({ "text": "same text" })).to_request()).await;
    let second = test::call_and_read_body(&app, predict_json(json!({ "text": "same text" })).to_request()).await;
    assert_eq!(first, second);
}

#[actix_web::test]
async fn test_input_alias() {
    let app = test_app!(default_state());
    let via_input = test::call_and_read_body(&app, predict_json(json!({ "input": "hello" })).to_request()).await;
    let via_text = test::call_and_read_body(&app, predict_json(json!({ "text": "hello" })).to_request()).await;
    assert_eq!(via_input, via_text);
}

#[actix_web::test]
async fn test_empty_text_exact_error() {
    let app = test_app!(default_state());
    let resp = test::call_service(&app, predict_json(json!({ "text": "" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": MISSING_TEXT_MESSAGE }));
    assert_eq!(body["error"], "Missing or empty 'text' field in JSON body.");
}

#[actix_web::test]
async fn test_blank_or_missing_text_rejected() {
    let app = test_app!(default_state());
    for body in [
        json!({ "text": "   " }),
        json!({ "text": "\n\t" }),
        json!({}),
        json!({ "message": "hello" }),
        json!({ "input": "" }),
        json!({ "text": 7 }),
    ] {
        let resp = test::call_service(&app, predict_json(body.clone()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {}", body);
        let body: Value = test::read_body_json(resp).await;
        assert_rejected(&body);
    }
}

#[actix_web::test]
async fn test_non_json_body_rejected() {
    let app = test_app!(default_state());
    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header(ContentType::plaintext())
        .set_payload("great product")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_rejected(&body);
    assert!(body["error"].as_str().unwrap().contains("JSON"));
}

#[actix_web::test]
async fn test_non_object_json_rejected() {
    let app = test_app!(default_state());
    for body in [json!("great product"), json!(["great product"]), json!(null)] {
        let resp = test::call_service(&app, predict_json(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("JSON"));
    }
}

#[actix_web::test]
async fn test_inference_failure_is_isolated() {
    let app = test_app!(default_state());
    let text = format!("this will {}", FAIL_TRIGGER);
    let resp = test::call_service(&app, predict_json(json!({ "text": text })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Prediction failed");
    assert!(body["details"].as_str().unwrap().contains("mock classifier failed"));
    assert!(body.get("label").is_none());

    let resp = test::call_service(&app, predict_json(json!({ "text": "great product" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_inference_panic_is_isolated() {
    let app = test_app!(default_state());
    let text = format!("this will {}", PANIC_TRIGGER);
    let resp = test::call_service(&app, predict_json(json!({ "text": text })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Prediction failed");
    assert!(body.get("details").is_some());

    let resp = test::call_service(&app, predict_json(json!({ "text": "still serving" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_labels_come_from_classifier() {
    let app = test_app!(common::app_state(MockClassifier::new(&["spam", "ham"])));
    let resp = test::call_service(&app, predict_json(json!({ "text": "buy now" })).to_request()).await;
    let prediction: Prediction = test::read_body_json(resp).await;
    let labels: Vec<&str> = prediction.all_scores.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["spam", "ham"]);
    assert!(labels.contains(&prediction.label.as_str()));
}

#[actix_web::test]
async fn test_unknown_route_returns_json_error() {
    let app = test_app!(default_state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/classify").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not found");
}

#[actix_web::test]
async fn test_large_body_is_classified() {
    let app = test_app!(default_state());
    let text = "great product ".repeat(20_000);
    assert!(text.len() > 256 * 1024);

    let resp = test::call_service(&app, predict_json(json!({ "text": text })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let prediction: Prediction = test::read_body_json(resp).await;
    assert_eq!(prediction.all_scores.len(), 3);
}

#[actix_web::test]
async fn test_body_over_limit_returns_json_error() {
    let app = test::init_service(
        App::new()
            .app_data(default_state())
            .configure(configure_with_limit(1024)),
    )
    .await;
    let text = "great product ".repeat(200);

    let resp = test::call_service(&app, predict_json(json!({ "text": text })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = test::read_body_json(resp).await;
    assert_rejected(&body);

    let resp = test::call_service(&app, predict_json(json!({ "text": "short" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
