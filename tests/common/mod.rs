#![allow(dead_code)]

use ai_art_detector::api::{self, AppState, RouterOptions};
use ai_art_detector::classifier::{Classification, Classifier, ClassifierError};
use ai_art_detector::storage::FeedbackStore;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

/// In-process classifier that records what it was asked to classify
pub struct StubClassifier {
    pub result: Option<Classification>,
    pub seen: Mutex<Vec<Vec<u8>>>,
}

impl StubClassifier {
    pub fn answering(label: &str, score: f64) -> Self {
        Self {
            result: Some(Classification::new(label, score)),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, image: &[u8]) -> Result<Classification, ClassifierError> {
        self.seen.lock().unwrap().push(image.to_vec());
        self.result.clone().ok_or(ClassifierError::Upstream {
            status: 503,
            message: "secret upstream detail".to_string(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub classifier: Arc<StubClassifier>,
    pub feedback_store: Arc<FeedbackStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_classifier(StubClassifier::answering("AI", 0.9731))
    }

    pub fn with_classifier(classifier: StubClassifier) -> Self {
        Self::with_store(classifier, FeedbackStore::in_memory())
    }

    pub fn with_store(classifier: StubClassifier, feedback_store: FeedbackStore) -> Self {
        let classifier = Arc::new(classifier);
        let feedback_store = Arc::new(feedback_store);
        let state = AppState {
            classifier: classifier.clone(),
            feedback_store: feedback_store.clone(),
        };

        Self {
            router: api::router(
                state,
                RouterOptions {
                    max_body_bytes: 64 * 1024,
                    cors: false,
                },
            ),
            classifier,
            feedback_store,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn post(&self, uri: &str, body: &str) -> TestResponse {
        self.request(Method::POST, uri, body).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, "").await
    }

    pub async fn submit_feedback(&self, value: &str) -> TestResponse {
        let body = serde_json::json!({ "feedback": value }).to_string();
        self.post("/core/submit-feedback/", &body).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body is not JSON")
    }

    pub fn error(&self) -> String {
        let json = self.json();
        assert_eq!(json["success"], false);
        json["error"].as_str().expect("missing error field").to_string()
    }
}
