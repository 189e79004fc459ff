use crate::classifier::{Classification, Classifier, ClassifierError};
use crate::storage::{FeedbackStore, FeedbackVote};
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub feedback_store: Arc<FeedbackStore>,
}

/// Request to classify an image
#[derive(Debug, Deserialize)]
pub struct ProcessImageRequest {
    #[serde(default)]
    pub image: Option<serde_json::Value>,
}

/// Response after classifying an image
#[derive(Debug, Serialize)]
pub struct ProcessImageResponse {
    pub success: bool,
    pub message: String,
    pub results: Classification,
}

/// Request to record a feedback vote
#[derive(Debug, Deserialize)]
pub struct SubmitFeedbackRequest {
    #[serde(default)]
    pub feedback: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SubmitFeedbackResponse {
    pub success: bool,
    pub message: String,
}

/// Accuracy ratio as reported by users
#[derive(Debug, Serialize)]
pub struct FetchFeedbackResponse {
    pub success: bool,
    pub message: String,
    pub feedback: f64,
    pub positive_count: u64,
    pub negative_count: u64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Empty-like JSON values (`null`, `""`, `0`, `false`, `[]`, `{}`) count as absent
fn present(value: Option<serde_json::Value>) -> Option<serde_json::Value> {
    use serde_json::Value;

    value.filter(|value| match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    })
}

impl ProcessImageRequest {
    /// Returns the non-empty base64 payload
    pub fn validate(self) -> Result<String, ApiError> {
        match present(self.image).ok_or(ApiError::MissingField("image"))? {
            serde_json::Value::String(image) => Ok(image),
            _ => Err(ApiError::InvalidFieldValue("Invalid image encoding".to_string())),
        }
    }
}

impl SubmitFeedbackRequest {
    /// Returns the vote; anything but `yes` / `no` is unexpected
    pub fn validate(self) -> Result<FeedbackVote, ApiError> {
        let value = present(self.feedback).ok_or(ApiError::MissingField("feedback"))?;

        value
            .as_str()
            .and_then(FeedbackVote::parse)
            .ok_or_else(|| ApiError::InvalidFieldValue("Unexpected feedback provided".to_string()))
    }
}

/// Application error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request method")]
    MethodNotAllowed,

    #[error("Invalid JSON")]
    InvalidBody,

    #[error("No {0} provided")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidFieldValue(String),

    #[error("Database is empty")]
    EmptyAggregate,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Image classification failed")]
    UpstreamFailure(#[from] ClassifierError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidBody
            | ApiError::MissingField(_)
            | ApiError::InvalidFieldValue(_)
            | ApiError::EmptyAggregate => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UpstreamFailure(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::UpstreamFailure(e) => error!("Classifier failure: {}", e),
            ApiError::Internal(e) => error!("Internal error: {:#}", e),
            _ => {}
        }

        let status = self.status();
        let body = Json(ErrorResponse {
            success: false,
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// JSON object body; any read or parse failure is reported as `Invalid JSON`
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge
            } else {
                ApiError::InvalidBody
            }
        })?;

        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|_| ApiError::InvalidBody)?;
        if !value.is_object() {
            return Err(ApiError::InvalidBody);
        }

        T::deserialize(value)
            .map(JsonBody)
            .map_err(|_| ApiError::InvalidBody)
    }
}
