pub mod hosted;

pub use hosted::HostedClassifier;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use thiserror::Error;

/// Prediction for a single image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub predicted_label: String,
    pub confidence_level: f64,
}

impl Classification {
    /// Build a result from a raw score, clamped to [0, 1] and rounded to two decimals
    pub fn new(predicted_label: impl Into<String>, score: f64) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self {
            predicted_label: predicted_label.into(),
            confidence_level: (score * 100.0).round() / 100.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Classifier returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Classifier returned no predictions")]
    EmptyPrediction,
}

/// AI-vs-human art classifier
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &[u8]) -> Result<Classification, ClassifierError>;
}

/// Decode a base64 image, accepting data URLs and line-wrapped input
pub fn decode_image(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    STANDARD.decode(compact)
}
