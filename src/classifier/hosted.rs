use super::{Classification, Classifier, ClassifierError};
use crate::config::ClassifierConfig;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for a hosted image-classification inference endpoint
pub struct HostedClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Scores(Vec<LabelScore>),
    Error { error: String },
}

impl HostedClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for HostedClassifier {
    async fn classify(&self, image: &[u8]) -> Result<Classification, ClassifierError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec());

        if let Some(token) = &self.api_token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Classifier returned an error status");
            return Err(ClassifierError::Upstream {
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        let scores = match serde_json::from_str::<InferenceResponse>(&body) {
            Ok(InferenceResponse::Scores(scores)) => scores,
            Ok(InferenceResponse::Error { error }) => {
                return Err(ClassifierError::Upstream {
                    status: status.as_u16(),
                    message: error,
                });
            }
            Err(e) => {
                return Err(ClassifierError::Upstream {
                    status: status.as_u16(),
                    message: format!("unreadable response: {}", e),
                });
            }
        };

        debug!(candidates = scores.len(), "Classifier responded");

        scores
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|best| Classification::new(best.label, best.score))
            .ok_or(ClassifierError::EmptyPrediction)
    }
}

fn upstream_message(body: &str) -> String {
    match serde_json::from_str::<InferenceResponse>(body) {
        Ok(InferenceResponse::Error { error }) => error,
        _ => body.chars().take(200).collect(),
    }
}
