use crate::api::models::*;
use crate::storage::FeedbackVote;
use axum::{extract::State, Json};
use tracing::info;

pub async fn submit_feedback_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SubmitFeedbackRequest>,
) -> Result<Json<SubmitFeedbackResponse>, ApiError> {
    // Validate before touching the aggregate
    let vote = request.validate()?;

    let aggregate = match vote {
        FeedbackVote::Positive => state.feedback_store.increment_positive().await?,
        FeedbackVote::Negative => state.feedback_store.increment_negative().await?,
    };

    info!(
        vote = ?vote,
        positive = aggregate.positive_count,
        negative = aggregate.negative_count,
        "Feedback recorded"
    );

    Ok(Json(SubmitFeedbackResponse {
        success: true,
        message: "Feedback submitted successfully".to_string(),
    }))
}

pub async fn fetch_feedback_handler(
    State(state): State<AppState>,
) -> Result<Json<FetchFeedbackResponse>, ApiError> {
    let aggregate = state
        .feedback_store
        .get_aggregate()
        .await
        .ok_or(ApiError::EmptyAggregate)?;

    // A 0/0 record loaded from disk has no ratio either
    let ratio = aggregate.accuracy_ratio().ok_or(ApiError::EmptyAggregate)?;

    Ok(Json(FetchFeedbackResponse {
        success: true,
        message: "Feedback sent successfuly".to_string(),
        feedback: ratio,
        positive_count: aggregate.positive_count,
        negative_count: aggregate.negative_count,
    }))
}
