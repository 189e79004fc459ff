use crate::api::feedback::handlers::{fetch_feedback_handler, submit_feedback_handler};
use crate::api::method_not_allowed;
use crate::api::models::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/core/submit-feedback/",
            post(submit_feedback_handler).fallback(method_not_allowed),
        )
        .route(
            "/core/fetch-feedback/",
            get(fetch_feedback_handler).fallback(method_not_allowed),
        )
}
