pub mod feedback;
pub mod image;
pub mod models;

// Re-exports
pub use models::*;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{any, get},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const WELCOME_MESSAGE: &str = "Welcome to rostcherno's AI and Human Art Classifier API! 🤖";

/// Router options that come from configuration
#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    pub max_body_bytes: usize,
    pub cors: bool,
}

/// Build the full application router
pub fn router(state: AppState, options: RouterOptions) -> Router {
    let app = Router::new()
        .route("/core/", any(index_handler))
        .route("/core/health/", get(health_handler).fallback(health_bad_request))
        .merge(image::routes())
        .merge(feedback::routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(options.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    if options.cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

pub async fn index_handler() -> &'static str {
    WELCOME_MESSAGE
}

pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}

// Health answers other methods with 400, not 405
async fn health_bad_request() -> StatusCode {
    StatusCode::BAD_REQUEST
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
