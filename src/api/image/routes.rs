use crate::api::image::handlers::process_image_handler;
use crate::api::method_not_allowed;
use crate::api::models::AppState;
use axum::{routing::post, Router};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/core/process-image/",
        post(process_image_handler).fallback(method_not_allowed),
    )
}
