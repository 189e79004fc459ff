use crate::api::models::*;
use crate::classifier::decode_image;
use axum::{extract::State, Json};
use tracing::{info, warn};

pub async fn process_image_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ProcessImageRequest>,
) -> Result<Json<ProcessImageResponse>, ApiError> {
    // Validate
    let encoded = request.validate()?;

    let image = decode_image(&encoded).map_err(|e| {
        warn!(error = %e, "Rejected image payload");
        ApiError::InvalidFieldValue("Invalid image encoding".to_string())
    })?;

    info!(bytes = image.len(), "Classifying image");

    let results = state.classifier.classify(&image).await?;

    info!(
        label = %results.predicted_label,
        confidence = results.confidence_level,
        "Image classified"
    );

    Ok(Json(ProcessImageResponse {
        success: true,
        message: "Image uploaded successfully".to_string(),
        results,
    }))
}
