use crate::dtos::AnalysisResponse;
use crate::error::AppError;
use crate::services::providers::InlineImage;
use crate::startup::AppState;
use crate::utils::data_uri;
use axum::{
    Json,
    extract::{
        State,
        multipart::{Multipart, MultipartRejection},
    },
    response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose};

/// Multipart field carrying the upload.
const IMAGE_FIELD: &str = "image";

/// Instruction prompt sent to the vision provider with every upload.
const ANALYSIS_PROMPT: &str = "Analyze this plant image and provide detailed analysis of its \
     species, health, and care recommendations. Plain text only.";

pub async fn analyze_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    // A non-multipart body cannot carry the image field.
    let mut multipart =
        multipart.map_err(|_| AppError::BadRequest(anyhow::anyhow!("No image uploaded")))?;

    let mut upload: Option<(String, Vec<u8>)> = None;

    // Take the first `image` field; unrelated fields are skipped.
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!("Failed to read image bytes: {}", e))
            })?
            .to_vec();

        upload = Some((mime_type, data));
        break;
    }

    let (mime_type, data) = match upload {
        Some((mime_type, data)) if !data.is_empty() => (mime_type, data),
        _ => return Err(AppError::BadRequest(anyhow::anyhow!("No image uploaded"))),
    };

    if data.len() > state.config.limits.max_image_bytes {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Image too large (max {} bytes)",
            state.config.limits.max_image_bytes
        )));
    }

    tracing::info!(
        mime_type = %mime_type,
        size = data.len(),
        "Analyzing uploaded image"
    );

    let image = InlineImage {
        mime_type,
        data: general_purpose::STANDARD.encode(&data),
    };

    let result = state
        .vision
        .analyze(ANALYSIS_PROMPT, &image)
        .await
        .map_err(|e| AppError::Analysis(e.into()))?;

    tracing::info!(result_len = result.len(), "Analysis completed");

    Ok(Json(AnalysisResponse {
        result,
        image: data_uri::format_image_data_uri(&image.mime_type, &image.data),
    }))
}
