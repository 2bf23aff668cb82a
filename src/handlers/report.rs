use crate::dtos::ReportRequest;
use crate::error::AppError;
use crate::services::report;
use axum::{
    Json,
    http::{StatusCode, header},
    response::IntoResponse,
};

/// Attachment filename for the generated report.
const REPORT_FILENAME: &str = "plant_report.pdf";

pub async fn download_report(
    Json(request): Json<ReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Image decoding and PDF encoding are CPU-bound; keep them off the
    // async workers.
    let pdf = tokio::task::spawn_blocking(move || {
        report::render_report(request.result.as_deref(), request.image.as_deref())
    })
    .await
    .map_err(|e| AppError::InternalError(anyhow::anyhow!("Report task panicked: {}", e)))?
    .map_err(|e| AppError::Report(e.into()))?;

    tracing::info!(size = pdf.len(), "PDF report generated");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", REPORT_FILENAME),
            ),
        ],
        pdf,
    )
        .into_response())
}
