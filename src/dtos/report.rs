use serde::{Deserialize, Serialize};

/// Request body for PDF report generation. Both fields are optional: a
/// missing result renders a placeholder line and a missing image skips the
/// image page.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReportRequest {
    pub result: Option<String>,
    pub image: Option<String>,
}
