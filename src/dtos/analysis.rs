use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Plain-text analysis from the vision model.
    pub result: String,
    /// The uploaded image echoed back as a `data:<mime>;base64,<payload>`
    /// URI, ready to be posted to the download endpoint unchanged.
    pub image: String,
}
