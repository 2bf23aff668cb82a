//! Encoding and decoding of `data:<mime>;base64,<payload>` image URIs, the
//! format used to round-trip an upload from the analyze response into a
//! report request.

use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataUriError {
    #[error("not a data URI")]
    MissingScheme,

    #[error("missing ';base64,' marker")]
    MissingBase64Marker,

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("invalid base64 payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// An image decoded out of a data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn format_image_data_uri(mime_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_data)
}

/// Parse a `data:image/...;base64,...` URI. Only base64-encoded `image/*`
/// media types are accepted; anything else is rejected rather than passed
/// through to the PDF renderer.
pub fn parse_image_data_uri(uri: &str) -> Result<DecodedImage, DataUriError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or(DataUriError::MissingScheme)?;
    let (mime_type, payload) = rest
        .split_once(";base64,")
        .ok_or(DataUriError::MissingBase64Marker)?;

    let valid_subtype = mime_type.strip_prefix("image/").is_some_and(|subtype| {
        !subtype.is_empty()
            && subtype
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
    });
    if !valid_subtype {
        return Err(DataUriError::UnsupportedMediaType(mime_type.to_string()));
    }

    let bytes = general_purpose::STANDARD.decode(payload)?;

    Ok(DecodedImage {
        mime_type: mime_type.to_string(),
        bytes,
    })
}
