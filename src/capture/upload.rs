//! Decoding of user-supplied image files.
//!
//! Accepts raw encoded bytes (PNG, JPEG, ...) or a browser-style
//! `data:image/<type>;base64,<payload>` URL.

use base64::{Engine as _, engine::general_purpose};

use super::RawImage;
use crate::error::{PipelineError, Result};

const DATA_URL_PREFIX: &[u8] = b"data:";

/// Decodes an uploaded file into RGBA pixels.
pub fn decode_upload(bytes: &[u8]) -> Result<RawImage> {
    let decoded;
    let encoded = if bytes.starts_with(DATA_URL_PREFIX) {
        decoded = decode_data_url(bytes)?;
        decoded.as_slice()
    } else {
        bytes
    };

    image::load_from_memory(encoded)
        .map(|img| img.to_rgba8())
        .map_err(|e| PipelineError::UnsupportedImageFormat(e.to_string()))
}

fn decode_data_url(bytes: &[u8]) -> Result<Vec<u8>> {
    let comma = bytes.iter().position(|&b| b == b',').ok_or_else(|| {
        PipelineError::UnsupportedImageFormat("data URL has no payload".to_string())
    })?;

    let header = &bytes[..comma];
    if !header.ends_with(b";base64") {
        return Err(PipelineError::UnsupportedImageFormat(
            "only base64 data URLs are supported".to_string(),
        ));
    }

    let payload: Vec<u8> = bytes[comma + 1..]
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| PipelineError::UnsupportedImageFormat(format!("invalid base64 payload: {}", e)))
}
