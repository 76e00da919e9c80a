//! Inline media encoding
//!
//! Attachments own their bytes: a file or recording becomes a
//! `data:<mime>;base64,<payload>` URI stored directly on the entry.

use crate::error::{AppError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode bytes as a base64 data URI
pub fn encode(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
}

/// Split a data URI into its MIME type and decoded bytes
pub fn decode(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| AppError::Generic("Not a data URI".to_string()))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::Generic("Malformed data URI".to_string()))?;

    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| AppError::Generic("Only base64 data URIs are supported".to_string()))?;

    let data = STANDARD
        .decode(payload)
        .map_err(|e| AppError::Generic(format!("Invalid base64 payload: {}", e)))?;

    Ok((mime_type.to_string(), data))
}
