//! MIME lookup and `data:` URL encoding shared by the static server,
//! upload handling and the batch client's file output.

use crate::error::{AvatarError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

pub const MAX_UPLOAD_BYTES: usize = 12 * 1024 * 1024;

const MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "application/javascript; charset=utf-8"),
    ("json", "application/json; charset=utf-8"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
];

pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| {
            MIME_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or("application/octet-stream")
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

pub fn png_data_url(base64_payload: &str) -> String {
    format!("data:image/png;base64,{}", base64_payload)
}

pub fn is_data_url(reference: &str) -> bool {
    reference.starts_with("data:")
}

/// Splits a base64 `data:` URL into its MIME type and decoded bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AvatarError::Validation("Not a data URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AvatarError::Validation("Data URL has no payload".into()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| AvatarError::Validation("Only base64 data URLs are supported".into()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AvatarError::Serialization(format!("Invalid base64 image data: {}", e)))?;
    Ok((mime.to_string(), bytes))
}
