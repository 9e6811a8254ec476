//! Images as inline `data:` URLs.

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;
use tracing::debug;

use crate::store::ContentStore;

const DATA_PREFIX: &str = "data:";

#[derive(Debug, Clone)]
pub struct ImageSource {
    /// A `data:` URL, or a path readable through the store.
    pub url: String,
}

impl ImageSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Best-effort media type from the file extension.
pub fn guess_media_type(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

/// Encode `bytes` as a `data:` URL.
pub fn encode_data_url(media_type: &str, bytes: &[u8]) -> String {
    let encoded = general_purpose::STANDARD.encode(bytes);
    format!("data:{media_type};base64,{encoded}")
}

/// Inline data passes through; anything else is read and encoded.
/// An unreadable image yields `None` and is silently omitted.
pub(crate) async fn resolve(url: &str, store: &dyn ContentStore) -> Option<String> {
    if url.starts_with(DATA_PREFIX) {
        return Some(url.to_string());
    }
    match store.read_bytes(url).await {
        Ok(bytes) => Some(encode_data_url(guess_media_type(url), &bytes)),
        Err(e) => {
            debug!(url, error = %e, "Image not readable, omitting");
            None
        }
    }
}
