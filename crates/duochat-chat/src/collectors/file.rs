//! File picker — images become data-URIs, documents become plain text.

use std::path::Path;

use duochat_core::datauri::DataUri;
use duochat_core::types::FileAttachment;
use tracing::{debug, info};

use super::CollectorError;

/// MIME type for a supported image file, by extension.
pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    match extension(path).as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// MIME type for a supported document file, by extension.
pub fn document_mime_type(path: &Path) -> Option<&'static str> {
    match extension(path).as_str() {
        "pdf" => Some("application/pdf"),
        "txt" | "log" => Some("text/plain"),
        "md" | "markdown" => Some("text/markdown"),
        "csv" => Some("text/csv"),
        "html" | "htm" => Some("text/html"),
        "xml" => Some("text/xml"),
        _ => None,
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Read an image file into a base64 data-URI.
pub async fn load_image(path: &Path) -> Result<String, CollectorError> {
    let mime_type =
        image_mime_type(path).ok_or_else(|| CollectorError::UnsupportedFile(file_name(path)))?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CollectorError::unreadable(path, e))?;

    debug!(path = %path.display(), mime_type, bytes = bytes.len(), "loaded image");
    Ok(DataUri::encode(mime_type, &bytes))
}

/// Read a document and extract its text.
pub async fn load_document(path: &Path) -> Result<FileAttachment, CollectorError> {
    let name = file_name(path);
    let mime_type =
        document_mime_type(path).ok_or_else(|| CollectorError::UnsupportedFile(name.clone()))?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CollectorError::unreadable(path, e))?;

    let extracted_text = if mime_type == "application/pdf" {
        tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
            .await
            .map_err(|e| CollectorError::unreadable(path, e))?
            .map_err(|e| CollectorError::unreadable(path, e))?
    } else {
        String::from_utf8(bytes)
            .map_err(|_| CollectorError::unreadable(path, "not valid UTF-8 text"))?
    };

    info!(file = %name, mime_type, chars = extracted_text.len(), "extracted document text");

    Ok(FileAttachment {
        name,
        mime_type: mime_type.to_string(),
        extracted_text,
    })
}

/// Extract text page by page.
///
/// Whitespace inside a page collapses to single spaces; pages are separated by
/// newlines and the result is trimmed.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, lopdf::Error> {
    let doc = lopdf::Document::load_mem(bytes)?;

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        let page_text = doc.extract_text(&[*page_number])?;
        let words: Vec<&str> = page_text.split_whitespace().collect();
        text.push_str(&words.join(" "));
        text.push('\n');
    }

    Ok(text.trim().to_string())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
