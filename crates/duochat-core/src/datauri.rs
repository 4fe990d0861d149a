//! Data-URI codec — `data:<mime>[;base64],<payload>`.
//!
//! Images travel through the conversation as data-URIs. OpenAI takes them
//! verbatim; Gemini wants the mime type and base64 payload split apart.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Parse failures for a data-URI.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("not a data URI (missing 'data:' prefix)")]
    MissingPrefix,
    #[error("data URI has no ',' separating header and payload")]
    MissingPayload,
    #[error("data URI has no mime type")]
    MissingMimeType,
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// A parsed data-URI. The payload is kept as it appeared in the string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub is_base64: bool,
    pub payload: String,
}

impl DataUri {
    /// Parse a data-URI string.
    pub fn parse(uri: &str) -> Result<Self, DataUriError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or(DataUriError::MissingPrefix)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingPayload)?;

        let mut params = header.split(';');
        let mime_type = params.next().unwrap_or_default().trim();
        if mime_type.is_empty() {
            return Err(DataUriError::MissingMimeType);
        }
        let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        Ok(DataUri {
            mime_type: mime_type.to_string(),
            is_base64,
            payload: payload.to_string(),
        })
    }

    /// Encode raw bytes as a base64 data-URI string.
    pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
    }

    /// The payload as base64, re-encoding non-base64 payloads.
    pub fn to_base64(&self) -> String {
        if self.is_base64 {
            self.payload.clone()
        } else {
            STANDARD.encode(self.payload.as_bytes())
        }
    }

    /// Raw bytes of the payload.
    pub fn decode(&self) -> Result<Vec<u8>, DataUriError> {
        if self.is_base64 {
            STANDARD
                .decode(self.payload.as_bytes())
                .map_err(|e| DataUriError::InvalidBase64(e.to_string()))
        } else {
            Ok(self.payload.as_bytes().to_vec())
        }
    }
}
