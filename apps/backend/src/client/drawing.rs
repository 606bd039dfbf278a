use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use lazy_regex::regex_captures;

use crate::errors::domain::DomainError;

/// A finished drawing: opaque encoded image bytes plus their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawing {
    media_type: String,
    bytes: Bytes,
}

impl Drawing {
    pub fn from_bytes(media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Parse a canvas export such as `data:image/png;base64,iVBOR...`.
    pub fn from_data_url(url: &str) -> Result<Self, DomainError> {
        let (_, media_type, payload) =
            regex_captures!(r"^data:(image/[A-Za-z0-9.+-]+);base64,(.*)$"s, url)
                .ok_or_else(|| DomainError::validation("drawing must be a base64 image data URL"))?;

        let bytes = STANDARD
            .decode(payload.trim_end())
            .map_err(|e| DomainError::validation(format!("drawing payload is not base64: {e}")))?;
        if bytes.is_empty() {
            return Err(DomainError::validation("drawing is empty"));
        }

        Ok(Self::from_bytes(media_type, bytes))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.bytes))
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// blake3 hex digest of the image bytes.
    pub fn digest(&self) -> String {
        blake3::hash(&self.bytes).to_hex().to_string()
    }
}
