//! Device payload content formats

use serde::{Deserialize, Serialize};

/// Media type of the plain-text execute argument
pub const TEXT_PLAIN: &str = "text/plain";

/// Content formats understood by devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Plain text (execute arguments)
    Text,
    /// Opaque binary
    Opaque,
    /// Type-length-value
    Tlv,
    /// Structured JSON
    Json,
}

impl ContentFormat {
    /// Formats accepted for a write, keyed by HTTP media type
    const WRITE_MEDIA_TYPES: [(&'static str, ContentFormat); 3] = [
        ("application/vnd.oma.lwm2m+tlv", ContentFormat::Tlv),
        ("application/vnd.oma.lwm2m+json", ContentFormat::Json),
        ("application/octet-stream", ContentFormat::Opaque),
    ];

    /// Map a write request's `Content-Type` to a device format
    pub fn from_write_media_type(media_type: &str) -> Option<Self> {
        Self::WRITE_MEDIA_TYPES
            .iter()
            .find(|(name, _)| *name == media_type)
            .map(|(_, format)| *format)
    }

    /// HTTP media type for this format
    pub fn media_type(self) -> &'static str {
        match self {
            ContentFormat::Text => TEXT_PLAIN,
            ContentFormat::Opaque => "application/octet-stream",
            ContentFormat::Tlv => "application/vnd.oma.lwm2m+tlv",
            ContentFormat::Json => "application/vnd.oma.lwm2m+json",
        }
    }

    /// Numeric content-format code used on the device side
    pub fn code(self) -> u16 {
        match self {
            ContentFormat::Text => 0,
            ContentFormat::Opaque => 42,
            ContentFormat::Tlv => 11542,
            ContentFormat::Json => 11543,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_media_types() {
        assert_eq!(
            ContentFormat::from_write_media_type("application/vnd.oma.lwm2m+tlv"),
            Some(ContentFormat::Tlv)
        );
        assert_eq!(
            ContentFormat::from_write_media_type("application/octet-stream"),
            Some(ContentFormat::Opaque)
        );
        assert_eq!(ContentFormat::from_write_media_type("text/plain"), None);
        assert_eq!(ContentFormat::from_write_media_type("application/json"), None);
    }

    #[test]
    fn test_media_type_roundtrip() {
        for format in [ContentFormat::Tlv, ContentFormat::Json, ContentFormat::Opaque] {
            assert_eq!(
                ContentFormat::from_write_media_type(format.media_type()),
                Some(format)
            );
        }
    }
}
