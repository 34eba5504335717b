// src/links/error.rs
// =============================================================================
// Error types for link resolution.
//
// Only InvalidDocumentUrl ever reaches a caller. The other two are recovered
// inside the classifier (dropped, encoded, or replaced by the document URL)
// and only show up in logs.
// =============================================================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The reference has no usable scheme, host or relative path
    #[error("Malformed reference '{reference}': {reason}")]
    MalformedReference {
        reference: String,
        reason: &'static str,
    },

    /// The declared <base> URL could not be used
    #[error("Invalid base URL '{base}': {reason}")]
    InvalidBase { base: String, reason: String },

    /// The document's own URL is not an absolute http(s) URL
    #[error("Invalid document URL '{url}': {reason}")]
    InvalidDocumentUrl { url: String, reason: String },
}

impl LinkError {
    pub(crate) fn malformed(reference: &str, reason: &'static str) -> Self {
        LinkError::MalformedReference {
            reference: reference.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display() {
        let err = LinkError::malformed("http://", "empty host");
        assert_eq!(err.to_string(), "Malformed reference 'http://': empty host");
    }

    #[test]
    fn test_invalid_base_display() {
        let err = LinkError::InvalidBase {
            base: "mailto:x".to_string(),
            reason: "not a web URL".to_string(),
        };
        assert!(err.to_string().contains("Invalid base URL"));
        assert!(err.to_string().contains("mailto:x"));
    }
}
