// src/links/reference.rs
// Raw href values as they came out of the document.

use std::fmt;

use super::encode;

/// An href exactly as it appeared in the source attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference(String);

impl Reference {
    pub fn new(raw: impl Into<String>) -> Self {
        Reference(raw.into())
    }

    // Attribute values that aren't valid UTF-8 keep their bad bytes as %XX
    pub fn from_bytes(raw: &[u8]) -> Self {
        Reference(encode::lossless_utf8(raw).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Reference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Reference {
    fn from(raw: &str) -> Self {
        Reference::new(raw)
    }
}

impl From<String> for Reference {
    fn from(raw: String) -> Self {
        Reference(raw)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_keeps_invalid_bytes() {
        let reference = Reference::from_bytes(b"/caf\xe9");
        assert_eq!(reference.as_str(), "/caf%E9");
    }

    #[test]
    fn test_from_str() {
        let reference: Reference = "/faqs".into();
        assert_eq!(reference.to_string(), "/faqs");
    }
}
