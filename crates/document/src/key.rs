//! Identity keys.
//!
//! Two captures are the same logical document when they share a URL and a
//! payload digest. The key's text form, `"<url> <algorithm:digest>"`, is what
//! the grouping stage partitions on, so its rendering must stay byte-stable.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DocumentError;

/// `(url, digest)` pair identifying a logical document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey {
    url: String,
    digest: String,
}

impl IdentityKey {
    pub fn new(url: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            digest: digest.into(),
        }
    }

    /// Parse `"<url> <digest>"`. The digest is the last space-separated token.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let text = text.trim();
        match text.rsplit_once(' ') {
            Some((url, digest)) if !url.trim().is_empty() && !digest.is_empty() => {
                Ok(Self::new(url.trim(), digest))
            }
            _ => Err(DocumentError::InvalidKey(text.to_string())),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.url, self.digest)
    }
}

impl FromStr for IdentityKey {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for IdentityKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IdentityKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render() {
        let key: IdentityKey = "com,example)/ sha1:ABCDEF".parse().unwrap();
        assert_eq!(key.url(), "com,example)/");
        assert_eq!(key.digest(), "sha1:ABCDEF");
        assert_eq!(key.to_string(), "com,example)/ sha1:ABCDEF");
    }

    #[test]
    fn rejects_single_token() {
        assert!(matches!(
            IdentityKey::parse("http://example.com/"),
            Err(DocumentError::InvalidKey(_))
        ));
        assert!(IdentityKey::parse("").is_err());
    }

    #[test]
    fn ordering_groups_by_url_first() {
        let a = IdentityKey::new("http://a/", "sha1:Z");
        let b = IdentityKey::new("http://b/", "sha1:A");
        assert!(a < b);
    }
}
