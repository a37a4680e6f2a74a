//! Payload digests.
//!
//! Every record carries a digest in the form WARC files and CDX indexes use:
//!
//! ```text
//! "sha1:" || BASE32(SHA-1(payload_bytes))
//! ```
//!
//! Base32 is RFC 4648, upper case, padded (SHA-1 output is 20 bytes, which
//! encodes to exactly 32 characters with no padding). ARC files do not
//! declare digests, so the reader always computes one; rendering the computed
//! value with the same prefix gives ARC and WARC records one representation.
//!
//! # Examples
//!
//! ```rust
//! use archive::digest_bytes;
//!
//! let digest = digest_bytes(b"hello world");
//! assert!(digest.starts_with("sha1:"));
//! assert_eq!(digest.len(), 5 + 32);
//! ```
use data_encoding::BASE32;
use sha1::{Digest, Sha1};

/// Algorithm tag prepended to every digest.
pub const DIGEST_PREFIX: &str = "sha1:";

/// Incremental SHA-1 over a payload stream.
#[derive(Clone, Default)]
pub struct PayloadHasher {
    inner: Sha1,
    consumed: u64,
}

impl PayloadHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
        self.consumed += bytes.len() as u64;
    }

    /// Total bytes fed to the hasher so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Finish and render as `sha1:<BASE32>`.
    pub fn finish(self) -> String {
        let hash = self.inner.finalize();
        format!("{DIGEST_PREFIX}{}", BASE32.encode(&hash))
    }
}

/// Digest a complete in-memory payload.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = PayloadHasher::new();
    hasher.update(bytes);
    hasher.finish()
}

/// Prefix a bare base32 digest (as found in CDX lines) with the algorithm tag.
///
/// Already-prefixed values are returned unchanged.
pub fn prefixed_digest(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains(':') {
        raw.to_string()
    } else {
        format!("{DIGEST_PREFIX}{raw}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_digest_is_well_known() {
        // SHA-1 of the empty string, base32 encoded.
        assert_eq!(digest_bytes(b""), "sha1:3I42H3S6NNFQ2MSVX7XZKYAYSCX5QBYJ");
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut hasher = PayloadHasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(hasher.consumed(), 11);
        assert_eq!(hasher.finish(), digest_bytes(b"hello world"));
    }

    #[test]
    fn prefixing_is_idempotent() {
        assert_eq!(prefixed_digest("ABC"), "sha1:ABC");
        assert_eq!(prefixed_digest("sha1:ABC"), "sha1:ABC");
    }
}
