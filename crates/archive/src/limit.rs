//! Retained-body size limits.
//!
//! A record body can be far larger than anything worth holding in memory
//! (video captures run to many gigabytes), so the reader keeps at most
//! [`SizeLimit`] bytes of each body. The limit only bounds the retained
//! buffer. Every byte of the record is still read and digested.
//!
//! Configuration traditionally expresses the limit as a signed integer where
//! any negative value means "no limit". Even an unbounded limit is clamped to
//! [`MAX_RETAINED_BYTES`], which sits well below the numeric maximum of the
//! buffer length type.
use serde::{Deserialize, Serialize};

/// Hard ceiling on the number of body bytes retained for one record (1 GiB).
pub const MAX_RETAINED_BYTES: u64 = 1 << 30;

/// Upper bound on how many bytes of a record body are kept in memory.
///
/// # Examples
///
/// ```rust
/// use archive::{SizeLimit, MAX_RETAINED_BYTES};
///
/// assert_eq!(SizeLimit::from_config(-1), SizeLimit::Unbounded);
/// assert_eq!(SizeLimit::from_config(1024).retained_len(10_000), 1024);
/// assert_eq!(SizeLimit::from_config(1024).retained_len(10), 10);
/// assert_eq!(
///     SizeLimit::Unbounded.retained_len(u64::MAX) as u64,
///     MAX_RETAINED_BYTES
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeLimit {
    /// Retain the whole body, subject only to [`MAX_RETAINED_BYTES`].
    #[default]
    Unbounded,
    /// Retain at most this many bytes.
    Bytes(u64),
}

impl SizeLimit {
    /// Interpret a signed configuration value. Negative means unbounded.
    pub fn from_config(value: i64) -> Self {
        match u64::try_from(value) {
            Ok(bytes) => SizeLimit::Bytes(bytes.min(MAX_RETAINED_BYTES)),
            Err(_) => SizeLimit::Unbounded,
        }
    }

    /// The configured ceiling, after clamping.
    pub fn ceiling(&self) -> u64 {
        match self {
            SizeLimit::Unbounded => MAX_RETAINED_BYTES,
            SizeLimit::Bytes(bytes) => (*bytes).min(MAX_RETAINED_BYTES),
        }
    }

    /// Number of bytes to retain from a body of `declared` bytes.
    pub fn retained_len(&self, declared: u64) -> usize {
        let len = declared.min(self.ceiling());
        // MAX_RETAINED_BYTES fits in usize on every supported target.
        usize::try_from(len).unwrap_or(usize::MAX)
    }
}
