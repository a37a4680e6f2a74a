//! The normalized record view shared by ARC and WARC input.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;

/// Record-type tag of a payload-bearing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// HTTP response with a payload body.
    Response,
    /// Non-HTTP capture, currently FTP only.
    Resource,
    /// Same content as an earlier capture; no body.
    Revisit,
    /// Archive self-description.
    Warcinfo,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Response => "response",
            RecordType::Resource => "resource",
            RecordType::Revisit => "revisit",
            RecordType::Warcinfo => "warcinfo",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Framing content type of an HTTP response record.
pub const HTTP_RESPONSE_CONTENT_TYPE: &str = "application/http; msgtype=response";

/// One normalized archive record.
///
/// Built once by the reader and immutable afterwards. `body` may be a
/// truncated prefix of the payload; `length` and `digest` always describe the
/// whole payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecordProxy {
    pub(crate) record_type: RecordType,
    pub(crate) content_type: String,
    pub(crate) url: String,
    pub(crate) digest: String,
    pub(crate) computed_digest: Option<String>,
    pub(crate) date: String,
    pub(crate) length: u64,
    pub(crate) http_status: Option<String>,
    pub(crate) payload_type: Option<String>,
    pub(crate) body: Vec<u8>,
}

impl ArchiveRecordProxy {
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Content type of the record framing, e.g.
    /// `application/http; msgtype=response`.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Digest in `algorithm:value` form. For WARC this is the declared
    /// payload digest when the record carries one.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Digest computed while reading the payload. `None` for revisits, whose
    /// payload is not present.
    pub fn computed_digest(&self) -> Option<&str> {
        self.computed_digest.as_deref()
    }

    /// Capture timestamp, `yyyymmddhhmmss`.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Payload length in bytes, excluding HTTP status line and headers.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// HTTP status code as a string. `"-1"` when the status line was
    /// unreadable, `None` for records without a status (revisits).
    pub fn http_status(&self) -> Option<&str> {
        self.http_status.as_deref()
    }

    /// Declared content type of the payload itself: the HTTP `Content-Type`
    /// header for responses, the record content type for resources.
    pub fn payload_type(&self) -> Option<&str> {
        self.payload_type.as_deref()
    }

    /// Retained payload bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// True when the retained body is shorter than the payload.
    pub fn is_truncated(&self) -> bool {
        (self.body.len() as u64) < self.length
    }

    pub fn is_http_response(&self) -> bool {
        self.record_type == RecordType::Response
            && normalize_content_type(&self.content_type)
                == normalize_content_type(HTTP_RESPONSE_CONTENT_TYPE)
    }
}

/// One summary line, as printed by the `dump` command.
impl fmt::Display for ArchiveRecordProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.record_type,
            self.content_type,
            self.url,
            self.digest,
            self.date,
            self.length,
            self.http_status.as_deref().unwrap_or("-"),
            self.body.len()
        )
    }
}

/// Why a record produced no proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `warcinfo` or a later `filedesc://` block.
    ArchiveInfo,
    Dns,
    Request,
    Metadata,
    Conversion,
    Continuation,
    /// A `response` whose block is not an HTTP response.
    NonHttpResponse,
    /// A `resource` that is not an FTP capture.
    NonFtpResource,
    /// A `revisit` that names no payload digest, so it has no identity.
    RevisitWithoutDigest,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::ArchiveInfo => "archive_info",
            SkipReason::Dns => "dns",
            SkipReason::Request => "request",
            SkipReason::Metadata => "metadata",
            SkipReason::Conversion => "conversion",
            SkipReason::Continuation => "continuation",
            SkipReason::NonHttpResponse => "non_http_response",
            SkipReason::NonFtpResource => "non_ftp_resource",
            SkipReason::RevisitWithoutDigest => "revisit_without_digest",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that was read and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub url: String,
    pub reason: SkipReason,
}

/// A record whose envelope was read in full but whose type is not one this
/// reader knows. The stream is still positioned at the next record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    pub format: &'static str,
    pub record_type: String,
    pub url: String,
    /// `sha1:<BASE32>` over the record block.
    pub digest: String,
}

impl InvalidRecord {
    pub fn to_error(&self) -> ArchiveError {
        ArchiveError::UnknownRecordType {
            format: self.format,
            record_type: self.record_type.clone(),
            url: self.url.clone(),
        }
    }
}

/// One element of an archive iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveItem {
    Record(ArchiveRecordProxy),
    Skip(SkippedRecord),
    Invalid(InvalidRecord),
}

impl ArchiveItem {
    pub(crate) fn skip(url: impl Into<String>, reason: SkipReason) -> Self {
        ArchiveItem::Skip(SkippedRecord {
            url: url.into(),
            reason,
        })
    }

    pub fn as_record(&self) -> Option<&ArchiveRecordProxy> {
        match self {
            ArchiveItem::Record(record) => Some(record),
            ArchiveItem::Skip(_) | ArchiveItem::Invalid(_) => None,
        }
    }

    pub fn into_record(self) -> Option<ArchiveRecordProxy> {
        match self {
            ArchiveItem::Record(record) => Some(record),
            ArchiveItem::Skip(_) | ArchiveItem::Invalid(_) => None,
        }
    }
}

/// Lower-case a content type and drop whitespace so that
/// `application/http; msgtype=response` and `application/http;msgtype=response`
/// compare equal.
pub(crate) fn normalize_content_type(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Status code string for a parsed status line; unparseable becomes `-1`.
pub(crate) fn status_string(status: Option<u16>) -> String {
    status.map_or_else(|| "-1".to_string(), |code| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArchiveRecordProxy {
        ArchiveRecordProxy {
            record_type: RecordType::Response,
            content_type: "application/http;msgtype=response".into(),
            url: "http://example.com/".into(),
            digest: "sha1:AAAA".into(),
            computed_digest: Some("sha1:AAAA".into()),
            date: "20100501120000".into(),
            length: 10,
            http_status: Some("200".into()),
            payload_type: Some("text/html".into()),
            body: b"0123".to_vec(),
        }
    }

    #[test]
    fn content_type_comparison_ignores_spacing() {
        assert!(sample().is_http_response());
    }

    #[test]
    fn truncation_is_reported() {
        assert!(sample().is_truncated());
    }

    #[test]
    fn summary_line_has_all_columns() {
        let line = sample().to_string();
        assert_eq!(line.split('\t').count(), 8);
        assert!(line.starts_with("response\t"));
        assert!(line.ends_with("\t200\t4"));
    }

    #[test]
    fn unknown_status_sentinel() {
        assert_eq!(status_string(None), "-1");
        assert_eq!(status_string(Some(404)), "404");
    }
}
