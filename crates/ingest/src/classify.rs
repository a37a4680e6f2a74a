//! Record classification.
//!
//! Every normalized record gets exactly one disposition:
//!
//! | Record | Disposition |
//! |--------|-------------|
//! | HTTP `response` | [`Disposition::Parse`] with the declared payload type, or `None` for `text/plain` |
//! | `resource` at `ftp://` with `application/octet-stream` | [`Disposition::Parse`], sniffed |
//! | `revisit` | [`Disposition::Revisit`] |
//! | everything else | [`Disposition::Skip`] |
//!
//! `text/plain` is the type naive servers send for anything, so it is passed
//! to the parser as "unknown" and the parser sniffs instead.
use archive::{ArchiveRecordProxy, RecordType};

use crate::config::IngestConfig;
use crate::parser::{base_content_type, sniff_content_type};

/// What to do with one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the body to the parser with this declared content type.
    Parse { content_type: Option<String> },
    /// Emit a url/digest/date document without parsing.
    Revisit,
    /// Emit nothing.
    Skip(&'static str),
}

pub fn classify(record: &ArchiveRecordProxy) -> Disposition {
    match record.record_type() {
        RecordType::Response if record.is_http_response() => Disposition::Parse {
            content_type: record.payload_type().and_then(declared_type),
        },
        RecordType::Response => Disposition::Skip("non_http_response"),
        RecordType::Resource => {
            let is_data = record
                .payload_type()
                .map(base_content_type)
                .is_some_and(|t| t == "application/octet-stream");
            if record.url().starts_with("ftp://") && is_data {
                Disposition::Parse { content_type: None }
            } else {
                Disposition::Skip("non_ftp_data_resource")
            }
        }
        RecordType::Revisit => Disposition::Revisit,
        RecordType::Warcinfo => Disposition::Skip("warcinfo"),
    }
}

/// Declared type worth passing on; `text/plain` and blanks become `None`.
fn declared_type(value: &str) -> Option<String> {
    let base = base_content_type(value);
    match base.as_str() {
        "" | "text/plain" => None,
        _ => Some(value.trim().to_string()),
    }
}

/// Which parse-size threshold applies to a content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitClass {
    Html,
    Text,
    Unlimited,
}

impl LimitClass {
    pub fn of(content_type: &str) -> Self {
        match base_content_type(content_type).as_str() {
            "text/html" | "application/xhtml+xml" | "application/xhtml" => LimitClass::Html,
            "text/plain" => LimitClass::Text,
            _ => LimitClass::Unlimited,
        }
    }
}

/// Bytes of `body` the parser may see.
///
/// The effective type is the declared one, or the sniffed one when nothing
/// useful was declared. A threshold applies only when it is smaller than the
/// full payload length.
pub fn parser_view<'a>(
    body: &'a [u8],
    payload_length: u64,
    declared: Option<&str>,
    config: &IngestConfig,
) -> (&'a [u8], Option<u64>) {
    let effective = declared.map_or_else(|| sniff_content_type(body).to_string(), str::to_string);
    let threshold = match LimitClass::of(&effective) {
        LimitClass::Html => config.html_limit,
        LimitClass::Text => config.text_limit,
        LimitClass::Unlimited => None,
    };
    match threshold {
        Some(limit) if limit > 0 && limit < payload_length => {
            let cut = usize::try_from(limit).unwrap_or(usize::MAX).min(body.len());
            (&body[..cut], Some(limit))
        }
        _ => (body, None),
    }
}
