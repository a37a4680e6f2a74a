//! WARC record conversion.
//!
//! Framing and header parsing come from the `warc` crate's `WarcReader`; this module
//! turns each buffered record into an [`ArchiveItem`].
//!
//! Record types are routed as follows:
//!
//! | `WARC-Type` | Result |
//! |-------------|--------|
//! | `response` (HTTP) | proxy with status, headers skipped, body captured |
//! | `response` (other, e.g. DNS) | skip |
//! | `resource` with `ftp://` target | proxy, status `200` |
//! | `resource` (other) | skip |
//! | `revisit` | proxy without body |
//! | `warcinfo`, `request`, `metadata`, `conversion`, `continuation` | skip |
//! | anything else | [`ArchiveItem::Invalid`] |
use std::io::BufRead;

use chrono::DateTime;
use ::warc::{BufferedBody, Record, WarcHeader, WarcReader};

use crate::body::read_capped;
use crate::digest::digest_bytes;
use crate::error::ArchiveError;
use crate::http::read_http_head;
use crate::limit::SizeLimit;
use crate::record::{
    normalize_content_type, status_string, ArchiveItem, ArchiveRecordProxy, InvalidRecord,
    RecordType, SkipReason, HTTP_RESPONSE_CONTENT_TYPE,
};

pub(crate) const FORMAT: &str = "WARC";

pub(crate) type WarcRecord = Record<BufferedBody>;

/// Boxed record iterator over a decoded WARC stream.
pub(crate) type WarcRecords = Box<dyn Iterator<Item = Result<WarcRecord, ::warc::Error>> + Send>;

pub(crate) fn records<R>(input: R) -> WarcRecords
where
    R: BufRead + Send + 'static,
{
    Box::new(WarcReader::new(input).iter_records())
}

/// Convert a `WARC-Date` to `yyyymmddhhmmss`.
///
/// Values that are not valid RFC 3339 fall back to their first 14 digits.
pub fn normalize_warc_date(value: &str) -> String {
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(date) => date.naive_utc().format("%Y%m%d%H%M%S").to_string(),
        Err(_) => value.chars().filter(char::is_ascii_digit).take(14).collect(),
    }
}

/// Header value as an owned string, `None` when absent or blank.
fn header(record: &WarcRecord, name: WarcHeader) -> Option<String> {
    record
        .header(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Target URI with optional angle brackets removed.
fn target_uri(record: &WarcRecord) -> String {
    header(record, WarcHeader::TargetURI)
        .map(|uri| uri.trim_start_matches('<').trim_end_matches('>').to_string())
        .unwrap_or_default()
}

fn date_of(record: &WarcRecord) -> String {
    header(record, WarcHeader::Date)
        .map(|date| normalize_warc_date(&date))
        .unwrap_or_default()
}

/// Convert one parsed WARC record.
pub(crate) fn read_record(record: WarcRecord, limit: SizeLimit) -> Result<ArchiveItem, ArchiveError> {
    let record_type = header(&record, WarcHeader::WarcType)
        .ok_or_else(|| ArchiveError::framing(FORMAT, "missing WARC-Type"))?
        .to_ascii_lowercase();
    let url = target_uri(&record);
    let content_type = header(&record, WarcHeader::ContentType).unwrap_or_default();

    let item = match record_type.as_str() {
        "warcinfo" => ArchiveItem::skip(url, SkipReason::ArchiveInfo),
        "request" => ArchiveItem::skip(url, SkipReason::Request),
        "metadata" => ArchiveItem::skip(url, SkipReason::Metadata),
        "conversion" => ArchiveItem::skip(url, SkipReason::Conversion),
        "continuation" => ArchiveItem::skip(url, SkipReason::Continuation),
        "response" => {
            if normalize_content_type(&content_type)
                != normalize_content_type(HTTP_RESPONSE_CONTENT_TYPE)
            {
                let reason = if url.starts_with("dns:") {
                    SkipReason::Dns
                } else {
                    SkipReason::NonHttpResponse
                };
                return Ok(ArchiveItem::skip(url, reason));
            }
            read_response(&record, url, content_type, limit)?
        }
        "resource" => {
            if !url.starts_with("ftp://") {
                return Ok(ArchiveItem::skip(url, SkipReason::NonFtpResource));
            }
            read_resource(&record, url, content_type, limit)?
        }
        "revisit" => match header(&record, WarcHeader::PayloadDigest) {
            Some(digest) => ArchiveItem::Record(ArchiveRecordProxy {
                record_type: RecordType::Revisit,
                content_type,
                digest,
                computed_digest: None,
                date: date_of(&record),
                length: 0,
                http_status: None,
                payload_type: None,
                body: Vec::new(),
                url,
            }),
            None => ArchiveItem::skip(url, SkipReason::RevisitWithoutDigest),
        },
        _ => ArchiveItem::Invalid(InvalidRecord {
            format: FORMAT,
            digest: digest_bytes(record.body()),
            record_type,
            url,
        }),
    };
    Ok(item)
}

fn declared_or_computed(record: &WarcRecord, computed: &str) -> String {
    header(record, WarcHeader::PayloadDigest).unwrap_or_else(|| computed.to_string())
}

fn read_response(
    record: &WarcRecord,
    url: String,
    content_type: String,
    limit: SizeLimit,
) -> Result<ArchiveItem, ArchiveError> {
    let mut block = record.body();
    let length = block.len() as u64;
    let head = read_http_head(&mut block)?;
    let remaining = length.saturating_sub(head.header_len);
    let body = read_capped(&mut block, remaining, limit, &url)?;

    Ok(ArchiveItem::Record(ArchiveRecordProxy {
        record_type: RecordType::Response,
        content_type,
        digest: declared_or_computed(record, &body.digest),
        computed_digest: Some(body.digest),
        date: date_of(record),
        length: body.consumed,
        http_status: Some(status_string(head.status)),
        payload_type: head.content_type,
        body: body.bytes,
        url,
    }))
}

fn read_resource(
    record: &WarcRecord,
    url: String,
    content_type: String,
    limit: SizeLimit,
) -> Result<ArchiveItem, ArchiveError> {
    let mut block = record.body();
    let length = block.len() as u64;
    let body = read_capped(&mut block, length, limit, &url)?;

    Ok(ArchiveItem::Record(ArchiveRecordProxy {
        record_type: RecordType::Resource,
        payload_type: Some(content_type.clone()).filter(|t| !t.is_empty()),
        content_type,
        digest: declared_or_computed(record, &body.digest),
        computed_digest: Some(body.digest),
        date: date_of(record),
        length: body.consumed,
        http_status: Some("200".to_string()),
        body: body.bytes,
        url,
    }))
}
