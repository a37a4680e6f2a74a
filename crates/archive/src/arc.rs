//! ARC record framing.
//!
//! An ARC record is one header line followed by `length` bytes:
//!
//! ```text
//! v1: <url> <ip> <yyyymmddhhmmss> <mime> <length>
//! v2: <url> <ip> <yyyymmddhhmmss> <mime> <status> <checksum> <location> <offset> <filename> <length>
//! ```
//!
//! For HTTP captures the block starts with the HTTP status line and headers.
//! The file begins with a `filedesc://` record describing the archive itself.
use std::io::{BufRead, Read};

use crate::body::{drain, read_capped};
use crate::error::ArchiveError;
use crate::http::read_http_head;
use crate::limit::SizeLimit;
use crate::reader::next_envelope_line;
use crate::record::{
    status_string, ArchiveItem, ArchiveRecordProxy, InvalidRecord, RecordType, SkipReason,
    HTTP_RESPONSE_CONTENT_TYPE,
};

const FORMAT: &str = "ARC";

/// Parsed ARC header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArcHeader {
    pub url: String,
    pub date: String,
    pub mime: String,
    pub status: Option<String>,
    pub length: u64,
}

pub(crate) fn parse_header(line: &str) -> Result<ArcHeader, ArchiveError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 && fields.len() != 10 {
        return Err(ArchiveError::framing(
            FORMAT,
            format!("expected 5 or 10 header fields, found {}: {line:?}", fields.len()),
        ));
    }
    let length_field = fields[fields.len() - 1];
    let length = length_field.parse::<u64>().map_err(|_| {
        ArchiveError::framing(FORMAT, format!("invalid record length {length_field:?}"))
    })?;
    let status = (fields.len() == 10)
        .then(|| fields[4])
        .filter(|s| s.parse::<u16>().is_ok())
        .map(str::to_string);

    Ok(ArcHeader {
        url: fields[0].to_string(),
        date: fields[2].chars().filter(char::is_ascii_digit).take(14).collect(),
        mime: fields[3].to_string(),
        status,
        length,
    })
}

/// Read the next ARC record. `first` marks the file's leading record, which
/// must be the `filedesc://` block and is consumed silently.
pub(crate) fn read_record<R: BufRead + ?Sized>(
    input: &mut R,
    limit: SizeLimit,
    first: &mut bool,
) -> Result<Option<ArchiveItem>, ArchiveError> {
    loop {
        let Some(line) = next_envelope_line(input)? else {
            return Ok(None);
        };
        let header = parse_header(&line)?;
        let leading = std::mem::replace(first, false);

        if header.url.starts_with("filedesc:") {
            drain(input, header.length, &header.url)?;
            if leading {
                continue;
            }
            return Ok(Some(ArchiveItem::skip(header.url, SkipReason::ArchiveInfo)));
        }
        if header.url.starts_with("dns:") {
            drain(input, header.length, &header.url)?;
            return Ok(Some(ArchiveItem::skip(header.url, SkipReason::Dns)));
        }
        if !header.url.starts_with("http") {
            let block = read_capped(input, header.length, SizeLimit::Bytes(0), &header.url)?;
            return Ok(Some(ArchiveItem::Invalid(InvalidRecord {
                format: FORMAT,
                record_type: header.url.split(':').next().unwrap_or_default().to_string(),
                url: header.url,
                digest: block.digest,
            })));
        }

        return read_http(input, header, limit).map(Some);
    }
}

fn read_http<R: BufRead + ?Sized>(
    input: &mut R,
    header: ArcHeader,
    limit: SizeLimit,
) -> Result<ArchiveItem, ArchiveError> {
    let mut block = Read::take(&mut *input, header.length);
    let head = read_http_head(&mut block)?;
    let remaining = header.length.saturating_sub(head.header_len);
    let body = read_capped(&mut block, remaining, limit, &header.url)?;

    let http_status = match head.status {
        Some(code) => code.to_string(),
        None => header.status.unwrap_or_else(|| status_string(None)),
    };
    let payload_type = head
        .content_type
        .or_else(|| Some(header.mime).filter(|m| !m.is_empty() && m != "-"));

    Ok(ArchiveItem::Record(ArchiveRecordProxy {
        record_type: RecordType::Response,
        content_type: HTTP_RESPONSE_CONTENT_TYPE.to_string(),
        url: header.url,
        digest: body.digest.clone(),
        computed_digest: Some(body.digest),
        date: header.date,
        length: body.consumed,
        http_status: Some(http_status),
        payload_type,
        body: body.bytes,
    }))
}
