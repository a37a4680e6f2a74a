//! # Archive
//!
//! Reads ARC and WARC web-archive files and normalizes every record into one
//! shape, [`ArchiveRecordProxy`].
//!
//! ## Overview
//!
//! ```text
//! .arc / .warc (optionally gzip) ──► ArchiveReader ──► ArchiveItem::Record(ArchiveRecordProxy)
//!                                                  ├─► ArchiveItem::Skip(SkippedRecord)
//!                                                  └─► ArchiveItem::Invalid(InvalidRecord)
//! ```
//!
//! The two formats differ in framing only:
//!
//! | | ARC | WARC |
//! |-|-----|------|
//! | Envelope | one header line, framed here | `WARC/x.y` plus header block, framed by the `warc` crate |
//! | Digest | computed | declared `WARC-Payload-Digest`, else computed |
//! | Date | 14-digit field | RFC 3339 `WARC-Date`, converted |
//! | Archive header | leading `filedesc://` record, consumed | `warcinfo` record, skipped |
//!
//! ## Guarantees
//!
//! - **Uniform digests**: every digest reads `sha1:<BASE32>`.
//! - **Digest integrity**: the retained body may be truncated by
//!   [`SizeLimit`], the digest never is.
//! - **Strict lengths**: a record shorter than its declared length is an
//!   error, and the reader stops after any error.
//! - **Unknown types are not fatal**: a record of a type the reader does not
//!   know is read past and reported as [`ArchiveItem::Invalid`].
//! - **No exceptions for noise**: DNS lookups, requests, metadata and
//!   similar records come back as [`ArchiveItem::Skip`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use archive::{ArchiveItem, ArchiveReader, SizeLimit};
//!
//! let reader = ArchiveReader::open("crawl.warc.gz")?
//!     .with_size_limit(SizeLimit::from_config(1_048_576));
//! for item in reader {
//!     if let ArchiveItem::Record(record) = item? {
//!         println!("{} {} {}", record.url(), record.digest(), record.date());
//!     }
//! }
//! # Ok::<(), archive::ArchiveError>(())
//! ```

mod arc;
mod body;
mod digest;
mod dump;
mod error;
mod http;
mod limit;
mod reader;
mod record;
mod warc;

pub use crate::body::{drain, read_capped, CapturedBody};
pub use crate::digest::{digest_bytes, prefixed_digest, PayloadHasher, DIGEST_PREFIX};
pub use crate::dump::dump_records;
pub use crate::error::ArchiveError;
pub use crate::http::{parse_status_line, read_http_head, HttpHead};
pub use crate::limit::{SizeLimit, MAX_RETAINED_BYTES};
pub use crate::reader::{ArchiveFormat, ArchiveReader};
pub use crate::record::{
    ArchiveItem, ArchiveRecordProxy, InvalidRecord, RecordType, SkipReason, SkippedRecord,
    HTTP_RESPONSE_CONTENT_TYPE,
};
pub use crate::warc::normalize_warc_date;

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    fn warc_record(kind: &str, uri: &str, content_type: &str, extra: &str, block: &[u8]) -> Vec<u8> {
        let target = if uri.is_empty() {
            String::new()
        } else {
            format!("WARC-Target-URI: {uri}\r\n")
        };
        let mut out = format!(
            "WARC/1.0\r\nWARC-Type: {kind}\r\nWARC-Record-ID: <urn:uuid:0>\r\n{target}\
             WARC-Date: 2010-05-01T12:00:00Z\r\n{extra}Content-Type: {content_type}\r\n\
             Content-Length: {}\r\n\r\n",
            block.len()
        )
        .into_bytes();
        out.extend_from_slice(block);
        out.extend_from_slice(b"\r\n\r\n");
        out
    }

    fn arc_record(url: &str, block: &[u8]) -> Vec<u8> {
        let mut out =
            format!("{url} 10.0.0.1 20081219000000 text/html {}\n", block.len()).into_bytes();
        out.extend_from_slice(block);
        out.push(b'\n');
        out
    }

    fn sample_warc() -> Vec<u8> {
        let mut data = warc_record("warcinfo", "", "application/warc-fields", "", b"software: test\r\n");
        data.extend(warc_record(
            "response",
            "http://example.com/",
            "application/http; msgtype=response",
            "",
            b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html>hi</html>",
        ));
        data.extend(warc_record(
            "request",
            "http://example.com/",
            "application/http; msgtype=request",
            "",
            b"GET / HTTP/1.1\r\n\r\n",
        ));
        data.extend(warc_record(
            "response",
            "dns:example.com",
            "text/dns",
            "",
            b"example.com. 300 IN A 10.0.0.1",
        ));
        data.extend(warc_record(
            "revisit",
            "http://example.com/",
            "application/http; msgtype=response",
            "WARC-Payload-Digest: sha1:AAAA\r\n",
            b"",
        ));
        data.extend(warc_record(
            "resource",
            "ftp://ftp.example.com/file.bin",
            "application/octet-stream",
            "",
            b"\x00\x01\x02",
        ));
        data
    }

    #[test]
    fn warc_records_are_normalized() {
        let items: Vec<ArchiveItem> = ArchiveReader::from_reader("x.warc", Cursor::new(sample_warc()))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(items.len(), 6);

        assert!(matches!(&items[0], ArchiveItem::Skip(s) if s.reason == SkipReason::ArchiveInfo));
        let response = items[1].as_record().unwrap();
        assert_eq!(response.record_type(), RecordType::Response);
        assert!(response.is_http_response());
        assert_eq!(response.url(), "http://example.com/");
        assert_eq!(response.date(), "20100501120000");
        assert_eq!(response.http_status(), Some("200"));
        assert_eq!(response.payload_type(), Some("text/html"));
        assert_eq!(response.body(), b"<html>hi</html>");
        assert_eq!(response.length(), 15);
        assert_eq!(response.digest(), digest_bytes(b"<html>hi</html>"));
        assert_eq!(response.computed_digest(), Some(response.digest()));

        assert!(matches!(&items[2], ArchiveItem::Skip(s) if s.reason == SkipReason::Request));
        assert!(matches!(&items[3], ArchiveItem::Skip(s) if s.reason == SkipReason::Dns));

        let revisit = items[4].as_record().unwrap();
        assert_eq!(revisit.record_type(), RecordType::Revisit);
        assert_eq!(revisit.digest(), "sha1:AAAA");
        assert!(revisit.body().is_empty());

        let ftp = items[5].as_record().unwrap();
        assert_eq!(ftp.record_type(), RecordType::Resource);
        assert_eq!(ftp.http_status(), Some("200"));
        assert_eq!(ftp.payload_type(), Some("application/octet-stream"));
        assert_eq!(ftp.body(), b"\x00\x01\x02");
    }

    #[test]
    fn declared_digest_wins_for_warc() {
        let data = warc_record(
            "response",
            "http://example.com/",
            "application/http;msgtype=response",
            "WARC-Payload-Digest: sha1:DECLARED\r\n",
            b"HTTP/1.1 200 OK\r\n\r\nbody",
        );
        let record = ArchiveReader::from_reader("x.warc", Cursor::new(data))
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.digest(), "sha1:DECLARED");
        assert_eq!(record.computed_digest(), Some(digest_bytes(b"body").as_str()));
    }

    #[test]
    fn arc_skips_filedesc_and_computes_digest() {
        let mut data = arc_record("filedesc://test.arc", b"1 0 InternetArchive\nURL IP-address Archive-date Content-type Archive-length\n");
        data.extend(arc_record(
            "http://example.com/a",
            b"HTTP/1.0 404 Not Found\nContent-Type: text/plain\n\nmissing",
        ));
        data.extend(arc_record("dns:example.com", b"example.com. 300 IN A 10.0.0.1"));

        let items: Vec<ArchiveItem> = ArchiveReader::from_reader("x.arc", Cursor::new(data))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(items.len(), 2);
        let record = items[0].as_record().unwrap();
        assert_eq!(record.url(), "http://example.com/a");
        assert_eq!(record.date(), "20081219000000");
        assert_eq!(record.http_status(), Some("404"));
        assert_eq!(record.body(), b"missing");
        assert_eq!(record.digest(), digest_bytes(b"missing"));
        assert_eq!(record.content_type(), HTTP_RESPONSE_CONTENT_TYPE);
        assert!(matches!(&items[1], ArchiveItem::Skip(s) if s.reason == SkipReason::Dns));
    }

    #[test]
    fn unknown_arc_scheme_is_read_past() {
        let mut data = arc_record("filedesc://test.arc", b"x");
        data.extend(arc_record("mailto:someone@example.com", b"hello"));
        data.extend(arc_record("http://example.com/b", b"HTTP/1.0 200 OK\n\nok"));
        let items: Vec<ArchiveItem> = ArchiveReader::from_reader("x.arc", Cursor::new(data))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(items.len(), 2);
        let ArchiveItem::Invalid(invalid) = &items[0] else {
            panic!("expected invalid item");
        };
        assert_eq!(invalid.record_type, "mailto");
        assert_eq!(invalid.digest, digest_bytes(b"hello"));
        assert!(matches!(invalid.to_error(), ArchiveError::UnknownRecordType { .. }));
        assert_eq!(items[1].as_record().unwrap().url(), "http://example.com/b");
    }

    #[test]
    fn unknown_warc_type_is_read_past() {
        let mut data = warc_record("bogus", "http://example.com/x", "text/plain", "", b"x");
        data.extend(warc_record(
            "response",
            "http://example.com/after",
            HTTP_RESPONSE_CONTENT_TYPE,
            "",
            b"HTTP/1.1 200 OK\r\n\r\nafter",
        ));
        let items: Vec<ArchiveItem> = ArchiveReader::from_reader("x.warc", Cursor::new(data))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], ArchiveItem::Invalid(i) if i.url == "http://example.com/x"));
        assert_eq!(items[1].as_record().unwrap().body(), b"after");
    }

    #[test]
    fn gzip_members_are_decoded_and_sniffed() {
        let mut gz = Vec::new();
        for chunk in [warc_record("warcinfo", "", "text/plain", "", b"x"), sample_warc()] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&chunk).unwrap();
            gz.extend(encoder.finish().unwrap());
        }
        let reader = ArchiveReader::from_reader("no-extension", Cursor::new(gz)).unwrap();
        assert_eq!(reader.format(), ArchiveFormat::Warc);
        assert_eq!(reader.count(), 7);
    }

    #[test]
    fn truncated_record_fuses_reader() {
        let mut data = warc_record(
            "response",
            "http://example.com/",
            "application/http; msgtype=response",
            "",
            b"HTTP/1.1 200 OK\r\n\r\nbody",
        );
        data.truncate(data.len() - 8);
        let mut reader = ArchiveReader::from_reader("x.warc", Cursor::new(data)).unwrap();
        assert!(matches!(reader.next(), Some(Err(ArchiveError::Framing { .. }))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn truncated_arc_record_is_length_mismatch() {
        let mut data = arc_record("filedesc://test.arc", b"x");
        data.extend(arc_record("http://example.com/a", b"HTTP/1.0 200 OK\n\nmissing bytes"));
        data.truncate(data.len() - 6);
        let mut reader = ArchiveReader::from_reader("x.arc", Cursor::new(data)).unwrap();
        assert!(matches!(
            reader.next(),
            Some(Err(ArchiveError::LengthMismatch { .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn size_limit_keeps_digest() {
        let body = vec![b'x'; 10_000];
        let mut block = b"HTTP/1.1 200 OK\r\n\r\n".to_vec();
        block.extend_from_slice(&body);
        let data = warc_record("response", "http://example.com/", HTTP_RESPONSE_CONTENT_TYPE, "", &block);

        let capped = ArchiveReader::from_reader("x.warc", Cursor::new(data.clone()))
            .unwrap()
            .with_size_limit(SizeLimit::from_config(100))
            .next()
            .unwrap()
            .unwrap()
            .into_record()
            .unwrap();
        let full = ArchiveReader::from_reader("x.warc", Cursor::new(data))
            .unwrap()
            .with_size_limit(SizeLimit::from_config(-1))
            .next()
            .unwrap()
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(capped.body().len(), 100);
        assert!(capped.is_truncated());
        assert_eq!(full.body().len(), 10_000);
        assert_eq!(capped.digest(), full.digest());
        assert_eq!(capped.length(), 10_000);
    }

    #[test]
    fn dump_lists_every_item() {
        let reader = ArchiveReader::from_reader("x.warc", Cursor::new(sample_warc())).unwrap();
        let mut out = Vec::new();
        assert_eq!(dump_records(reader, &mut out).unwrap(), 6);
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().any(|l| l.starts_with("response\t") && l.contains("http://example.com/")));
        assert!(text.lines().any(|l| l == "skip\tdns\tdns:example.com"));
    }

    #[test]
    fn open_detects_format_from_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.warc");
        std::fs::write(&path, sample_warc()).unwrap();

        let reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.format(), ArchiveFormat::Warc);
        assert!(reader.name().ends_with("capture.warc"));
        assert_eq!(reader.filter_map(Result::ok).filter_map(ArchiveItem::into_record).count(), 3);
    }
}
