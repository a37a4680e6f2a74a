//! Synthetic archive files for the integration tests.
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

pub const PAGE: &str = "<html><head><title>Example Page</title></head>\
    <body><p>Hello archive world.</p><a href=\"/next\">next page</a></body></html>";

pub fn http_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out =
        format!("HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\n\r\n").into_bytes();
    out.extend_from_slice(body);
    out
}

pub fn warc_record(kind: &str, uri: &str, content_type: &str, extra: &str, block: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "WARC/1.0\r\nWARC-Type: {kind}\r\nWARC-Record-ID: <urn:uuid:0>\r\nWARC-Target-URI: {uri}\r\n\
         WARC-Date: 2010-05-01T12:00:00Z\r\n{extra}Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\r\n",
        block.len()
    )
    .into_bytes();
    out.extend_from_slice(block);
    out.extend_from_slice(b"\r\n\r\n");
    out
}

pub fn warc_response(uri: &str, status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    warc_record(
        "response",
        uri,
        "application/http; msgtype=response",
        "",
        &http_response(status, content_type, body),
    )
}

/// A small crawl: info, request, one page, a revisit of it, and a DNS lookup.
pub fn sample_warc() -> Vec<u8> {
    let mut out = warc_record("warcinfo", "test.warc", "application/warc-fields", "", b"software: test\r\n");
    out.extend(warc_record(
        "request",
        "http://example.com/",
        "application/http; msgtype=request",
        "",
        b"GET / HTTP/1.1\r\n\r\n",
    ));
    out.extend(warc_response("http://example.com/", "200 OK", "text/html", PAGE.as_bytes()));
    out.extend(warc_record(
        "revisit",
        "http://example.com/",
        "application/http; msgtype=response",
        &format!("WARC-Payload-Digest: {}\r\n", archive::digest_bytes(PAGE.as_bytes())),
        b"",
    ));
    out.extend(warc_record("response", "dns:example.com", "text/dns", "", b"example.com. 60 IN A 10.0.0.1"));
    out
}

pub fn arc_filedesc() -> Vec<u8> {
    let block = b"1 0 Test\nURL IP-address Archive-date Content-type Archive-length\n";
    let mut out = format!(
        "filedesc://test.arc 0.0.0.0 20100501120000 text/plain {}\n",
        block.len()
    )
    .into_bytes();
    out.extend_from_slice(block);
    out.push(b'\n');
    out
}

pub fn arc_record(url: &str, date: &str, mime: &str, block: &[u8]) -> Vec<u8> {
    let mut out =
        format!("{url} 10.0.0.1 {date} {mime} {}\n", block.len()).into_bytes();
    out.extend_from_slice(block);
    out.push(b'\n');
    out
}

/// The ARC members of a small crawl, one `Vec` per record.
pub fn sample_arc_members() -> Vec<Vec<u8>> {
    vec![
        arc_filedesc(),
        arc_record(
            "http://example.com/",
            "20100501120000",
            "text/html",
            &http_response("200 OK", "text/html", PAGE.as_bytes()),
        ),
        arc_record(
            "http://example.com/notes.txt",
            "20100501120500",
            "text/plain",
            &http_response("200 OK", "text/plain", b"plain   text\nnotes"),
        ),
    ]
}

/// Gzip each member separately, the way archive writers do.
pub fn gzip_members(members: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for member in members {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(member).unwrap();
        out.extend(encoder.finish().unwrap());
    }
    out
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
