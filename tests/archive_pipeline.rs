mod common;

use arcdoc::{
    parse_archive_file, BasicParser, Document, IdentityKey, IngestConfig, IngestError,
    PipelineError,
};
use archive::digest_bytes;
use tempfile::tempdir;

use common::*;

fn parse_bytes(name: &str, bytes: &[u8], config: &IngestConfig) -> Result<Vec<(IdentityKey, Document)>, PipelineError> {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), name, bytes);
    let mut docs = Vec::new();
    parse_archive_file(&path, &BasicParser, config, &mut docs)?;
    Ok(docs)
}

#[test]
fn warc_crawl_yields_page_and_revisit() -> Result<(), PipelineError> {
    let docs = parse_bytes("crawl.warc", &sample_warc(), &IngestConfig::default())?;
    assert_eq!(docs.len(), 2, "warcinfo, request and dns records are skipped");

    let digest = digest_bytes(PAGE.as_bytes());
    let (key, page) = &docs[0];
    assert_eq!(key, &IdentityKey::new("http://example.com/", digest.clone()));
    assert_eq!(page.get("url"), "http://example.com/");
    assert_eq!(page.get("digest"), digest);
    assert_eq!(page.get("date"), "20100501120000");
    assert_eq!(page.get("code"), "200");
    assert_eq!(page.get("type"), "text/html");
    assert_eq!(page.get("title"), "Example Page");
    assert_eq!(page.get("length"), PAGE.len().to_string());
    assert!(page.get("content").contains("Hello archive world."));
    assert_eq!(page.links().len(), 1);
    assert_eq!(page.links()[0].url, "http://example.com/next");

    let (revisit_key, revisit) = &docs[1];
    assert_eq!(revisit_key, key);
    assert_eq!(revisit.get("date"), "20100501120000");
    assert!(revisit.get("title").is_empty());
    assert!(revisit.links().is_empty());
    Ok(())
}

#[test]
fn gzipped_and_plain_arc_agree() -> Result<(), PipelineError> {
    let members = sample_arc_members();
    let plain = parse_bytes("crawl.arc", &members.concat(), &IngestConfig::default())?;
    let gzipped = parse_bytes("crawl.arc.gz", &gzip_members(&members), &IngestConfig::default())?;

    assert_eq!(plain.len(), 2);
    assert_eq!(plain, gzipped);

    let (_, notes) = &plain[1];
    assert_eq!(notes.get("url"), "http://example.com/notes.txt");
    assert_eq!(notes.get("type"), "text/plain");
    assert_eq!(notes.get("content"), "plain text notes");
    assert_eq!(notes.get("date"), "20100501120500");
    Ok(())
}

#[test]
fn gzipped_warc_is_detected_without_extension() -> Result<(), PipelineError> {
    let docs = parse_bytes("crawl.bin", &gzip_members(&[sample_warc()]), &IngestConfig::default())?;
    assert_eq!(docs.len(), 2);
    Ok(())
}

#[test]
fn content_limit_truncates_body_but_not_digest() -> Result<(), PipelineError> {
    let body = format!("<html><body><p>{}</p></body></html>", "word ".repeat(400));
    let warc = warc_response("http://example.com/big", "200 OK", "text/html", body.as_bytes());
    let config = IngestConfig::default().with_content_limit(64);

    let docs = parse_bytes("big.warc", &warc, &config)?;
    let (key, doc) = &docs[0];
    assert_eq!(key.digest(), digest_bytes(body.as_bytes()));
    assert_eq!(doc.get("length"), body.len().to_string());
    assert!(doc.get("content").len() < 64);
    Ok(())
}

#[test]
fn collection_and_outlink_settings_apply() -> Result<(), PipelineError> {
    let config = IngestConfig::default()
        .with_collection("crawl-2010")
        .with_emit_outlinks(false);
    let docs = parse_bytes("crawl.warc", &sample_warc(), &config)?;
    for (_, doc) in &docs {
        assert_eq!(doc.get("collection"), "crawl-2010");
        assert!(doc.links().is_empty());
    }
    Ok(())
}

#[test]
fn unknown_record_type_aborts_or_is_replaced_by_error_document() {
    let mut warc = warc_response("http://example.com/", "200 OK", "text/html", PAGE.as_bytes());
    warc.extend(warc_record("bogus", "http://example.com/x", "text/plain", "", b"x"));
    warc.extend(warc_response("http://good.example/", "200 OK", "text/plain", b"still read"));

    let err = parse_bytes("bad.warc", &warc, &IngestConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::Archive { .. })));

    let tolerant = IngestConfig::default().with_abort_on_archive_error(false);
    let docs = parse_bytes("bad.warc", &warc, &tolerant).unwrap();
    assert_eq!(docs.len(), 3, "records on both sides of the bad one are kept");

    let (key, error_doc) = &docs[1];
    assert_eq!(key, &IdentityKey::new("http://example.com/x", digest_bytes(b"x")));
    assert_eq!(error_doc.get("status"), "error");
    assert!(error_doc.get("errorMessage").contains("bogus"));

    let (_, good) = &docs[2];
    assert_eq!(good.get("url"), "http://good.example/");
    assert_eq!(good.get("content"), "still read");
}

#[test]
fn corrupt_framing_abandons_rest_of_file() {
    let mut warc = warc_response("http://example.com/", "200 OK", "text/html", PAGE.as_bytes());
    warc.extend_from_slice(b"WARC/1.0\r\nWARC-Type: response\r\n\r\n");
    warc.extend(warc_response("http://example.com/after", "200 OK", "text/plain", b"never read"));

    let tolerant = IngestConfig::default().with_abort_on_archive_error(false);
    let docs = parse_bytes("corrupt.warc", &warc, &tolerant).unwrap();
    assert_eq!(docs.len(), 1);
}

#[test]
fn short_record_is_fatal() {
    let mut warc = warc_response("http://example.com/", "200 OK", "text/html", PAGE.as_bytes());
    // Declare more bytes than the file holds.
    let cut = warc.len() - 40;
    warc.truncate(cut);
    let err = parse_bytes("short.warc", &warc, &IngestConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::Archive { .. })));
}

#[test]
fn http_error_status_is_recorded() -> Result<(), PipelineError> {
    let warc = warc_response("http://example.com/missing", "404 Not Found", "text/html", b"<html><title>Gone</title></html>");
    let docs = parse_bytes("404.warc", &warc, &IngestConfig::default())?;
    assert_eq!(docs[0].1.get("code"), "404");
    Ok(())
}
