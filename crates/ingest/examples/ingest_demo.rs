use std::io::Cursor;

use archive::ArchiveReader;
use ingest::{ingest_archive, BasicParser, IngestConfig, IngestError};

fn response(uri: &str, html: &str) -> Vec<u8> {
    let block = format!("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n{html}");
    let mut record = format!(
        "WARC/1.0\r\nWARC-Type: response\r\nWARC-Record-ID: <urn:uuid:0>\r\nWARC-Target-URI: {uri}\r\n\
         WARC-Date: 2010-05-01T12:00:00Z\r\n\
         Content-Type: application/http; msgtype=response\r\n\
         Content-Length: {}\r\n\r\n",
        block.len()
    )
    .into_bytes();
    record.extend_from_slice(block.as_bytes());
    record.extend_from_slice(b"\r\n\r\n");
    record
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut warc = response(
        "http://example.com/",
        "<title>Example</title><p>Hello <a href=\"/about\">about</a></p>",
    );
    warc.extend(response("http://example.com/about", "<title>About</title><p>Us.</p>"));

    let reader = ArchiveReader::from_reader("demo.warc", Cursor::new(warc))?;

    let config = IngestConfig::default().with_collection("demo");
    let stats = ingest_archive(reader, &BasicParser, &config, |key, doc| {
        match doc.to_json() {
            Ok(json) => println!("{key}\t{json}"),
            Err(err) => eprintln!("{key}: {err}"),
        }
        Ok::<(), IngestError>(())
    })?;
    println!("{stats:?}");
    Ok(())
}
