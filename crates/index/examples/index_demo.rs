use document::Document;
use index::{DocumentIndex, DocumentSink, IndexConfig, IndexError, SinkOutcome};

fn page(url: &str, code: &str, content_type: &str) -> Document {
    let mut doc = Document::new();
    doc.set("url", url);
    doc.set("digest", "sha1:3I42H3S6NNFQ2MSVX7XZKYAYSCX5QBYJ");
    doc.set("code", code);
    doc.set("type", content_type);
    doc.set("date", "20100501120000");
    doc
}

fn main() -> Result<(), IndexError> {
    let mut index = DocumentIndex::new(IndexConfig::default().with_http_status("200-299 304"))?;

    let docs = [
        page("http://www.example.com/", "200", "text/html; charset=utf-8"),
        page("http://example.com/report", "304", "application/x-pdf"),
        page("http://example.com/gone", "404", "text/html"),
        page("http://example.com/robots.txt", "200", "text/plain"),
        page("http://example.com/logo.png", "200", "image/png"),
    ];

    for doc in &docs {
        let Some(key) = doc.identity_key() else {
            continue;
        };
        match index.add(&key, doc)? {
            SinkOutcome::Admitted => println!("admitted {key}"),
            SinkOutcome::Rejected { filter } => println!("rejected {key} by {filter}"),
        }
    }
    index.flush()?;

    index.scan(&mut |record| {
        println!("{} type={:?} site={:?}", record.key, record.get("type"), record.terms("site"));
        Ok(())
    })
}
