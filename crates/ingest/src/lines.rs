//! Text-line input for the merge stage.
//!
//! The merge stage reads line-oriented text besides parse output:
//!
//! | Line | Meaning |
//! |------|---------|
//! | blank, or starting with `#` | ignored |
//! | starting with `{` | one JSON document |
//! | anything else | one CDX line |
//!
//! CDX lines carry at least nine whitespace-separated fields. Only three are
//! used: field 0 (URL key), field 1 (capture date) and field 5 (bare base32
//! digest, which gets the `sha1:` prefix). `dns:` lines produce nothing.
use archive::prefixed_digest;
use document::{names, Document, IdentityKey};
use tracing::warn;

/// Minimum field count of a CDX line.
pub const CDX_FIELDS: usize = 9;

/// Result of mapping one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Mapped(IdentityKey, Document),
    /// Comment, blank or `dns:` line.
    Ignored,
    /// Unusable line; the reason has been logged.
    Malformed(String),
}

/// Map one JSON or CDX line to a keyed document.
pub fn map_line(line: &str) -> LineOutcome {
    let line = line.trim();
    let outcome = match line.chars().next() {
        None | Some('#') => return LineOutcome::Ignored,
        Some('{') => map_json(line),
        Some(_) => map_cdx(line),
    };
    if let LineOutcome::Malformed(reason) = &outcome {
        warn!(reason = %reason, line = %truncate_for_log(line), "line_skipped");
    }
    outcome
}

fn map_json(line: &str) -> LineOutcome {
    let doc = match Document::from_json(line) {
        Ok(doc) => doc,
        Err(err) => return LineOutcome::Malformed(format!("malformed json line: {err}")),
    };
    match doc.identity_key() {
        Some(key) => LineOutcome::Mapped(key, doc),
        None => LineOutcome::Malformed("missing url or digest".to_string()),
    }
}

fn map_cdx(line: &str) -> LineOutcome {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields[0].starts_with("dns:") {
        return LineOutcome::Ignored;
    }
    if fields.len() < CDX_FIELDS {
        return LineOutcome::Malformed(format!(
            "malformed cdx line, expected {CDX_FIELDS} fields, found {}",
            fields.len()
        ));
    }
    let digest = prefixed_digest(fields[5]);
    let mut doc = Document::new();
    doc.set(names::URL, fields[0]);
    doc.set(names::DATE, fields[1]);
    doc.set(names::DIGEST, &digest);
    LineOutcome::Mapped(IdentityKey::new(fields[0], digest), doc)
}

fn truncate_for_log(line: &str) -> &str {
    match line.char_indices().nth(200) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}
