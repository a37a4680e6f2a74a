//! Content parsing.
//!
//! The pipeline treats text extraction as a collaborator behind the
//! [`Parser`] trait: bytes plus an optional declared content type go in,
//! extracted text and metadata come out. [`BasicParser`] is the bundled
//! implementation. It is deliberately small:
//!
//! | Content | Handling |
//! |---------|----------|
//! | `text/html`, `application/xhtml+xml` | title, meta keywords/description, anchors, visible text, paragraph text as `boiled` |
//! | other `text/*` | decoded and whitespace-collapsed |
//! | anything else | content type only, no text |
//!
//! When no content type is declared the payload is sniffed.
use url::Url;

use crate::error::ParseError;

/// Input to one parse.
#[derive(Debug, Clone, Copy)]
pub struct ParseInput<'a> {
    pub url: &'a str,
    /// Declared content type. `None` asks the parser to sniff.
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

/// Extracted text and metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutput {
    /// Content type the parser settled on, without parameters.
    pub content_type: String,
    pub title: String,
    pub text: String,
    /// Boilerplate-stripped text, when the parser can produce it.
    pub boiled: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    /// `(absolute url, anchor text)` pairs.
    pub links: Vec<(String, String)>,
}

/// Text-extraction collaborator.
pub trait Parser: Send + Sync {
    fn parse(&self, input: &ParseInput<'_>) -> Result<ParseOutput, ParseError>;
}

/// Strip parameters and lower-case a content type.
pub fn base_content_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Guess a content type from the first bytes of a payload.
pub fn sniff_content_type(body: &[u8]) -> &'static str {
    let head = &body[..body.len().min(512)];
    if head.starts_with(b"%PDF-") {
        return "application/pdf";
    }
    if head.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
        return "application/msword";
    }
    if head.starts_with(b"PK\x03\x04") {
        return "application/zip";
    }
    if head.starts_with(b"\x89PNG") {
        return "image/png";
    }
    if head.starts_with(b"GIF8") {
        return "image/gif";
    }
    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }

    let text = String::from_utf8_lossy(head).to_ascii_lowercase();
    let trimmed = text.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    const HTML_MARKERS: [&str; 5] = ["<!doctype html", "<html", "<head", "<title", "<body"];
    if HTML_MARKERS.iter().any(|marker| trimmed.starts_with(marker))
        || (trimmed.starts_with("<?xml") && trimmed.contains("<html"))
    {
        return "text/html";
    }
    if head.contains(&0) || (std::str::from_utf8(head).is_err() && !looks_textual(head)) {
        return "application/octet-stream";
    }
    "text/plain"
}

fn looks_textual(bytes: &[u8]) -> bool {
    let control = bytes
        .iter()
        .filter(|&&b| b < 0x09 || (0x0E..0x20).contains(&b))
        .count();
    control * 10 < bytes.len().max(1)
}

fn is_html(content_type: &str) -> bool {
    matches!(
        content_type,
        "text/html" | "application/xhtml+xml" | "application/xhtml"
    )
}

/// Bundled tag-stripping parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicParser;

impl BasicParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for BasicParser {
    fn parse(&self, input: &ParseInput<'_>) -> Result<ParseOutput, ParseError> {
        let content_type = match input.content_type.map(base_content_type) {
            Some(declared) if !declared.is_empty() => declared,
            _ => sniff_content_type(input.body).to_string(),
        };
        if !content_type.contains('/') {
            return Err(ParseError::Malformed(format!(
                "invalid content type {content_type:?}"
            )));
        }

        if is_html(&content_type) {
            let html = String::from_utf8_lossy(input.body);
            let base = Url::parse(input.url).ok();
            let mut output = extract_html(&html, base.as_ref());
            output.content_type = content_type;
            return Ok(output);
        }

        if content_type.starts_with("text/") {
            let text = String::from_utf8_lossy(input.body);
            return Ok(ParseOutput {
                content_type,
                text: collapse_whitespace(&text),
                ..ParseOutput::default()
            });
        }

        Ok(ParseOutput {
            content_type,
            ..ParseOutput::default()
        })
    }
}

/// Collapse runs of whitespace to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Default)]
struct HtmlState {
    title: String,
    text: String,
    paragraphs: Vec<String>,
    keywords: Option<String>,
    description: Option<String>,
    links: Vec<(String, String)>,
    in_title: bool,
    paragraph: Option<String>,
    anchor: Option<(String, String)>,
}

impl HtmlState {
    fn text(&mut self, raw: &str) {
        let decoded = decode_entities(raw);
        if self.in_title {
            self.title.push_str(&decoded);
            return;
        }
        self.text.push_str(&decoded);
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.push_str(&decoded);
        }
        if let Some((_, anchor_text)) = self.anchor.as_mut() {
            anchor_text.push_str(&decoded);
        }
    }

    fn close_paragraph(&mut self) {
        if let Some(paragraph) = self.paragraph.take() {
            let paragraph = collapse_whitespace(&paragraph);
            if !paragraph.is_empty() {
                self.paragraphs.push(paragraph);
            }
        }
    }

    fn close_anchor(&mut self) {
        if let Some((href, text)) = self.anchor.take() {
            self.links.push((href, collapse_whitespace(&text)));
        }
    }
}

fn extract_html(html: &str, base: Option<&Url>) -> ParseOutput {
    let mut state = HtmlState::default();
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        state.text(&rest[..open]);
        rest = &rest[open..];

        if rest.starts_with("<!--") {
            rest = rest.find("-->").map_or("", |end| &rest[end + 3..]);
            continue;
        }
        let Some(close) = rest.find('>') else {
            rest = "";
            break;
        };
        let tag = &rest[1..close];
        rest = &rest[close + 1..];

        let closing = tag.starts_with('/');
        let body = tag.trim_start_matches('/');
        let name_len = body
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(body.len());
        let name = body[..name_len].to_ascii_lowercase();
        let attrs = &body[name_len..];

        state.text.push(' ');
        if let Some(paragraph) = state.paragraph.as_mut() {
            paragraph.push(' ');
        }

        match (name.as_str(), closing) {
            ("script" | "style", false) => {
                let end_marker = format!("</{name}");
                rest = find_ignore_case(rest, &end_marker)
                    .map_or("", |end| &rest[end..]);
            }
            ("title", false) => state.in_title = true,
            ("title", true) => state.in_title = false,
            ("p", false) => {
                state.close_paragraph();
                state.paragraph = Some(String::new());
            }
            ("p" | "body" | "div" | "td" | "li", true) => state.close_paragraph(),
            ("a", false) => {
                state.close_anchor();
                if let Some(href) = attribute(attrs, "href") {
                    if let Some(resolved) = resolve_link(base, &href) {
                        state.anchor = Some((resolved, String::new()));
                    }
                }
            }
            ("a", true) => state.close_anchor(),
            ("meta", false) => {
                let name = attribute(attrs, "name").map(|n| n.to_ascii_lowercase());
                let content = attribute(attrs, "content").map(|c| collapse_whitespace(&decode_entities(&c)));
                match (name.as_deref(), content) {
                    (Some("keywords"), Some(content)) if !content.is_empty() => {
                        state.keywords = Some(content)
                    }
                    (Some("description"), Some(content)) if !content.is_empty() => {
                        state.description = Some(content)
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    state.text(rest);
    state.close_paragraph();
    state.close_anchor();

    let boiled = collapse_whitespace(&state.paragraphs.join("\n"));
    ParseOutput {
        content_type: String::new(),
        title: collapse_whitespace(&state.title),
        text: collapse_whitespace(&state.text),
        boiled: (!boiled.is_empty()).then_some(boiled),
        keywords: state.keywords,
        description: state.description,
        links: state.links,
    }
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Value of attribute `wanted` in a tag's attribute text.
fn attribute(attrs: &str, wanted: &str) -> Option<String> {
    let mut rest = attrs;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if rest.is_empty() {
            return None;
        }
        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remainder) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    match inner.find(quote) {
                        Some(end) => (&inner[..end], &inner[end + 1..]),
                        None => (inner, ""),
                    }
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            rest = remainder;
            value
        } else {
            ""
        };

        if name.eq_ignore_ascii_case(wanted) {
            return Some(value.trim().to_string());
        }
        if name.is_empty() {
            // Stray '=' with no name; skip one character to make progress.
            let mut chars = rest.chars();
            chars.next();
            rest = chars.as_str();
        }
    }
}

fn resolve_link(base: Option<&Url>, href: &str) -> Option<String> {
    let href = decode_entities(href.trim());
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(&href).ok()?,
        None => Url::parse(&href).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https" | "ftp").then(|| resolved.to_string())
}

/// Decode the handful of entities common in archived HTML.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..].find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &rest[1..=end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                        None => num.parse().ok()?,
                    };
                    char::from_u32(code)
                }),
            };
            ch.map(|ch| (ch, end + 2))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
