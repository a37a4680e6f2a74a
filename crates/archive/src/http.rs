//! Lenient HTTP response-header scanning.
//!
//! Archived responses are frequently malformed, so the header block is
//! located with a small state machine instead of a strict parser:
//!
//! | State       | `\n`       | space, tab, `\r` | other |
//! |-------------|-------------|-------------------|-------|
//! | `Text`      | `LineStart` | `Text`            | `Text` |
//! | `LineStart` | done        | `Blank`           | `Text` |
//! | `Blank`     | done        | `Blank`           | `Text` |
//!
//! A newline, optionally followed by spaces, tabs or carriage returns, and a
//! second newline ends the header block. Reaching end of input first is not
//! an error; the whole record is treated as headers and the body is empty.
//!
//! Only two facts are extracted: the status code from the first line and
//! the `Content-Type` header.
use std::io::{self, BufRead};

/// Header bytes retained for parsing. The scan itself is unbounded.
const MAX_HEADER_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Text,
    LineStart,
    Blank,
}

/// Facts extracted from an HTTP response header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHead {
    /// Status code, or `None` if the status line was unparseable.
    pub status: Option<u16>,
    /// `Content-Type` header value, trimmed.
    pub content_type: Option<String>,
    /// Bytes consumed from the stream, including the terminating blank line.
    pub header_len: u64,
}

/// Consume an HTTP header block from `input`, leaving it positioned at the
/// first body byte.
pub fn read_http_head<R: BufRead + ?Sized>(input: &mut R) -> io::Result<HttpHead> {
    let mut state = ScanState::Text;
    let mut retained = Vec::with_capacity(512);
    let mut header_len = 0u64;

    'scan: loop {
        let available = match input.fill_buf() {
            Ok(buf) => buf,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        if available.is_empty() {
            break;
        }

        let mut used = 0;
        let mut done = false;
        for &byte in available {
            used += 1;
            state = match (state, byte) {
                (ScanState::LineStart | ScanState::Blank, b'\n') => {
                    done = true;
                    state
                }
                (ScanState::LineStart | ScanState::Blank, b' ' | b'\t' | b'\r') => {
                    ScanState::Blank
                }
                (_, b'\n') => ScanState::LineStart,
                _ => ScanState::Text,
            };
            if done {
                break;
            }
        }

        let take = (MAX_HEADER_BYTES - retained.len().min(MAX_HEADER_BYTES)).min(used);
        retained.extend_from_slice(&available[..take]);
        input.consume(used);
        header_len += used as u64;
        if done {
            break 'scan;
        }
    }

    let text = String::from_utf8_lossy(&retained);
    let mut lines = text.lines();
    let status = lines.next().and_then(parse_status_line);
    let content_type = lines.find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-type") {
            Some(value.trim().to_string()).filter(|v| !v.is_empty())
        } else {
            None
        }
    });

    Ok(HttpHead {
        status,
        content_type,
        header_len,
    })
}

/// Parse `HTTP/1.1 200 OK` into `200`.
pub fn parse_status_line(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();
    let version = parts.next()?;
    if !version.to_ascii_uppercase().starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}
