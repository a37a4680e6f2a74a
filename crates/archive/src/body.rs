//! Capped body reads.
//!
//! A record body is read in fixed-size chunks and every chunk goes to two
//! sinks:
//!
//! ```text
//!                ┌──► PayloadHasher   (every byte)
//! record block ──┤
//!                └──► retained Vec    (first `limit` bytes)
//! ```
//!
//! Reading continues past the retention cap until the block is exhausted,
//! so the digest always covers the whole payload and the stream ends up at
//! the record boundary. A short block means the envelope lied about its
//! length, which is reported as [`ArchiveError::LengthMismatch`].
use std::io::{self, Read};

use crate::digest::PayloadHasher;
use crate::error::ArchiveError;
use crate::limit::SizeLimit;

const CHUNK_SIZE: usize = 64 * 1024;

/// Initial buffer reservation; the buffer grows on demand up to the cap.
const INITIAL_RESERVE: usize = 1 << 20;

/// A fully consumed record body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedBody {
    /// Retained prefix of the body, at most the configured limit.
    pub bytes: Vec<u8>,
    /// `sha1:<BASE32>` over every consumed byte.
    pub digest: String,
    /// Total bytes consumed.
    pub consumed: u64,
}

/// Read exactly `declared` bytes from `input`, retaining at most `limit` of
/// them.
pub fn read_capped<R: Read + ?Sized>(
    input: &mut R,
    declared: u64,
    limit: SizeLimit,
    url: &str,
) -> Result<CapturedBody, ArchiveError> {
    let retain = limit.retained_len(declared);
    let mut bytes = Vec::with_capacity(retain.min(INITIAL_RESERVE));
    let mut hasher = PayloadHasher::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];

    while hasher.consumed() < declared {
        let want = (declared - hasher.consumed()).min(CHUNK_SIZE as u64) as usize;
        let n = match input.read(&mut chunk[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        hasher.update(&chunk[..n]);
        let room = retain - bytes.len();
        bytes.extend_from_slice(&chunk[..n.min(room)]);
    }

    let consumed = hasher.consumed();
    if consumed != declared {
        return Err(ArchiveError::LengthMismatch {
            url: url.to_string(),
            expected: declared,
            actual: consumed,
        });
    }

    Ok(CapturedBody {
        bytes,
        digest: hasher.finish(),
        consumed,
    })
}

/// Discard exactly `declared` bytes, failing on a short read.
pub fn drain<R: Read + ?Sized>(input: &mut R, declared: u64, url: &str) -> Result<(), ArchiveError> {
    let consumed = io::copy(&mut Read::take(&mut *input, declared), &mut io::sink())?;
    if consumed != declared {
        return Err(ArchiveError::LengthMismatch {
            url: url.to_string(),
            expected: declared,
            actual: consumed,
        });
    }
    Ok(())
}
