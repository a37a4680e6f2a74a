//! Human-readable record listing for debugging archive files.
use std::io::Write;

use crate::error::ArchiveError;
use crate::reader::ArchiveReader;
use crate::record::ArchiveItem;

/// Write one tab-separated line per record to `out` and return the number of
/// lines written.
///
/// Records print as
/// `type  content-type  url  digest  date  length  status  retained-bytes`;
/// skipped records print as `skip  reason  url` and records of an unknown
/// type as `invalid  type  url`.
pub fn dump_records<W: Write>(reader: ArchiveReader, out: &mut W) -> Result<u64, ArchiveError> {
    let mut lines = 0;
    for item in reader {
        match item? {
            ArchiveItem::Record(record) => writeln!(out, "{record}")?,
            ArchiveItem::Skip(skip) => writeln!(out, "skip\t{}\t{}", skip.reason, skip.url)?,
            ArchiveItem::Invalid(invalid) => {
                writeln!(out, "invalid\t{}\t{}", invalid.record_type, invalid.url)?
            }
        }
        lines += 1;
    }
    out.flush()?;
    Ok(lines)
}
