//! ZIP packaging of the finished kit

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::FontError;

/// Bundle named buffers into a ZIP archive.
///
/// Entries are written in the given order with a fixed timestamp, so the
/// same entries always produce the same bytes.
pub fn build_archive<'a, I>(entries: I) -> Result<Vec<u8>, FontError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer.start_file(name, options)?;
        writer.write_all(bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}
