//! WOFF 1.0 encoding
//!
//! Tables are individually zlib-compressed and stored raw whenever
//! compression does not make them smaller.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::{EncodeInput, FormatEncoder};
use crate::error::FontError;
use crate::sfnt::{align4, directory_checksum, pad4, SfntFont};

const WOFF_SIGNATURE: u32 = 0x774F_4646; // 'wOFF'
const HEADER_LEN: usize = 44;
const DIRECTORY_ENTRY_LEN: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct WoffEncoder {
    compression: Compression,
}

impl Default for WoffEncoder {
    fn default() -> Self {
        Self {
            compression: Compression::best(),
        }
    }
}

impl FormatEncoder for WoffEncoder {
    fn name(&self) -> &'static str {
        "zlib-woff"
    }

    fn encode(&self, input: &EncodeInput<'_>) -> Result<Vec<u8>, FontError> {
        encode_woff_with(input.truetype, self.compression)
    }
}

/// Wrap an sfnt in a WOFF 1.0 container
pub fn encode_woff(sfnt: &[u8]) -> Result<Vec<u8>, FontError> {
    encode_woff_with(sfnt, Compression::best())
}

fn encode_woff_with(sfnt: &[u8], compression: Compression) -> Result<Vec<u8>, FontError> {
    let font = SfntFont::parse(sfnt)?;
    let num_tables = font.tables().count();

    let mut directory = Vec::with_capacity(num_tables * DIRECTORY_ENTRY_LEN);
    let mut data = Vec::new();
    let data_start = HEADER_LEN + num_tables * DIRECTORY_ENTRY_LEN;

    for (tag, table) in font.tables() {
        let compressed = zlib(table, compression)?;
        let stored = if compressed.len() < table.len() {
            compressed.as_slice()
        } else {
            table
        };

        let offset = data_start + data.len();
        directory.extend_from_slice(tag);
        directory.extend_from_slice(&(offset as u32).to_be_bytes());
        directory.extend_from_slice(&(stored.len() as u32).to_be_bytes());
        directory.extend_from_slice(&(table.len() as u32).to_be_bytes());
        directory.extend_from_slice(&directory_checksum(tag, table).to_be_bytes());

        data.extend_from_slice(stored);
        pad4(&mut data);
    }

    let total_sfnt_size = 12
        + 16 * num_tables
        + font.tables().map(|(_, t)| align4(t.len())).sum::<usize>();
    let length = data_start + data.len();

    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(&WOFF_SIGNATURE.to_be_bytes());
    out.extend_from_slice(&font.flavor().to_be_bytes());
    out.extend_from_slice(&(length as u32).to_be_bytes());
    out.extend_from_slice(&(num_tables as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // reserved
    out.extend_from_slice(&(total_sfnt_size as u32).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // majorVersion
    out.extend_from_slice(&0u16.to_be_bytes()); // minorVersion
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&data);
    Ok(out)
}

fn zlib(data: &[u8], compression: Compression) -> Result<Vec<u8>, FontError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), compression);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
