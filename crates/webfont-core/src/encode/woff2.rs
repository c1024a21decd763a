//! WOFF 2.0 encoding with null table transforms
//!
//! All tables go into one brotli stream untransformed. `glyf` and `loca` are
//! flagged with transform version 3 (the null transform for those two
//! tables) and `loca` is placed directly after `glyf` in the directory.

use std::io::Write;

use super::{EncodeInput, FormatEncoder};
use crate::error::FontError;
use crate::sfnt::{pad4, SfntFont, Tag};

const WOFF2_SIGNATURE: u32 = 0x774F_4632; // 'wOF2'
const HEADER_LEN: usize = 48;
const ARBITRARY_TAG: u8 = 63;
const GLYF_LOCA_NULL_TRANSFORM: u8 = 3 << 6;

/// Directory index of each table tag with a one-byte encoding
const KNOWN_TAGS: [&Tag; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

#[derive(Debug, Clone, Copy)]
pub struct Woff2Encoder {
    quality: u32,
    window: u32,
}

impl Default for Woff2Encoder {
    fn default() -> Self {
        Self {
            quality: 11,
            window: 22,
        }
    }
}

impl FormatEncoder for Woff2Encoder {
    fn name(&self) -> &'static str {
        "brotli-woff2"
    }

    fn encode(&self, input: &EncodeInput<'_>) -> Result<Vec<u8>, FontError> {
        encode_woff2_with(input.truetype, self.quality, self.window)
    }
}

/// Wrap an sfnt in a WOFF 2.0 container
pub fn encode_woff2(sfnt: &[u8]) -> Result<Vec<u8>, FontError> {
    let defaults = Woff2Encoder::default();
    encode_woff2_with(sfnt, defaults.quality, defaults.window)
}

fn encode_woff2_with(sfnt: &[u8], quality: u32, window: u32) -> Result<Vec<u8>, FontError> {
    let font = SfntFont::parse(sfnt)?;
    let tables = directory_order(&font);

    let mut directory = Vec::new();
    let mut stream = Vec::new();
    for (tag, data) in &tables {
        let known = KNOWN_TAGS.iter().position(|known| *known == *tag);
        let mut flags = known.map_or(ARBITRARY_TAG, |index| index as u8);
        if *tag == b"glyf" || *tag == b"loca" {
            flags |= GLYF_LOCA_NULL_TRANSFORM;
        }
        directory.push(flags);
        if known.is_none() {
            directory.extend_from_slice(*tag);
        }
        write_base128(&mut directory, data.len() as u32);
        stream.extend_from_slice(data);
    }

    let compressed = brotli_compress(&stream, quality, window)?;

    let mut out = Vec::with_capacity(HEADER_LEN + directory.len() + compressed.len() + 3);
    out.extend_from_slice(&WOFF2_SIGNATURE.to_be_bytes());
    out.extend_from_slice(&font.flavor().to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes()); // length, patched below
    out.extend_from_slice(&font.num_tables().to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // reserved
    out.extend_from_slice(&(font.sfnt_size() as u32).to_be_bytes());
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // majorVersion
    out.extend_from_slice(&0u16.to_be_bytes()); // minorVersion
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    pad4(&mut out);

    let length = out.len() as u32;
    out[8..12].copy_from_slice(&length.to_be_bytes());
    Ok(out)
}

/// Tag order with `loca` moved directly behind `glyf`
fn directory_order(font: &SfntFont) -> Vec<(&Tag, &[u8])> {
    let mut tables: Vec<(&Tag, &[u8])> = font
        .tables()
        .filter(|(tag, _)| *tag != b"loca")
        .collect();
    if let Some(loca) = font.table(b"loca") {
        let at = tables
            .iter()
            .position(|(tag, _)| *tag == b"glyf")
            .map_or(tables.len(), |glyf| glyf + 1);
        tables.insert(at, (b"loca", loca));
    }
    tables
}

/// Variable-length big-endian base-128 with no leading zero groups
pub(crate) fn write_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = 1;
    let mut rest = value >> 7;
    while rest != 0 {
        groups += 1;
        rest >>= 7;
    }
    for i in (0..groups).rev() {
        let mut byte = ((value >> (7 * i)) & 0x7F) as u8;
        if i != 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }
}

fn brotli_compress(data: &[u8], quality: u32, window: u32) -> Result<Vec<u8>, FontError> {
    let mut compressed = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(&mut compressed, 4096, quality, window);
        writer.write_all(data)?;
        writer.flush()?;
    }
    Ok(compressed)
}
