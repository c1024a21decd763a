//! sfnt container reading and writing
//!
//! Works at table granularity only. Glyph-level access goes through
//! `ttf-parser`; everything that rewraps tables (WOFF, WOFF2, EOT) or
//! rebuilds a font (CFF to TrueType) goes through [`SfntFont`].

use std::collections::BTreeMap;

use crate::error::FontError;

pub type Tag = [u8; 4];

pub const TRUETYPE_FLAVOR: u32 = 0x0001_0000;
pub const APPLE_TRUE_FLAVOR: u32 = 0x7472_7565; // 'true'
pub const CFF_FLAVOR: u32 = 0x4F54_544F; // 'OTTO'
const COLLECTION_TAG: u32 = 0x7474_6366; // 'ttcf'
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// Offset of `checkSumAdjustment` inside `head`
const HEAD_ADJUSTMENT_OFFSET: usize = 8;

/// An sfnt font split into its tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfntFont {
    flavor: u32,
    tables: BTreeMap<Tag, Vec<u8>>,
}

impl SfntFont {
    pub fn new(flavor: u32) -> Self {
        Self {
            flavor,
            tables: BTreeMap::new(),
        }
    }

    /// Parse the offset table and table directory, copying every table out
    pub fn parse(data: &[u8]) -> Result<Self, FontError> {
        let flavor = read_u32(data, 0)?;
        match flavor {
            TRUETYPE_FLAVOR | APPLE_TRUE_FLAVOR | CFF_FLAVOR => {}
            COLLECTION_TAG => {
                return Err(FontError::Unsupported(
                    "font collections are not supported".into(),
                ))
            }
            other => {
                return Err(FontError::Malformed(format!(
                    "unknown sfnt version 0x{:08X}",
                    other
                )))
            }
        }

        let num_tables = read_u16(data, 4)? as usize;
        if num_tables == 0 {
            return Err(FontError::Malformed("font has no tables".into()));
        }

        let mut tables = BTreeMap::new();
        for i in 0..num_tables {
            let record = 12 + i * 16;
            let tag = read_tag(data, record)?;
            let offset = read_u32(data, record + 8)? as usize;
            let length = read_u32(data, record + 12)? as usize;
            let bytes = offset
                .checked_add(length)
                .and_then(|end| data.get(offset..end))
                .ok_or_else(|| {
                    FontError::Malformed(format!(
                        "table '{}' extends past end of font",
                        tag_name(&tag)
                    ))
                })?;
            tables.insert(tag, bytes.to_vec());
        }

        Ok(Self { flavor, tables })
    }

    pub fn flavor(&self) -> u32 {
        self.flavor
    }

    pub fn set_flavor(&mut self, flavor: u32) {
        self.flavor = flavor;
    }

    /// True if outlines are stored as CFF/CFF2 charstrings
    pub fn is_cff(&self) -> bool {
        self.tables.contains_key(b"CFF ") || self.tables.contains_key(b"CFF2")
    }

    pub fn table(&self, tag: &Tag) -> Option<&[u8]> {
        self.tables.get(tag).map(Vec::as_slice)
    }

    pub fn require(&self, tag: &Tag) -> Result<&[u8], FontError> {
        self.table(tag)
            .ok_or_else(|| FontError::MissingTable(tag_name(tag)))
    }

    pub fn insert(&mut self, tag: Tag, data: Vec<u8>) {
        self.tables.insert(tag, data);
    }

    pub fn remove(&mut self, tag: &Tag) -> Option<Vec<u8>> {
        self.tables.remove(tag)
    }

    /// Tables in ascending tag order
    pub fn tables(&self) -> impl Iterator<Item = (&Tag, &[u8])> {
        self.tables.iter().map(|(tag, data)| (tag, data.as_slice()))
    }

    pub fn num_tables(&self) -> u16 {
        self.tables.len() as u16
    }

    /// Size of the font once serialized as a plain sfnt
    pub fn sfnt_size(&self) -> usize {
        12 + 16 * self.tables.len() + self.tables.values().map(|t| align4(t.len())).sum::<usize>()
    }

    /// Serialize to a standalone sfnt with fresh checksums
    pub fn to_bytes(&self) -> Vec<u8> {
        let num_tables = self.num_tables();
        let (search_range, entry_selector, range_shift) = search_params(num_tables, 16);

        let mut out = Vec::with_capacity(self.sfnt_size());
        out.extend_from_slice(&self.flavor.to_be_bytes());
        out.extend_from_slice(&num_tables.to_be_bytes());
        out.extend_from_slice(&search_range.to_be_bytes());
        out.extend_from_slice(&entry_selector.to_be_bytes());
        out.extend_from_slice(&range_shift.to_be_bytes());

        let mut offset = 12 + 16 * self.tables.len();
        for (tag, data) in &self.tables {
            out.extend_from_slice(tag);
            out.extend_from_slice(&directory_checksum(tag, data).to_be_bytes());
            out.extend_from_slice(&(offset as u32).to_be_bytes());
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
            offset += align4(data.len());
        }

        let mut head_position = None;
        for (tag, data) in &self.tables {
            let start = out.len();
            out.extend_from_slice(data);
            if tag == b"head" && data.len() >= HEAD_ADJUSTMENT_OFFSET + 4 {
                let at = start + HEAD_ADJUSTMENT_OFFSET;
                out[at..at + 4].fill(0);
                head_position = Some(start);
            }
            pad4(&mut out);
        }

        if let Some(position) = head_position {
            let adjustment = CHECKSUM_MAGIC.wrapping_sub(table_checksum(&out));
            let at = position + HEAD_ADJUSTMENT_OFFSET;
            out[at..at + 4].copy_from_slice(&adjustment.to_be_bytes());
        }

        out
    }
}

/// Big-endian u32 sum over the data, zero padded to a 4-byte boundary
pub fn table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Checksum as recorded in a table directory: `head` is summed with its
/// adjustment field zeroed
pub fn directory_checksum(tag: &Tag, data: &[u8]) -> u32 {
    if tag == b"head" && data.len() >= HEAD_ADJUSTMENT_OFFSET + 4 {
        let mut head = data.to_vec();
        head[HEAD_ADJUSTMENT_OFFSET..HEAD_ADJUSTMENT_OFFSET + 4].fill(0);
        table_checksum(&head)
    } else {
        table_checksum(data)
    }
}

/// (searchRange, entrySelector, rangeShift) for a binary-searchable array
pub fn search_params(count: u16, unit: u16) -> (u16, u16, u16) {
    if count == 0 {
        return (0, 0, 0);
    }
    let entry_selector = 15 - count.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector).wrapping_mul(unit);
    let range_shift = count.wrapping_mul(unit).wrapping_sub(search_range);
    (search_range, entry_selector, range_shift)
}

pub fn align4(len: usize) -> usize {
    (len + 3) & !3
}

pub fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

pub fn tag_name(tag: &Tag) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

pub fn read_u8(data: &[u8], offset: usize) -> Result<u8, FontError> {
    data.get(offset).copied().ok_or(FontError::Truncated(offset))
}

pub fn read_u16(data: &[u8], offset: usize) -> Result<u16, FontError> {
    read_array(data, offset).map(u16::from_be_bytes)
}

pub fn read_i16(data: &[u8], offset: usize) -> Result<i16, FontError> {
    read_array(data, offset).map(i16::from_be_bytes)
}

pub fn read_u32(data: &[u8], offset: usize) -> Result<u32, FontError> {
    read_array(data, offset).map(u32::from_be_bytes)
}

pub fn read_tag(data: &[u8], offset: usize) -> Result<Tag, FontError> {
    read_array(data, offset)
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], FontError> {
    offset
        .checked_add(N)
        .and_then(|end| data.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(FontError::Truncated(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_parse_roundtrips_tables() {
        let bytes = testing::truetype_font();
        let font = SfntFont::parse(&bytes).unwrap();
        assert_eq!(font.flavor(), TRUETYPE_FLAVOR);
        assert!(font.table(b"glyf").is_some());
        assert!(!font.is_cff());

        let reparsed = SfntFont::parse(&font.to_bytes()).unwrap();
        assert_eq!(reparsed, font);
    }

    #[test]
    fn test_whole_font_checksum_matches_magic() {
        let bytes = testing::truetype_font();
        assert_eq!(table_checksum(&bytes), CHECKSUM_MAGIC);
    }

    #[test]
    fn test_directory_is_sorted_and_aligned() {
        let bytes = testing::cff_font();
        let num_tables = read_u16(&bytes, 4).unwrap() as usize;
        let mut previous: Option<Tag> = None;
        for i in 0..num_tables {
            let tag = read_tag(&bytes, 12 + i * 16).unwrap();
            let offset = read_u32(&bytes, 12 + i * 16 + 8).unwrap();
            assert_eq!(offset % 4, 0);
            if let Some(prev) = previous {
                assert!(prev < tag);
            }
            previous = Some(tag);
        }
    }

    #[test]
    fn test_rejects_collections_and_garbage() {
        let mut ttc = b"ttcf".to_vec();
        ttc.extend_from_slice(&[0; 8]);
        assert!(matches!(
            SfntFont::parse(&ttc),
            Err(FontError::Unsupported(_))
        ));
        assert!(matches!(
            SfntFont::parse(b"not a font"),
            Err(FontError::Malformed(_))
        ));
        assert!(matches!(SfntFont::parse(&[0, 1]), Err(FontError::Truncated(0))));
    }

    #[test]
    fn test_rejects_table_past_end() {
        let mut bytes = testing::truetype_font();
        // Inflate the first table's length
        bytes[12 + 12..12 + 16].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            SfntFont::parse(&bytes),
            Err(FontError::Malformed(_))
        ));
    }

    #[test]
    fn test_search_params() {
        assert_eq!(search_params(10, 16), (128, 3, 32));
        assert_eq!(search_params(1, 16), (16, 0, 0));
        assert_eq!(search_params(5, 2), (8, 2, 2));
    }

    #[test]
    fn test_checksum_pads_trailing_bytes() {
        assert_eq!(table_checksum(&[0, 0, 0, 1, 0x01]), 1 + 0x0100_0000);
    }
}
