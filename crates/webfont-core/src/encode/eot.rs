//! Embedded OpenType (version 0x00020001, uncompressed)

use ttf_parser::name::Name;
use ttf_parser::{name_id, Face, PlatformId};

use super::{EncodeInput, FormatEncoder};
use crate::error::FontError;
use crate::sfnt::{read_u16, read_u32, SfntFont};

const EOT_VERSION: u32 = 0x0002_0001;
const EOT_MAGIC: u16 = 0x504C;
const DEFAULT_CHARSET: u8 = 1;

const LANGUAGE_EN_US: u16 = 0x0409;

#[derive(Debug, Default, Clone, Copy)]
pub struct EotEncoder;

impl FormatEncoder for EotEncoder {
    fn name(&self) -> &'static str {
        "eot-v2.1"
    }

    fn encode(&self, input: &EncodeInput<'_>) -> Result<Vec<u8>, FontError> {
        encode_eot(input.truetype)
    }
}

/// Fields copied from OS/2 into the EOT header
struct Os2Fields {
    panose: [u8; 10],
    italic: bool,
    weight: u16,
    fs_type: u16,
    unicode_ranges: [u32; 4],
    code_page_ranges: [u32; 2],
}

impl Os2Fields {
    fn read(os2: &[u8]) -> Result<Self, FontError> {
        let version = read_u16(os2, 0)?;
        let panose = os2
            .get(32..42)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(FontError::Truncated(32))?;
        let code_page_ranges = if version >= 1 {
            [read_u32(os2, 78)?, read_u32(os2, 82)?]
        } else {
            [0, 0]
        };

        Ok(Self {
            panose,
            italic: read_u16(os2, 62)? & 0x01 != 0,
            weight: read_u16(os2, 4)?,
            fs_type: read_u16(os2, 8)?,
            unicode_ranges: [
                read_u32(os2, 42)?,
                read_u32(os2, 46)?,
                read_u32(os2, 50)?,
                read_u32(os2, 54)?,
            ],
            code_page_ranges,
        })
    }
}

/// Wrap a TrueType font in an EOT header
pub fn encode_eot(sfnt: &[u8]) -> Result<Vec<u8>, FontError> {
    let font = SfntFont::parse(sfnt)?;
    let os2 = Os2Fields::read(font.require(b"OS/2")?)?;
    let checksum_adjustment = read_u32(font.require(b"head")?, 8)?;
    font.require(b"name")?;
    let face = Face::parse(sfnt, 0).map_err(|e| FontError::Malformed(e.to_string()))?;

    let family = name_utf16le(&face, name_id::FAMILY);
    let style = name_utf16le(&face, name_id::SUBFAMILY);
    let version = name_utf16le(&face, name_id::VERSION);
    let full = name_utf16le(&face, name_id::FULL_NAME);

    let mut out = Vec::with_capacity(sfnt.len() + 256);
    out.extend_from_slice(&0u32.to_le_bytes()); // EOTSize, patched below
    out.extend_from_slice(&(sfnt.len() as u32).to_le_bytes());
    out.extend_from_slice(&EOT_VERSION.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // Flags
    out.extend_from_slice(&os2.panose);
    out.push(DEFAULT_CHARSET);
    out.push(u8::from(os2.italic));
    out.extend_from_slice(&u32::from(os2.weight).to_le_bytes());
    out.extend_from_slice(&os2.fs_type.to_le_bytes());
    out.extend_from_slice(&EOT_MAGIC.to_le_bytes());
    for range in os2.unicode_ranges {
        out.extend_from_slice(&range.to_le_bytes());
    }
    for range in os2.code_page_ranges {
        out.extend_from_slice(&range.to_le_bytes());
    }
    out.extend_from_slice(&checksum_adjustment.to_le_bytes());
    out.extend_from_slice(&[0u8; 16]); // Reserved1..4
    out.extend_from_slice(&0u16.to_le_bytes()); // Padding1

    for (i, name) in [&family, &style, &version, &full].into_iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(name);
    }
    out.extend_from_slice(&0u16.to_le_bytes()); // Padding5
    out.extend_from_slice(&0u16.to_le_bytes()); // RootStringSize

    out.extend_from_slice(sfnt);
    let total = out.len() as u32;
    out[0..4].copy_from_slice(&total.to_le_bytes());
    Ok(out)
}

/// Look up a name record and return it as UTF-16LE.
///
/// Prefers Windows Unicode English, then any Windows Unicode record, then
/// the Unicode platform, then Mac Roman (treated as Latin-1). A missing
/// record yields an empty string.
fn name_utf16le(face: &Face<'_>, name_id: u16) -> Vec<u8> {
    let best = face
        .names()
        .into_iter()
        .filter(|name| name.name_id == name_id)
        .filter_map(|name| name_rank(&name).map(|rank| (rank, name)))
        .min_by_key(|(rank, _)| *rank);

    let Some((_, name)) = best else {
        return Vec::new();
    };

    if name.platform_id == PlatformId::Macintosh {
        name.name.iter().flat_map(|&b| u16::from(b).to_le_bytes()).collect()
    } else {
        name.name.chunks_exact(2).flat_map(|pair| [pair[1], pair[0]]).collect()
    }
}

fn name_rank(name: &Name<'_>) -> Option<u8> {
    match (name.platform_id, name.encoding_id, name.language_id) {
        (PlatformId::Windows, 1 | 10, LANGUAGE_EN_US) => Some(0),
        (PlatformId::Windows, 0 | 1 | 10, _) => Some(1),
        (PlatformId::Unicode, _, _) => Some(2),
        (PlatformId::Macintosh, 0, _) => Some(3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn le_u16(data: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([data[offset], data[offset + 1]])
    }

    fn le_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
    }

    fn utf16le(value: &str) -> Vec<u8> {
        value.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn test_header_layout() {
        let font = testing::truetype_font();
        let eot = encode_eot(&font).unwrap();

        assert_eq!(le_u32(&eot, 0) as usize, eot.len());
        assert_eq!(le_u32(&eot, 4) as usize, font.len());
        assert_eq!(le_u32(&eot, 8), EOT_VERSION);
        assert_eq!(eot[26], DEFAULT_CHARSET);
        assert_eq!(eot[27], 0);
        assert_eq!(le_u32(&eot, 28), 400);
        assert_eq!(le_u16(&eot, 34), EOT_MAGIC);
        assert_eq!(le_u32(&eot, 36), 1); // ulUnicodeRange1
        assert_eq!(le_u32(&eot, 52), 1); // ulCodePageRange1
        assert!(eot.ends_with(&font));
    }

    #[test]
    fn test_names_are_utf16le() {
        let font = testing::truetype_font();
        let eot = encode_eot(&font).unwrap();

        // FamilyNameSize follows Padding1 at offset 80
        let family_len = le_u16(&eot, 82) as usize;
        assert_eq!(&eot[84..84 + family_len], utf16le(testing::FAMILY_NAME).as_slice());

        let style_at = 84 + family_len + 2;
        let style_len = le_u16(&eot, style_at) as usize;
        assert_eq!(
            &eot[style_at + 2..style_at + 2 + style_len],
            utf16le(testing::STYLE_NAME).as_slice()
        );
    }

    fn name_table(records: &[(u16, u16, u16, u16, Vec<u8>)]) -> Vec<u8> {
        let mut table = Vec::new();
        let mut strings = Vec::new();
        table.extend_from_slice(&0u16.to_be_bytes());
        table.extend_from_slice(&(records.len() as u16).to_be_bytes());
        table.extend_from_slice(&(6 + 12 * records.len() as u16).to_be_bytes());
        for (platform, encoding, language, name_id, value) in records {
            let fields = [
                *platform,
                *encoding,
                *language,
                *name_id,
                value.len() as u16,
                strings.len() as u16,
            ];
            for field in fields {
                table.extend_from_slice(&field.to_be_bytes());
            }
            strings.extend_from_slice(value);
        }
        table.extend_from_slice(&strings);
        table
    }

    fn family_name(eot: &[u8]) -> &[u8] {
        let len = le_u16(eot, 82) as usize;
        &eot[84..84 + len]
    }

    fn utf16be(value: &str) -> Vec<u8> {
        value.encode_utf16().flat_map(u16::to_be_bytes).collect()
    }

    #[test]
    fn test_windows_english_name_wins() {
        let mut font = SfntFont::parse(&testing::truetype_font()).unwrap();
        font.insert(
            *b"name",
            name_table(&[
                (1, 0, 0, 1, b"Mac Family".to_vec()),
                (3, 1, 0x0407, 1, utf16be("Deutsche Familie")),
                (3, 1, 0x0409, 1, utf16be("Windows Family")),
            ]),
        );
        let eot = encode_eot(&font.to_bytes()).unwrap();
        assert_eq!(family_name(&eot), utf16le("Windows Family").as_slice());
    }

    #[test]
    fn test_mac_roman_name_is_widened() {
        let mut font = SfntFont::parse(&testing::truetype_font()).unwrap();
        font.insert(*b"name", name_table(&[(1, 0, 0, 1, b"Mac Family".to_vec())]));
        let eot = encode_eot(&font.to_bytes()).unwrap();

        assert_eq!(family_name(&eot), utf16le("Mac Family").as_slice());
        // Subfamily has no record at all
        let style_at = 84 + family_name(&eot).len() + 2;
        assert_eq!(le_u16(&eot, style_at), 0);
    }

    #[test]
    fn test_requires_os2() {
        let mut font = SfntFont::parse(&testing::truetype_font()).unwrap();
        font.remove(b"OS/2");
        assert!(matches!(
            encode_eot(&font.to_bytes()),
            Err(FontError::MissingTable(tag)) if tag == "OS/2"
        ));
    }
}
