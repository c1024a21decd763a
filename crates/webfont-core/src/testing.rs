//! Synthetic fonts for tests
//!
//! Both builders produce the same four glyphs (`.notdef`, `A`, `B`, space)
//! with identical metrics, naming and character mapping; only the outline
//! storage differs (`glyf` vs `CFF `).

use crate::canonical::{encode_simple_glyph, GlyphPoint};
use crate::sfnt::{SfntFont, CFF_FLAVOR, TRUETYPE_FLAVOR};

pub const GLYPH_COUNT: u16 = 4;
pub const FAMILY_NAME: &str = "Test Sans";
pub const STYLE_NAME: &str = "Regular";
pub const UNITS_PER_EM: u16 = 1000;

/// (character, glyph id) pairs in the cmap
pub const CHARACTER_MAP: [(char, u16); 3] = [(' ', 3), ('A', 1), ('B', 2)];

const ADVANCES: [u16; GLYPH_COUNT as usize] = [600, 600, 600, 250];

/// A TrueType-flavoured font with `glyf` outlines
pub fn truetype_font() -> Vec<u8> {
    let mut font = SfntFont::new(TRUETYPE_FLAVOR);
    insert_common_tables(&mut font, 1);

    let glyphs: Vec<Vec<Vec<GlyphPoint>>> = vec![
        vec![rect(50, 0, 550, 700)],
        vec![vec![
            GlyphPoint::on(100, 0),
            GlyphPoint::off(300, 700),
            GlyphPoint::on(500, 0),
        ]],
        vec![rect(100, 0, 500, 500)],
        vec![],
    ];

    let mut glyf = Vec::new();
    let mut loca = Vec::new();
    for contours in &glyphs {
        loca.extend_from_slice(&(glyf.len() as u32).to_be_bytes());
        glyf.extend_from_slice(&encode_simple_glyph(contours).unwrap_or_default());
        crate::sfnt::pad4(&mut glyf);
    }
    loca.extend_from_slice(&(glyf.len() as u32).to_be_bytes());

    let mut maxp = Vec::new();
    maxp.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    maxp.extend_from_slice(&GLYPH_COUNT.to_be_bytes());
    maxp.extend_from_slice(&4u16.to_be_bytes()); // maxPoints
    maxp.extend_from_slice(&1u16.to_be_bytes()); // maxContours
    maxp.extend_from_slice(&[0, 0, 0, 0, 0, 2]); // composite points/contours, maxZones
    maxp.resize(32, 0);

    font.insert(*b"glyf", glyf);
    font.insert(*b"loca", loca);
    font.insert(*b"maxp", maxp);
    font.to_bytes()
}

/// An `OTTO` font with Type 2 charstrings in a `CFF ` table
pub fn cff_font() -> Vec<u8> {
    let mut font = SfntFont::new(CFF_FLAVOR);
    insert_common_tables(&mut font, 0);

    let mut maxp = Vec::new();
    maxp.extend_from_slice(&0x0000_5000u32.to_be_bytes());
    maxp.extend_from_slice(&GLYPH_COUNT.to_be_bytes());

    font.insert(*b"CFF ", cff_table());
    font.insert(*b"maxp", maxp);
    font.to_bytes()
}

fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<GlyphPoint> {
    vec![
        GlyphPoint::on(x0, y0),
        GlyphPoint::on(x0, y1),
        GlyphPoint::on(x1, y1),
        GlyphPoint::on(x1, y0),
    ]
}

fn insert_common_tables(font: &mut SfntFont, index_to_loc_format: i16) {
    font.insert(*b"head", head_table(index_to_loc_format));
    font.insert(*b"hhea", hhea_table());
    font.insert(*b"hmtx", hmtx_table());
    font.insert(*b"cmap", cmap_table());
    font.insert(*b"name", name_table());
    font.insert(*b"OS/2", os2_table());
    font.insert(*b"post", post_table());
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

fn head_table(index_to_loc_format: i16) -> Vec<u8> {
    let mut head = vec![0u8; 54];
    put_u32(&mut head, 0, 0x0001_0000);
    put_u32(&mut head, 4, 0x0001_0000);
    put_u32(&mut head, 12, 0x5F0F_3CF5);
    put_u16(&mut head, 16, 0x0003);
    put_u16(&mut head, 18, UNITS_PER_EM);
    put_u16(&mut head, 36, 50); // xMin
    put_u16(&mut head, 40, 550); // xMax
    put_u16(&mut head, 42, 700); // yMax
    put_u16(&mut head, 46, 8); // lowestRecPPEM
    put_u16(&mut head, 48, 2); // fontDirectionHint
    put_u16(&mut head, 50, index_to_loc_format as u16);
    head
}

fn hhea_table() -> Vec<u8> {
    let mut hhea = vec![0u8; 36];
    put_u32(&mut hhea, 0, 0x0001_0000);
    put_u16(&mut hhea, 4, 800); // ascender
    put_u16(&mut hhea, 6, (-200i16) as u16); // descender
    put_u16(&mut hhea, 10, 600); // advanceWidthMax
    put_u16(&mut hhea, 16, 550); // xMaxExtent
    put_u16(&mut hhea, 18, 1); // caretSlopeRise
    put_u16(&mut hhea, 34, GLYPH_COUNT);
    hhea
}

fn hmtx_table() -> Vec<u8> {
    ADVANCES
        .iter()
        .flat_map(|advance| {
            let mut metric = advance.to_be_bytes().to_vec();
            metric.extend_from_slice(&0i16.to_be_bytes());
            metric
        })
        .collect()
}

/// cmap with a single Windows Unicode BMP (format 4) subtable
fn cmap_table() -> Vec<u8> {
    let mut segments: Vec<(u16, u16)> = CHARACTER_MAP
        .iter()
        .map(|&(c, glyph)| (c as u16, glyph))
        .collect();
    segments.sort();

    let seg_count = segments.len() as u16 + 1;
    let (search_range, entry_selector, range_shift) = crate::sfnt::search_params(seg_count, 2);

    let mut sub = Vec::new();
    sub.extend_from_slice(&4u16.to_be_bytes());
    sub.extend_from_slice(&(16 + 8 * seg_count).to_be_bytes());
    sub.extend_from_slice(&0u16.to_be_bytes()); // language
    sub.extend_from_slice(&(seg_count * 2).to_be_bytes());
    sub.extend_from_slice(&search_range.to_be_bytes());
    sub.extend_from_slice(&entry_selector.to_be_bytes());
    sub.extend_from_slice(&range_shift.to_be_bytes());
    for &(code, _) in &segments {
        sub.extend_from_slice(&code.to_be_bytes());
    }
    sub.extend_from_slice(&0xFFFFu16.to_be_bytes());
    sub.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    for &(code, _) in &segments {
        sub.extend_from_slice(&code.to_be_bytes());
    }
    sub.extend_from_slice(&0xFFFFu16.to_be_bytes());
    for &(code, glyph) in &segments {
        sub.extend_from_slice(&glyph.wrapping_sub(code).to_be_bytes());
    }
    sub.extend_from_slice(&1u16.to_be_bytes());
    for _ in 0..seg_count {
        sub.extend_from_slice(&0u16.to_be_bytes());
    }

    let mut cmap = Vec::new();
    cmap.extend_from_slice(&0u16.to_be_bytes());
    cmap.extend_from_slice(&1u16.to_be_bytes());
    cmap.extend_from_slice(&3u16.to_be_bytes());
    cmap.extend_from_slice(&1u16.to_be_bytes());
    cmap.extend_from_slice(&12u32.to_be_bytes());
    cmap.extend_from_slice(&sub);
    cmap
}

fn name_table() -> Vec<u8> {
    let full_name = format!("{} {}", FAMILY_NAME, STYLE_NAME);
    let records: [(u16, &str); 5] = [
        (1, FAMILY_NAME),
        (2, STYLE_NAME),
        (4, &full_name),
        (5, "Version 1.000"),
        (6, "TestSans-Regular"),
    ];

    let mut strings = Vec::new();
    let mut name = Vec::new();
    name.extend_from_slice(&0u16.to_be_bytes());
    name.extend_from_slice(&(records.len() as u16).to_be_bytes());
    name.extend_from_slice(&(6 + 12 * records.len() as u16).to_be_bytes());
    for (name_id, value) in records {
        let encoded: Vec<u8> = value.encode_utf16().flat_map(u16::to_be_bytes).collect();
        for field in [3u16, 1, 0x0409, name_id, encoded.len() as u16, strings.len() as u16] {
            name.extend_from_slice(&field.to_be_bytes());
        }
        strings.extend_from_slice(&encoded);
    }
    name.extend_from_slice(&strings);
    name
}

fn os2_table() -> Vec<u8> {
    let mut os2 = vec![0u8; 96];
    put_u16(&mut os2, 0, 4); // version
    put_u16(&mut os2, 2, 500); // xAvgCharWidth
    put_u16(&mut os2, 4, 400); // usWeightClass
    put_u16(&mut os2, 6, 5); // usWidthClass
    os2[32..42].copy_from_slice(&[2, 11, 5, 3, 2, 2, 4, 2, 2, 4]);
    put_u32(&mut os2, 42, 0x0000_0001); // Basic Latin
    os2[58..62].copy_from_slice(b"TEST");
    put_u16(&mut os2, 62, 0x0040); // fsSelection: REGULAR
    put_u16(&mut os2, 64, 0x20);
    put_u16(&mut os2, 66, 0x42);
    put_u16(&mut os2, 68, 800);
    put_u16(&mut os2, 70, (-200i16) as u16);
    put_u16(&mut os2, 74, 800);
    put_u16(&mut os2, 76, 200);
    put_u32(&mut os2, 78, 0x0000_0001); // Latin 1
    os2
}

fn post_table() -> Vec<u8> {
    let mut post = vec![0u8; 32];
    put_u32(&mut post, 0, 0x0003_0000);
    put_u16(&mut post, 8, (-100i16) as u16);
    put_u16(&mut post, 10, 50);
    post
}

/// Bare CFF with a Top DICT, a one-entry Private DICT and four charstrings
fn cff_table() -> Vec<u8> {
    const RMOVETO: u8 = 21;
    const RLINETO: u8 = 5;
    const RRCURVETO: u8 = 8;
    const ENDCHAR: u8 = 14;

    let charstrings: Vec<Vec<u8>> = vec![
        Charstring::new()
            .op(&[50, 0], RMOVETO)
            .op(&[500, 0], RLINETO)
            .op(&[0, 700], RLINETO)
            .op(&[-500, 0], RLINETO)
            .op(&[], ENDCHAR)
            .finish(),
        Charstring::new()
            .op(&[100, 0], RMOVETO)
            .op(&[400, 0], RLINETO)
            .op(&[0, 200, -100, 300, -100, 0], RRCURVETO)
            .op(&[-200, 0], RLINETO)
            .op(&[], ENDCHAR)
            .finish(),
        Charstring::new()
            .op(&[100, 0], RMOVETO)
            .op(&[400, 0], RLINETO)
            .op(&[0, 500], RLINETO)
            .op(&[-400, 0], RLINETO)
            .op(&[], ENDCHAR)
            .finish(),
        Charstring::new().op(&[], ENDCHAR).finish(),
    ];

    // defaultWidthX 0
    let private_dict = vec![139, 20];

    let header = [1u8, 0, 4, 4];
    let name_index = cff_index(&[b"TestSans-Regular".to_vec()]);
    let string_index = cff_index(&[]);
    let global_subrs = cff_index(&[]);
    let charstrings_index = cff_index(&charstrings);

    // Top DICT entries use fixed-width operands so its size is known up front
    let top_dict_len = 6 + 11;
    let top_index_len = 2 + 1 + 2 + top_dict_len;
    let charstrings_offset =
        header.len() + name_index.len() + top_index_len + string_index.len() + global_subrs.len();
    let private_offset = charstrings_offset + charstrings_index.len();

    let mut top_dict = Vec::with_capacity(top_dict_len);
    top_dict.push(29);
    top_dict.extend_from_slice(&(charstrings_offset as i32).to_be_bytes());
    top_dict.push(17);
    top_dict.push(29);
    top_dict.extend_from_slice(&(private_dict.len() as i32).to_be_bytes());
    top_dict.push(29);
    top_dict.extend_from_slice(&(private_offset as i32).to_be_bytes());
    top_dict.push(18);
    let top_index = cff_index(&[top_dict]);

    let mut cff = header.to_vec();
    cff.extend_from_slice(&name_index);
    cff.extend_from_slice(&top_index);
    cff.extend_from_slice(&string_index);
    cff.extend_from_slice(&global_subrs);
    cff.extend_from_slice(&charstrings_index);
    cff.extend_from_slice(&private_dict);
    cff
}

/// Type 2 charstring assembler
struct Charstring(Vec<u8>);

impl Charstring {
    fn new() -> Self {
        Self(Vec::new())
    }

    fn op(mut self, operands: &[i32], operator: u8) -> Self {
        for &value in operands {
            self.0.extend_from_slice(&charstring_number(value));
        }
        self.0.push(operator);
        self
    }

    fn finish(self) -> Vec<u8> {
        self.0
    }
}

fn charstring_number(value: i32) -> Vec<u8> {
    match value {
        -107..=107 => vec![(value + 139) as u8],
        108..=1131 => {
            let v = value - 108;
            vec![((v >> 8) + 247) as u8, (v & 0xFF) as u8]
        }
        -1131..=-108 => {
            let v = -value - 108;
            vec![((v >> 8) + 251) as u8, (v & 0xFF) as u8]
        }
        _ => {
            let mut out = vec![28];
            out.extend_from_slice(&(value as i16).to_be_bytes());
            out
        }
    }
}

fn cff_index(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = (items.len() as u16).to_be_bytes().to_vec();
    if items.is_empty() {
        return out;
    }

    let data_len: usize = items.iter().map(Vec::len).sum();
    let off_size: u8 = match data_len + 1 {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    };
    out.push(off_size);

    let mut offset = 1usize;
    let write_offset = |out: &mut Vec<u8>, offset: usize| {
        let bytes = (offset as u32).to_be_bytes();
        out.extend_from_slice(&bytes[4 - off_size as usize..]);
    };
    write_offset(&mut out, offset);
    for item in items {
        offset += item.len();
        write_offset(&mut out, offset);
    }
    for item in items {
        out.extend_from_slice(item);
    }
    out
}
