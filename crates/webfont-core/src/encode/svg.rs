//! SVG 1.1 font generation

use std::collections::BTreeMap;

use ttf_parser::{Face, GlyphId, OutlineBuilder};

use super::{EncodeInput, FormatEncoder};
use crate::error::FontError;
use crate::naming::FontNames;

#[derive(Debug, Default, Clone, Copy)]
pub struct SvgEncoder;

impl FormatEncoder for SvgEncoder {
    fn name(&self) -> &'static str {
        "svg-font"
    }

    fn encode(&self, input: &EncodeInput<'_>) -> Result<Vec<u8>, FontError> {
        encode_svg(input.truetype, input.names)
    }
}

/// Render every Unicode-mapped glyph as an SVG `<glyph>`.
///
/// The `<font>` id is the base name, matching the `#fragment` the
/// stylesheet uses.
pub fn encode_svg(sfnt: &[u8], names: &FontNames) -> Result<Vec<u8>, FontError> {
    let face = Face::parse(sfnt, 0).map_err(|e| FontError::Malformed(e.to_string()))?;

    let mut mapping: BTreeMap<u32, GlyphId> = BTreeMap::new();
    if let Some(cmap) = face.tables().cmap {
        for subtable in cmap.subtables {
            if !subtable.is_unicode() {
                continue;
            }
            subtable.codepoints(|code_point| {
                if let Some(glyph) = subtable.glyph_index(code_point) {
                    if glyph.0 != 0 && is_xml_char(code_point) {
                        mapping.entry(code_point).or_insert(glyph);
                    }
                }
            });
        }
    }
    if mapping.is_empty() {
        return Err(FontError::Unsupported(
            "font has no Unicode character mappings".into(),
        ));
    }

    let units_per_em = face.units_per_em();
    let default_advance = face
        .glyph_hor_advance(GlyphId(0))
        .unwrap_or(units_per_em / 2);

    let mut lines = vec![
        r#"<?xml version="1.0" standalone="no"?>"#.to_string(),
        r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#
            .to_string(),
        r#"<svg xmlns="http://www.w3.org/2000/svg">"#.to_string(),
        "<defs>".to_string(),
        format!(
            r#"<font id="{}" horiz-adv-x="{}">"#,
            escape_xml(&names.base_name),
            default_advance
        ),
        format!(
            r#"<font-face font-family="{}" units-per-em="{}" ascent="{}" descent="{}"/>"#,
            escape_xml(&names.display_name),
            units_per_em,
            face.ascender(),
            face.descender()
        ),
        format!(
            r#"<missing-glyph horiz-adv-x="{}"{}/>"#,
            default_advance,
            path_attribute(&face, GlyphId(0))
        ),
    ];

    for (code_point, glyph) in &mapping {
        let glyph_name = face
            .glyph_name(*glyph)
            .map(|name| format!(r#" glyph-name="{}""#, escape_xml(name)))
            .unwrap_or_default();
        let advance = face.glyph_hor_advance(*glyph).unwrap_or(default_advance);
        lines.push(format!(
            r#"<glyph{} unicode="&#x{:x};" horiz-adv-x="{}"{}/>"#,
            glyph_name,
            code_point,
            advance,
            path_attribute(&face, *glyph)
        ));
    }

    lines.extend(["</font>", "</defs>", "</svg>", ""].map(String::from));
    Ok(lines.join("\n").into_bytes())
}

/// ` d="..."` for glyphs with an outline, empty otherwise
fn path_attribute(face: &Face<'_>, glyph: GlyphId) -> String {
    let mut path = SvgPath::default();
    if face.outline_glyph(glyph, &mut path).is_some() && !path.0.is_empty() {
        format!(r#" d="{}""#, path.0)
    } else {
        String::new()
    }
}

/// SVG path data in font units (SVG fonts share the font's y-up space)
#[derive(Default)]
struct SvgPath(String);

impl OutlineBuilder for SvgPath {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.push_str(&format!("M{} {}", x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.push_str(&format!("L{} {}", x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.push_str(&format!("Q{} {} {} {}", x1, y1, x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0
            .push_str(&format!("C{} {} {} {} {} {}", x1, y1, x2, y2, x, y));
    }

    fn close(&mut self) {
        self.0.push('Z');
    }
}

/// Code points representable in an XML 1.0 character reference
fn is_xml_char(code_point: u32) -> bool {
    matches!(code_point, 0x9 | 0xA | 0xD | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x1_0000..=0x10_FFFF)
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn render() -> String {
        let names = FontNames::from_filename("Test-Sans.ttf");
        String::from_utf8(encode_svg(&testing::truetype_font(), &names).unwrap()).unwrap()
    }

    #[test]
    fn test_one_glyph_per_mapped_character() {
        let svg = render();
        assert_eq!(svg.matches("<glyph").count(), testing::CHARACTER_MAP.len());
        assert!(svg.contains(r#"unicode="&#x41;" horiz-adv-x="600" d="M100 0Q300 700 500 0"#));
        assert!(svg.contains(r#"unicode="&#x20;" horiz-adv-x="250"/>"#));
    }

    #[test]
    fn test_font_face_metrics() {
        let svg = render();
        assert!(svg.contains(r#"<font id="Test-Sans" horiz-adv-x="600">"#));
        assert!(svg.contains(
            r#"<font-face font-family="Test Sans" units-per-em="1000" ascent="800" descent="-200"/>"#
        ));
        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_one_element_per_line() {
        let svg = render();
        let glyph_lines = svg.lines().filter(|line| line.starts_with("<glyph")).count();
        assert_eq!(glyph_lines, testing::CHARACTER_MAP.len());
        assert!(svg.lines().any(|line| line.starts_with("<missing-glyph") && line.ends_with("/>")));
        assert!(svg.ends_with("</font>\n</defs>\n</svg>\n"));
    }

    #[test]
    fn test_escapes_attribute_values() {
        assert_eq!(escape_xml(r#"A&B <"x">"#), "A&amp;B &lt;&quot;x&quot;&gt;");
    }

    #[test]
    fn test_xml_char_filter() {
        assert!(!is_xml_char(0x0));
        assert!(!is_xml_char(0xFFFF));
        assert!(!is_xml_char(0xD800));
        assert!(is_xml_char(0x41));
        assert!(is_xml_char(0x1F600));
    }
}
