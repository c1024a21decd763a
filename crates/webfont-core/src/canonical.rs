//! TrueType normalization
//!
//! Every derived format is produced from a TrueType (`glyf`) font. Fonts that
//! already carry `glyf` outlines are validated and re-serialized; CFF fonts
//! have their cubic outlines approximated by quadratics and re-encoded.

use kurbo::{CubicBez, Point};
use tracing::debug;
use ttf_parser::{Face, GlyphId, OutlineBuilder};

use crate::error::FontError;
use crate::sfnt::{SfntFont, TRUETYPE_FLAVOR};

/// Maximum distance, in font units, between a cubic and its quadratic approximation
const CUBIC_TOLERANCE: f64 = 1.0;

const HEAD_INDEX_TO_LOC_FORMAT: usize = 50;
const MIN_HEAD_LEN: usize = 54;

const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

/// Convert font bytes into a TrueType-flavoured sfnt
pub fn to_truetype(bytes: &[u8]) -> Result<Vec<u8>, FontError> {
    let font = SfntFont::parse(bytes)?;

    if font.table(b"CFF2").is_some() {
        return Err(FontError::Unsupported(
            "CFF2 variable outlines cannot be converted to TrueType".into(),
        ));
    }
    if font.table(b"CFF ").is_some() {
        return cff_to_truetype(bytes, font);
    }

    for tag in [b"head", b"maxp", b"glyf", b"loca"] {
        font.require(tag)?;
    }
    Face::parse(bytes, 0).map_err(|e| FontError::Malformed(e.to_string()))?;

    let mut font = font;
    font.set_flavor(TRUETYPE_FLAVOR);
    Ok(font.to_bytes())
}

fn cff_to_truetype(bytes: &[u8], mut font: SfntFont) -> Result<Vec<u8>, FontError> {
    let face = Face::parse(bytes, 0).map_err(|e| FontError::Malformed(e.to_string()))?;
    if face.tables().cff.is_none() {
        return Err(FontError::Malformed("CFF table could not be parsed".into()));
    }

    let num_glyphs = face.number_of_glyphs();
    let mut glyf = Vec::new();
    let mut loca = Vec::with_capacity((num_glyphs as usize + 1) * 4);
    let mut max_points = 0u16;
    let mut max_contours = 0u16;

    for id in 0..num_glyphs {
        loca.extend_from_slice(&(glyf.len() as u32).to_be_bytes());

        let mut pen = QuadraticPen::new();
        face.outline_glyph(GlyphId(id), &mut pen);
        let contours = pen.finish();
        if contours.is_empty() {
            continue;
        }

        let points: usize = contours.iter().map(Vec::len).sum();
        max_points = max_points.max(u16::try_from(points).unwrap_or(u16::MAX));
        max_contours = max_contours.max(u16::try_from(contours.len()).unwrap_or(u16::MAX));

        glyf.extend_from_slice(&encode_simple_glyph(&contours)?);
        crate::sfnt::pad4(&mut glyf);
    }
    loca.extend_from_slice(&(glyf.len() as u32).to_be_bytes());

    debug!(
        glyphs = num_glyphs,
        glyf_bytes = glyf.len(),
        "Converted CFF outlines to TrueType"
    );

    let mut head = font.require(b"head")?.to_vec();
    if head.len() < MIN_HEAD_LEN {
        return Err(FontError::Malformed("head table too short".into()));
    }
    head[HEAD_INDEX_TO_LOC_FORMAT..HEAD_INDEX_TO_LOC_FORMAT + 2]
        .copy_from_slice(&1i16.to_be_bytes());

    font.remove(b"CFF ");
    font.remove(b"VORG");
    font.insert(*b"glyf", glyf);
    font.insert(*b"loca", loca);
    font.insert(*b"head", head);
    font.insert(*b"maxp", truetype_maxp(num_glyphs, max_points, max_contours));
    font.set_flavor(TRUETYPE_FLAVOR);

    let out = font.to_bytes();
    Face::parse(&out, 0).map_err(|e| {
        FontError::Malformed(format!("converted font failed to parse: {}", e))
    })?;
    Ok(out)
}

/// maxp version 1.0 for a font without hinting or composite glyphs
fn truetype_maxp(num_glyphs: u16, max_points: u16, max_contours: u16) -> Vec<u8> {
    let mut maxp = Vec::with_capacity(32);
    maxp.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    for value in [
        num_glyphs,
        max_points,
        max_contours,
        0, // maxCompositePoints
        0, // maxCompositeContours
        2, // maxZones
        0, // maxTwilightPoints
        0, // maxStorage
        0, // maxFunctionDefs
        0, // maxInstructionDefs
        0, // maxStackElements
        0, // maxSizeOfInstructions
        0, // maxComponentElements
        0, // maxComponentDepth
    ] {
        maxp.extend_from_slice(&value.to_be_bytes());
    }
    maxp
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlyphPoint {
    pub x: i32,
    pub y: i32,
    pub on_curve: bool,
}

impl GlyphPoint {
    pub(crate) fn on(x: i32, y: i32) -> Self {
        Self { x, y, on_curve: true }
    }

    pub(crate) fn off(x: i32, y: i32) -> Self {
        Self { x, y, on_curve: false }
    }
}

/// Collects outlines as TrueType contours, approximating cubics with quadratics
struct QuadraticPen {
    contours: Vec<Vec<GlyphPoint>>,
    current: Vec<GlyphPoint>,
    last: Point,
}

impl QuadraticPen {
    fn new() -> Self {
        Self {
            contours: Vec::new(),
            current: Vec::new(),
            last: Point::ZERO,
        }
    }

    fn push(&mut self, x: f64, y: f64, on_curve: bool) {
        self.current.push(GlyphPoint {
            x: x.round() as i32,
            y: y.round() as i32,
            on_curve,
        });
        if on_curve {
            self.last = Point::new(x, y);
        }
    }

    fn close_contour(&mut self) {
        let mut contour = std::mem::take(&mut self.current);
        if contour.len() > 1 && contour.first() == contour.last() {
            contour.pop();
        }
        if contour.is_empty() {
            return;
        }
        // CFF winds outer contours counter-clockwise, TrueType clockwise
        contour[1..].reverse();
        self.contours.push(contour);
    }

    fn finish(mut self) -> Vec<Vec<GlyphPoint>> {
        self.close_contour();
        self.contours
    }
}

impl OutlineBuilder for QuadraticPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.close_contour();
        self.push(x as f64, y as f64, true);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(x as f64, y as f64, true);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.push(x1 as f64, y1 as f64, false);
        self.push(x as f64, y as f64, true);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let cubic = CubicBez::new(
            self.last,
            Point::new(x1 as f64, y1 as f64),
            Point::new(x2 as f64, y2 as f64),
            Point::new(x as f64, y as f64),
        );
        for (_, _, quad) in cubic.to_quads(CUBIC_TOLERANCE) {
            self.push(quad.p1.x, quad.p1.y, false);
            self.push(quad.p2.x, quad.p2.y, true);
        }
    }

    fn close(&mut self) {
        self.close_contour();
    }
}

/// Encode contours as a simple `glyf` entry without instructions
pub(crate) fn encode_simple_glyph(contours: &[Vec<GlyphPoint>]) -> Result<Vec<u8>, FontError> {
    let number_of_contours = i16::try_from(contours.len())
        .map_err(|_| FontError::Malformed("too many contours in glyph".into()))?;

    let points: Vec<GlyphPoint> = contours.iter().flatten().copied().collect();
    if points.is_empty() {
        return Ok(Vec::new());
    }
    if points.len() > u16::MAX as usize {
        return Err(FontError::Malformed("too many points in glyph".into()));
    }

    let coord = |v: i32| {
        i16::try_from(v).map_err(|_| FontError::Malformed(format!("coordinate {} out of range", v)))
    };
    let x_min = coord(points.iter().map(|p| p.x).min().unwrap_or(0))?;
    let x_max = coord(points.iter().map(|p| p.x).max().unwrap_or(0))?;
    let y_min = coord(points.iter().map(|p| p.y).min().unwrap_or(0))?;
    let y_max = coord(points.iter().map(|p| p.y).max().unwrap_or(0))?;

    let mut out = Vec::new();
    out.extend_from_slice(&number_of_contours.to_be_bytes());
    for value in [x_min, y_min, x_max, y_max] {
        out.extend_from_slice(&value.to_be_bytes());
    }

    let mut end = 0usize;
    for contour in contours {
        end += contour.len();
        out.extend_from_slice(&((end - 1) as u16).to_be_bytes());
    }
    out.extend_from_slice(&0u16.to_be_bytes()); // instructionLength

    let mut flags = Vec::with_capacity(points.len());
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let (mut prev_x, mut prev_y) = (0i32, 0i32);
    for point in &points {
        let mut flag = if point.on_curve { ON_CURVE } else { 0 };
        flag |= encode_delta(point.x - prev_x, X_SHORT, X_SAME_OR_POSITIVE, &mut xs)?;
        flag |= encode_delta(point.y - prev_y, Y_SHORT, Y_SAME_OR_POSITIVE, &mut ys)?;
        flags.push(flag);
        prev_x = point.x;
        prev_y = point.y;
    }

    out.extend_from_slice(&flags);
    out.extend_from_slice(&xs);
    out.extend_from_slice(&ys);
    Ok(out)
}

fn encode_delta(delta: i32, short: u8, same_or_positive: u8, out: &mut Vec<u8>) -> Result<u8, FontError> {
    if delta == 0 {
        return Ok(same_or_positive);
    }
    if (-255..=255).contains(&delta) {
        out.push(delta.unsigned_abs() as u8);
        return Ok(if delta > 0 { short | same_or_positive } else { short });
    }
    let delta = i16::try_from(delta)
        .map_err(|_| FontError::Malformed(format!("coordinate delta {} out of range", delta)))?;
    out.extend_from_slice(&delta.to_be_bytes());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sfnt::{read_i16, read_u16, CFF_FLAVOR};
    use crate::testing;

    struct PointCounter {
        on: usize,
        quads: usize,
        cubics: usize,
    }

    impl OutlineBuilder for PointCounter {
        fn move_to(&mut self, _: f32, _: f32) {
            self.on += 1;
        }
        fn line_to(&mut self, _: f32, _: f32) {
            self.on += 1;
        }
        fn quad_to(&mut self, _: f32, _: f32, _: f32, _: f32) {
            self.quads += 1;
        }
        fn curve_to(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {
            self.cubics += 1;
        }
        fn close(&mut self) {}
    }

    #[test]
    fn test_truetype_passes_through() {
        let source = testing::truetype_font();
        let converted = to_truetype(&source).unwrap();
        assert_eq!(
            SfntFont::parse(&converted).unwrap(),
            SfntFont::parse(&source).unwrap()
        );
    }

    #[test]
    fn test_cff_converts_to_glyf() {
        let source = testing::cff_font();
        assert_eq!(SfntFont::parse(&source).unwrap().flavor(), CFF_FLAVOR);

        let converted = to_truetype(&source).unwrap();
        let font = SfntFont::parse(&converted).unwrap();
        assert_eq!(font.flavor(), TRUETYPE_FLAVOR);
        assert!(font.table(b"CFF ").is_none());
        assert!(font.table(b"glyf").is_some());
        assert_eq!(read_i16(font.table(b"head").unwrap(), 50).unwrap(), 1);

        let maxp = font.table(b"maxp").unwrap();
        assert_eq!(maxp.len(), 32);
        assert_eq!(read_u16(maxp, 4).unwrap(), testing::GLYPH_COUNT);

        let original = Face::parse(&source, 0).unwrap();
        let face = Face::parse(&converted, 0).unwrap();
        assert_eq!(face.number_of_glyphs(), original.number_of_glyphs());
        assert_eq!(face.glyph_index('A'), original.glyph_index('A'));
    }

    #[test]
    fn test_cff_curves_become_quadratics() {
        let converted = to_truetype(&testing::cff_font()).unwrap();
        let face = Face::parse(&converted, 0).unwrap();
        let glyph = face.glyph_index('A').unwrap();

        let mut counter = PointCounter { on: 0, quads: 0, cubics: 0 };
        let bbox = face.outline_glyph(glyph, &mut counter).unwrap();
        assert_eq!(counter.cubics, 0);
        assert!(counter.quads >= 1);
        assert_eq!(bbox.x_min, 100);
        // Quadratic control points may overshoot the cubic hull by a unit
        assert!((500..=502).contains(&bbox.x_max), "x_max = {}", bbox.x_max);
    }

    #[test]
    fn test_empty_glyph_has_no_data() {
        let converted = to_truetype(&testing::cff_font()).unwrap();
        let face = Face::parse(&converted, 0).unwrap();
        let space = face.glyph_index(' ').unwrap();
        let mut counter = PointCounter { on: 0, quads: 0, cubics: 0 };
        assert!(face.outline_glyph(space, &mut counter).is_none());
    }

    #[test]
    fn test_rejects_cff2() {
        let mut font = SfntFont::parse(&testing::cff_font()).unwrap();
        font.insert(*b"CFF2", vec![2, 0, 5, 0, 0]);
        assert!(matches!(
            to_truetype(&font.to_bytes()),
            Err(FontError::Unsupported(_))
        ));
    }

    #[test]
    fn test_rejects_truetype_without_glyf() {
        let mut font = SfntFont::parse(&testing::truetype_font()).unwrap();
        font.remove(b"glyf");
        assert!(matches!(
            to_truetype(&font.to_bytes()),
            Err(FontError::MissingTable(tag)) if tag == "glyf"
        ));
    }

    #[test]
    fn test_encode_simple_glyph_layout() {
        let contour = vec![
            GlyphPoint::on(0, 0),
            GlyphPoint::on(0, 300),
            GlyphPoint::off(150, 400),
            GlyphPoint::on(1000, 0),
        ];
        let glyph = encode_simple_glyph(&[contour]).unwrap();
        assert_eq!(read_i16(&glyph, 0).unwrap(), 1);
        assert_eq!(read_i16(&glyph, 2).unwrap(), 0);
        assert_eq!(read_i16(&glyph, 6).unwrap(), 1000);
        assert_eq!(read_i16(&glyph, 8).unwrap(), 400);
        assert_eq!(read_u16(&glyph, 10).unwrap(), 3);
        assert_eq!(read_u16(&glyph, 12).unwrap(), 0);
        let flags = &glyph[14..18];
        assert_eq!(flags[0], ON_CURVE | X_SAME_OR_POSITIVE | Y_SAME_OR_POSITIVE);
        assert_eq!(flags[2], X_SHORT | X_SAME_OR_POSITIVE | Y_SHORT | Y_SAME_OR_POSITIVE);
        // dx of 850 needs a full word
        assert_eq!(flags[3] & (X_SHORT | X_SAME_OR_POSITIVE), 0);
    }

    #[test]
    fn test_encode_rejects_out_of_range_coordinates() {
        let contour = vec![GlyphPoint::on(0, 0), GlyphPoint::on(40_000, 0)];
        assert!(encode_simple_glyph(&[contour]).is_err());
    }
}
