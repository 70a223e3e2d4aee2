use ttf_parser::{Face, OutlineBuilder};

use super::{FontLoadError, GlyphOutline, GlyphSource};
use crate::geom::{PathCommand, Point2};

/// TrueType / OpenType glyph source backed by `ttf-parser`.
///
/// Owns the raw font bytes; the face table view is re-parsed per lookup,
/// which only reads the table directory.
pub struct TtfFont {
    name: String,
    data: Vec<u8>,
    units_per_em: f64,
}

impl TtfFont {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self, FontLoadError> {
        let face = Face::parse(&data, 0).map_err(|e| FontLoadError::InvalidFontData(e.to_string()))?;
        let units_per_em = f64::from(face.units_per_em());
        if units_per_em <= 0.0 {
            return Err(FontLoadError::InvalidFontData("units per em is zero".to_string()));
        }
        Ok(Self {
            name: name.into(),
            data,
            units_per_em,
        })
    }

    #[must_use]
    pub fn units_per_em(&self) -> f64 {
        self.units_per_em
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }
}

impl std::fmt::Debug for TtfFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfFont")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl GlyphSource for TtfFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve_glyph(&self, ch: char) -> Option<GlyphOutline> {
        let face = self.face()?;
        let gid = face.glyph_index(ch)?;

        let scale = 1.0 / self.units_per_em;
        let mut sink = PathSink {
            commands: Vec::new(),
            scale,
        };
        // Glyphs without an outline (space) still resolve with their advance.
        if face.outline_glyph(gid, &mut sink).is_none() {
            sink.commands.clear();
        }
        let advance = f64::from(face.glyph_hor_advance(gid).unwrap_or(0)) * scale;

        Some(GlyphOutline {
            commands: sink.commands,
            advance,
        })
    }
}

struct PathSink {
    commands: Vec<PathCommand>,
    scale: f64,
}

impl PathSink {
    fn point(&self, x: f32, y: f32) -> Point2 {
        Point2::new(f64::from(x) * self.scale, f64::from(y) * self.scale)
    }
}

impl OutlineBuilder for PathSink {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.commands.push(PathCommand::MoveTo(p));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.commands.push(PathCommand::LineTo(p));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let c = self.point(x1, y1);
        let p = self.point(x, y);
        self.commands.push(PathCommand::QuadTo(c, p));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let c0 = self.point(x1, y1);
        let c1 = self.point(x2, y2);
        let p = self.point(x, y);
        self.commands.push(PathCommand::CubicTo(c0, c1, p));
    }

    fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }
}
