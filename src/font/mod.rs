//! Glyph outline providers.
//!
//! The extruder only needs a [`GlyphSource`]: something that turns a character
//! into a closed outline in em units plus an advance width. Two sources ship
//! with the crate: the built-in [`BlockFont`] and [`TtfFont`] for TrueType /
//! OpenType files.

mod block;
mod ttf;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::geom::PathCommand;

pub use block::BlockFont;
pub use ttf::TtfFont;

/// Outline of one character in em units (1.0 = one em, y up, baseline at 0).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlyphOutline {
    /// Closed contours; every contour starts with `MoveTo` and ends with `Close`.
    pub commands: Vec<PathCommand>,
    /// Natural pen advance in em units.
    pub advance: f64,
}

impl GlyphOutline {
    #[must_use]
    pub fn contour_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count()
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Read-only glyph provider shared by both word extrusions.
pub trait GlyphSource: Send + Sync {
    /// Display name used in error messages and logs.
    fn name(&self) -> &str;

    /// Outline for `ch`, or `None` if the font has no glyph for it.
    fn resolve_glyph(&self, ch: char) -> Option<GlyphOutline>;
}

impl<T: GlyphSource + ?Sized> GlyphSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn resolve_glyph(&self, ch: char) -> Option<GlyphOutline> {
        (**self).resolve_glyph(ch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FontResolutionError {
    #[error("font '{font}' has no glyph for character {ch:?}")]
    MissingGlyph { ch: char, font: String },
}

#[derive(Debug, thiserror::Error)]
pub enum FontLoadError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid font data: {0}")]
    InvalidFontData(String),
}

/// Which glyph source a request asks for.
///
/// Serialized as a plain string: `"builtin"`, `"block"` and `"Sans"` (any
/// case, or empty) select the built-in block font, anything else is a path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FontChoice {
    #[default]
    Builtin,
    File(PathBuf),
}

impl FontChoice {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        let builtin = trimmed.is_empty()
            || ["builtin", "block", "sans"]
                .iter()
                .any(|alias| trimmed.eq_ignore_ascii_case(alias));
        if builtin {
            Self::Builtin
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }
}

impl From<String> for FontChoice {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl From<FontChoice> for String {
    fn from(value: FontChoice) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FontChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str(BlockFont::NAME),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Acquire the glyph source a request names. This is the only blocking step
/// before geometry is built.
pub fn load_font(choice: &FontChoice) -> Result<Box<dyn GlyphSource>, FontLoadError> {
    match choice {
        FontChoice::Builtin => Ok(Box::new(BlockFont::new())),
        FontChoice::File(path) => Ok(Box::new(load_font_file(path)?)),
    }
}

pub fn load_font_file(path: &Path) -> Result<TtfFont, FontLoadError> {
    let data = std::fs::read(path).map_err(|source| FontLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    log::info!("loaded font '{}' ({} bytes) from {}", name, data.len(), path.display());
    TtfFont::from_bytes(name, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_choice_aliases_select_builtin() {
        for name in ["builtin", "Block", "Sans", "  sans ", ""] {
            assert_eq!(FontChoice::from_name(name), FontChoice::Builtin, "{name:?}");
        }
        assert_eq!(
            FontChoice::from_name("fonts/Inter.ttf"),
            FontChoice::File(PathBuf::from("fonts/Inter.ttf"))
        );
    }

    #[test]
    fn font_choice_round_trips_through_json() {
        let choice: FontChoice = serde_json::from_str("\"Sans\"").unwrap();
        assert_eq!(choice, FontChoice::Builtin);
        assert_eq!(serde_json::to_string(&choice).unwrap(), "\"block\"");
    }

    #[test]
    fn missing_font_file_reports_io_error() {
        let err = load_font(&FontChoice::File(PathBuf::from("/nonexistent/font.ttf")))
            .err()
            .expect("missing file must fail");
        assert!(matches!(err, FontLoadError::Io { .. }));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = TtfFont::from_bytes("junk", vec![0u8; 16]).unwrap_err();
        assert!(matches!(err, FontLoadError::InvalidFontData(_)));
    }
}
