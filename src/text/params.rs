use serde::{Deserialize, Serialize};

use super::InputValidationError;
use crate::geom::BevelProfile;

/// Geometry knobs shared by both words.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtrusionParams {
    /// Em size in model units.
    pub glyph_size: f64,
    /// Extrusion depth along Z, before word B is rotated.
    pub depth: f64,
    /// Shift of word B along +X after its quarter turn.
    pub padding_offset: f64,
    /// 0 gives sharp edges, 1 the fullest rounded bevel.
    pub fillet_fraction: f64,
}

impl Default for ExtrusionParams {
    fn default() -> Self {
        Self {
            glyph_size: 10.0,
            depth: 4.0,
            padding_offset: 2.5,
            fillet_fraction: 0.5,
        }
    }
}

impl ExtrusionParams {
    pub fn validate(&self) -> Result<(), InputValidationError> {
        let checks: [(&'static str, f64, bool, &'static str); 4] = [
            ("glyphSize", self.glyph_size, self.glyph_size > 0.0, "must be positive"),
            ("depth", self.depth, self.depth > 0.0, "must be positive"),
            (
                "padding",
                self.padding_offset,
                self.padding_offset >= 0.0,
                "must not be negative",
            ),
            (
                "fillet",
                self.fillet_fraction,
                (0.0..=1.0).contains(&self.fillet_fraction),
                "must lie in [0, 1]",
            ),
        ];
        for (name, value, ok, reason) in checks {
            if !value.is_finite() {
                return Err(InputValidationError::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite",
                });
            }
            if !ok {
                return Err(InputValidationError::InvalidParameter { name, value, reason });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn bevel_thickness(&self) -> f64 {
        self.depth * 0.12 * self.fillet_fraction
    }

    #[must_use]
    pub fn bevel_width(&self) -> f64 {
        self.glyph_size * 0.02 * self.fillet_fraction
    }

    #[must_use]
    pub fn bevel_segments(&self) -> usize {
        if self.fillet_fraction > 0.0 { 2 } else { 0 }
    }

    #[must_use]
    pub fn bevel_profile(&self) -> BevelProfile {
        BevelProfile {
            thickness: self.bevel_thickness(),
            width: self.bevel_width(),
            segments: self.bevel_segments(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_bevel_follows_fillet() {
        let params = ExtrusionParams {
            glyph_size: 10.0,
            depth: 4.0,
            padding_offset: 1.0,
            fillet_fraction: 1.0,
        };
        assert!((params.bevel_thickness() - 0.48).abs() <= 1e-12);
        assert!((params.bevel_width() - 0.2).abs() <= 1e-12);
        assert_eq!(params.bevel_segments(), 2);

        let sharp = ExtrusionParams {
            fillet_fraction: 0.0,
            ..params
        };
        assert_eq!(sharp.bevel_segments(), 0);
        assert_eq!(sharp.bevel_thickness(), 0.0);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(ExtrusionParams::default().validate().is_ok());

        let bad = [
            ExtrusionParams { glyph_size: 0.0, ..Default::default() },
            ExtrusionParams { depth: -1.0, ..Default::default() },
            ExtrusionParams { padding_offset: -0.5, ..Default::default() },
            ExtrusionParams { fillet_fraction: 1.5, ..Default::default() },
            ExtrusionParams { depth: f64::NAN, ..Default::default() },
        ];
        for params in bad {
            assert!(
                matches!(params.validate(), Err(InputValidationError::InvalidParameter { .. })),
                "{params:?}"
            );
        }
    }
}
