#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{ExtrusionParams, WordSpec};
use crate::font::{FontResolutionError, GlyphOutline, GlyphSource};
use crate::geom::{
    CURVE_SEGMENTS, ExtrusionError, Point2, Tolerance, TriangleMesh, Vec3, extrude_shape,
    flatten_path, group_shapes,
};

#[derive(Debug, thiserror::Error)]
pub enum GlyphError {
    #[error(transparent)]
    Missing(#[from] FontResolutionError),
    #[error("glyph {ch:?} cannot be extruded: {source}")]
    Extrusion {
        ch: char,
        #[source]
        source: ExtrusionError,
    },
}

/// One resolved glyph placed at its pen position.
struct GlyphJob {
    ch: char,
    outline: GlyphOutline,
    pen_x: f64,
}

/// Extrude `word` into a closed text volume centered on the origin.
///
/// Every character is resolved before any geometry is built, so a missing
/// glyph fails the call without a partial mesh. A contour that cannot be
/// capped fails the whole word as well. Glyphs sit on one baseline
/// with their natural advances, are extruded over `[0, depth]` along +Z, and
/// the finished word is shifted so its bounding-box center is the origin.
///
/// `params` is expected to have passed [`ExtrusionParams::validate`].
pub fn extrude_word(
    word: &WordSpec,
    font: &dyn GlyphSource,
    params: &ExtrusionParams,
) -> Result<TriangleMesh, GlyphError> {
    let mut jobs = Vec::with_capacity(word.len());
    let mut pen_x = 0.0;
    for ch in word.chars() {
        let outline = font.resolve_glyph(ch).ok_or_else(|| FontResolutionError::MissingGlyph {
            ch,
            font: font.name().to_string(),
        })?;
        let advance = outline.advance * params.glyph_size;
        jobs.push(GlyphJob { ch, outline, pen_x });
        pen_x += advance;
    }

    let tol = Tolerance::default_geom().scaled(params.glyph_size);
    let glyph_meshes = build_glyph_meshes(&jobs, params, tol)?;

    let mut mesh = TriangleMesh::default();
    for glyph in &glyph_meshes {
        mesh.append(glyph);
    }
    mesh.compute_vertex_normals();

    let Some(bounds) = mesh.bounds() else {
        log::warn!("word '{}' produced no geometry with font '{}'", word, font.name());
        return Ok(mesh);
    };
    let center = bounds.center();
    let mesh = mesh.translated(Vec3::new(-center.x, -center.y, -center.z));

    log::debug!(
        "extruded '{}' with font '{}': {} glyphs, {} vertices, {} triangles",
        word,
        font.name(),
        jobs.len(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

type GlyphMeshes = Result<Vec<TriangleMesh>, GlyphError>;

#[cfg(feature = "parallel")]
fn build_glyph_meshes(jobs: &[GlyphJob], params: &ExtrusionParams, tol: Tolerance) -> GlyphMeshes {
    jobs.par_iter().map(|job| glyph_mesh(job, params, tol)).collect()
}

#[cfg(not(feature = "parallel"))]
fn build_glyph_meshes(jobs: &[GlyphJob], params: &ExtrusionParams, tol: Tolerance) -> GlyphMeshes {
    jobs.iter().map(|job| glyph_mesh(job, params, tol)).collect()
}

fn glyph_mesh(job: &GlyphJob, params: &ExtrusionParams, tol: Tolerance) -> Result<TriangleMesh, GlyphError> {
    let size = params.glyph_size;
    let loops = flatten_path(&job.outline.commands, CURVE_SEGMENTS)
        .into_iter()
        .map(|l| {
            l.into_iter()
                .map(|p| Point2::new(job.pen_x + p.x * size, p.y * size))
                .collect()
        })
        .collect();

    let bevel = params.bevel_profile();
    let shapes = group_shapes(loops, tol);
    log::trace!(
        "glyph {:?}: {} contours in {} shapes",
        job.ch,
        job.outline.contour_count(),
        shapes.len()
    );

    let mut mesh = TriangleMesh::default();
    for shape in &shapes {
        let part = extrude_shape(shape, params.depth, bevel, tol)
            .map_err(|source| GlyphError::Extrusion { ch: job.ch, source })?;
        mesh.append(&part);
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BlockFont;
    use crate::geom::{PathCommand, TriangulationError};
    use crate::text::validate_word_pair;

    struct NoDigits;

    impl GlyphSource for NoDigits {
        fn name(&self) -> &str {
            "no-digits"
        }

        fn resolve_glyph(&self, ch: char) -> Option<GlyphOutline> {
            if ch.is_ascii_digit() {
                None
            } else {
                BlockFont.resolve_glyph(ch)
            }
        }
    }

    fn sharp(glyph_size: f64, depth: f64) -> ExtrusionParams {
        ExtrusionParams {
            glyph_size,
            depth,
            padding_offset: 0.0,
            fillet_fraction: 0.0,
        }
    }

    #[test]
    fn word_is_centered_with_exact_depth_span() {
        let (word, _) = validate_word_pair("cat", "dog").unwrap();
        let mesh = extrude_word(&word, &BlockFont, &sharp(10.0, 4.0)).unwrap();
        mesh.validate().unwrap();
        assert!(mesh.triangle_count() > 0);
        assert_eq!(mesh.normals.len(), mesh.positions.len());

        let bounds = mesh.bounds().unwrap();
        assert!((bounds.min.z + 2.0).abs() <= 1e-9);
        assert!((bounds.max.z - 2.0).abs() <= 1e-9);
        for axis in 0..3 {
            let min = bounds.min.to_array()[axis];
            let max = bounds.max.to_array()[axis];
            assert!((min + max).abs() <= 1e-9, "axis {axis}: {min}..{max}");
        }
    }

    #[test]
    fn glyphs_advance_without_kerning() {
        let (word, _) = validate_word_pair("II", "II").unwrap();
        let mesh = extrude_word(&word, &BlockFont, &sharp(7.0, 1.0)).unwrap();
        let bounds = mesh.bounds().unwrap();
        // Two 'I's: ink spans cols 1..4 of the first cell and 7..10 of the second.
        assert!((bounds.size().x - 9.0).abs() <= 1e-9);
        assert!((bounds.size().y - 7.0).abs() <= 1e-9);
    }

    #[test]
    fn missing_glyph_fails_without_partial_mesh() {
        let (word, _) = validate_word_pair("A1", "BC").unwrap();
        let err = extrude_word(&word, &NoDigits, &sharp(10.0, 4.0)).unwrap_err();
        match err {
            GlyphError::Missing(missing) => assert_eq!(
                missing,
                FontResolutionError::MissingGlyph {
                    ch: '1',
                    font: "no-digits".to_string()
                }
            ),
            other => panic!("expected a missing glyph, got {other:?}"),
        }
    }

    /// Block font plus a '~' whose only contour is a sliver flatter than the
    /// cap tolerance: it has area, but no triangle survives cleanup.
    struct SliverTilde;

    impl GlyphSource for SliverTilde {
        fn name(&self) -> &str {
            "sliver"
        }

        fn resolve_glyph(&self, ch: char) -> Option<GlyphOutline> {
            if ch != '~' {
                return BlockFont.resolve_glyph(ch);
            }
            Some(GlyphOutline {
                commands: vec![
                    PathCommand::MoveTo(Point2::new(0.0, 0.0)),
                    PathCommand::LineTo(Point2::new(1.0, 0.0)),
                    PathCommand::LineTo(Point2::new(0.5, 5e-10)),
                    PathCommand::Close,
                ],
                advance: 1.0,
            })
        }
    }

    #[test]
    fn uncappable_glyph_fails_the_word() {
        let (word, _) = validate_word_pair("~I", "AB").unwrap();
        let err = extrude_word(&word, &SliverTilde, &sharp(10.0, 4.0)).unwrap_err();
        match err {
            GlyphError::Extrusion { ch, source } => {
                assert_eq!(ch, '~');
                assert!(matches!(
                    source,
                    ExtrusionError::CapTriangulation(TriangulationError::Degenerate)
                ));
            }
            other => panic!("expected an extrusion error, got {other:?}"),
        }

        let (plain, _) = validate_word_pair("II", "AB").unwrap();
        assert!(extrude_word(&plain, &SliverTilde, &sharp(10.0, 4.0)).is_ok());
    }

    #[test]
    fn fillet_adds_triangles_but_keeps_depth() {
        let (word, _) = validate_word_pair("OK", "NO").unwrap();
        let flat = extrude_word(&word, &BlockFont, &sharp(10.0, 4.0)).unwrap();
        let rounded = extrude_word(
            &word,
            &BlockFont,
            &ExtrusionParams {
                fillet_fraction: 1.0,
                ..sharp(10.0, 4.0)
            },
        )
        .unwrap();
        assert!(rounded.triangle_count() > flat.triangle_count());
        let bounds = rounded.bounds().unwrap();
        assert!((bounds.size().z - 4.0).abs() <= 1e-9);
    }
}
