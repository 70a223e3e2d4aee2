//! The whole chain in one call: validate, extrude both words, place B across
//! A, merge, and optionally serialize.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::export::{EncodingError, GlbOptions, encode_ascii_stl, encode_binary_stl, encode_glb};
use crate::font::{FontLoadError, GlyphSource};
use crate::geom::TriangleMesh;
use crate::text::{
    EmptyMergeError, ExtrusionParams, GlyphError, InputValidationError, WordSpec, compose,
    extrude_word, merge_composite, validate_word_pair,
};

#[derive(Debug, thiserror::Error)]
pub enum IllusionError {
    #[error(transparent)]
    Input(#[from] InputValidationError),
    #[error(transparent)]
    Glyph(#[from] GlyphError),
    #[error(transparent)]
    FontLoad(#[from] FontLoadError),
    #[error("merge received no meshes")]
    Merge(#[from] EmptyMergeError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Output container for [`export_mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    #[default]
    Glb,
    #[serde(rename = "stl")]
    StlAscii,
    StlBinary,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Glb => "glb",
            Self::StlAscii | Self::StlBinary => "stl",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Glb => "glb",
            Self::StlAscii => "stl",
            Self::StlBinary => "stl-binary",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "glb" => Ok(Self::Glb),
            "stl" | "stl-ascii" => Ok(Self::StlAscii),
            "stl-binary" => Ok(Self::StlBinary),
            other => Err(format!("unknown export format '{other}' (expected glb, stl or stl-binary)")),
        }
    }
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct IllusionRequest {
    pub word_a: WordSpec,
    pub word_b: WordSpec,
    pub params: ExtrusionParams,
    /// Collapse the two source groups into one.
    pub merge_groups: bool,
}

impl IllusionRequest {
    /// Validate both words and the parameters before any geometry is built.
    pub fn new(
        word_a: &str,
        word_b: &str,
        params: ExtrusionParams,
        merge_groups: bool,
    ) -> Result<Self, InputValidationError> {
        let (word_a, word_b) = validate_word_pair(word_a, word_b)?;
        params.validate()?;
        Ok(Self {
            word_a,
            word_b,
            params,
            merge_groups,
        })
    }
}

/// Per-stage counts, serializable for the CLI and the wasm surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub word_a: String,
    pub word_b: String,
    pub triangles_a: usize,
    pub triangles_b: usize,
    pub triangles_merged: usize,
    pub vertices: usize,
    pub bounds_min: [f64; 3],
    pub bounds_max: [f64; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct IllusionSolid {
    pub mesh: TriangleMesh,
    pub report: PipelineReport,
}

/// Build the merged dual-read solid for `request` with glyphs from `font`.
pub fn generate_illusion(
    request: &IllusionRequest,
    font: &dyn GlyphSource,
) -> Result<IllusionSolid, IllusionError> {
    let params = &request.params;
    let (mesh_a, mesh_b) = extrude_pair(request, font);
    let (mesh_a, mesh_b) = (mesh_a?, mesh_b?);
    let triangles_a = mesh_a.triangle_count();
    let triangles_b = mesh_b.triangle_count();

    let solid = compose(mesh_a, mesh_b, params.padding_offset);
    let mesh = merge_composite(solid, request.merge_groups)?;

    let (bounds_min, bounds_max) = mesh
        .bounds()
        .map_or(([0.0; 3], [0.0; 3]), |b| (b.min.to_array(), b.max.to_array()));
    let report = PipelineReport {
        word_a: request.word_a.to_string(),
        word_b: request.word_b.to_string(),
        triangles_a,
        triangles_b,
        triangles_merged: mesh.triangle_count(),
        vertices: mesh.vertex_count(),
        bounds_min,
        bounds_max,
    };
    log::info!(
        "generated '{}' / '{}': {} triangles ({} + {})",
        report.word_a,
        report.word_b,
        report.triangles_merged,
        triangles_a,
        triangles_b
    );
    Ok(IllusionSolid { mesh, report })
}

type ExtrudeResult = Result<TriangleMesh, GlyphError>;

#[cfg(feature = "parallel")]
fn extrude_pair(request: &IllusionRequest, font: &dyn GlyphSource) -> (ExtrudeResult, ExtrudeResult) {
    rayon::join(
        || extrude_word(&request.word_a, font, &request.params),
        || extrude_word(&request.word_b, font, &request.params),
    )
}

#[cfg(not(feature = "parallel"))]
fn extrude_pair(request: &IllusionRequest, font: &dyn GlyphSource) -> (ExtrudeResult, ExtrudeResult) {
    (
        extrude_word(&request.word_a, font, &request.params),
        extrude_word(&request.word_b, font, &request.params),
    )
}

/// Serialize `mesh` in `format`; `name` becomes the STL solid name and the
/// GLB node name.
pub fn export_mesh(
    mesh: &TriangleMesh,
    format: ExportFormat,
    name: &str,
    glb: &GlbOptions,
) -> Result<Vec<u8>, EncodingError> {
    match format {
        ExportFormat::Glb => {
            let options = GlbOptions {
                mesh_name: name.to_string(),
                ..glb.clone()
            };
            encode_glb(mesh, &options)
        }
        ExportFormat::StlAscii => Ok(encode_ascii_stl(mesh, name).into_bytes()),
        ExportFormat::StlBinary => Ok(encode_binary_stl(mesh)),
    }
}
