//! Mesh serializers: ASCII and binary STL for printing, GLB for viewers.

mod glb;
mod stl;

pub use glb::{
    GLB_MAGIC, GLB_VERSION, GlbDocument, GlbOptions, GlbParseError, encode_glb, CHUNK_BIN,
    CHUNK_JSON,
};
pub use stl::{
    StlFacet, StlParseError, encode_ascii_stl, encode_binary_stl, facets_to_mesh,
    parse_ascii_stl, parse_binary_stl,
};

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("mesh has no triangles to export")]
    EmptyMesh,
    #[error("mesh buffers are invalid: {0}")]
    InvalidMesh(String),
    #[error("failed to serialize scene descriptor: {0}")]
    Json(#[from] serde_json::Error),
}
