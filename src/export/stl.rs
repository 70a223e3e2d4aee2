//! STL (stereolithography) encoding.
//!
//! ```text
//! solid name
//!   facet normal ni nj nk
//!     outer loop
//!       vertex v1x v1y v1z
//!       vertex v2x v2y v2z
//!       vertex v3x v3y v3z
//!     endloop
//!   endfacet
//! endsolid name
//! ```
//!
//! The binary variant is an 80-byte header, a little-endian `u32` triangle
//! count and one 50-byte record per triangle (normal, three vertices as `f32`,
//! a zero `u16` attribute).

use crate::geom::{TriangleMesh, face_normal};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

const BINARY_HEADER_TEXT: &[u8] = b"binary STL generated by dual-text-engine";

/// One STL facet as written to disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StlFacet {
    pub normal: [f64; 3],
    pub vertices: [[f64; 3]; 3],
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StlParseError {
    #[error("ASCII STL must start with 'solid'")]
    MissingHeader,
    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: &'static str },
    #[error("ASCII STL ended before 'endsolid'")]
    MissingFooter,
    #[error("binary STL is truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
}

/// Solid names may not contain whitespace; anything else is kept.
fn solid_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if cleaned.is_empty() { "mesh".to_string() } else { cleaned }
}

/// Encode the mesh as ASCII STL, one facet per triangle in index order.
///
/// Facet normals come from the triangle's own positions (zero for degenerate
/// triangles), numbers use `{:.6e}`, lines end with `\n`. A mesh without
/// triangles yields only the `solid` / `endsolid` lines.
#[must_use]
pub fn encode_ascii_stl(mesh: &TriangleMesh, name: &str) -> String {
    let name = solid_name(name);
    let mut out = String::with_capacity(64 + mesh.triangle_count() * 256);
    out.push_str(&format!("solid {name}\n"));

    for [v0, v1, v2] in mesh.triangles() {
        let [nx, ny, nz] = face_normal(v0, v1, v2);
        out.push_str(&format!("  facet normal {nx:.6e} {ny:.6e} {nz:.6e}\n"));
        out.push_str("    outer loop\n");
        for v in [v0, v1, v2] {
            out.push_str(&format!("      vertex {:.6e} {:.6e} {:.6e}\n", v[0], v[1], v[2]));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }

    out.push_str(&format!("endsolid {name}\n"));
    out
}

/// Encode the mesh as binary STL.
#[must_use]
pub fn encode_binary_stl(mesh: &TriangleMesh) -> Vec<u8> {
    let count = mesh.triangle_count();
    let mut out = Vec::with_capacity(HEADER_SIZE + 4 + count * TRIANGLE_SIZE);

    let mut header = [b' '; HEADER_SIZE];
    header[..BINARY_HEADER_TEXT.len()].copy_from_slice(BINARY_HEADER_TEXT);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(count as u32).to_le_bytes());

    for [v0, v1, v2] in mesh.triangles() {
        for value in face_normal(v0, v1, v2).into_iter().chain(v0).chain(v1).chain(v2) {
            out.extend_from_slice(&(value as f32).to_le_bytes());
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }

    out
}

/// Parse ASCII STL text back into facets.
pub fn parse_ascii_stl(text: &str) -> Result<Vec<StlFacet>, StlParseError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    match lines.next() {
        Some((_, first)) if first.split_whitespace().next() == Some("solid") => {}
        _ => return Err(StlParseError::MissingHeader),
    }

    let mut facets = Vec::new();
    let mut normal: Option<[f64; 3]> = None;
    let mut vertices: Vec<[f64; 3]> = Vec::with_capacity(3);

    for (line, content) in lines {
        let mut parts = content.split_whitespace();
        match parts.next() {
            Some("facet") => {
                if normal.is_some() {
                    return Err(StlParseError::Malformed { line, reason: "nested facet" });
                }
                if parts.next() != Some("normal") {
                    return Err(StlParseError::Malformed { line, reason: "expected 'facet normal'" });
                }
                normal = Some(parse_triple(line, parts)?);
                vertices.clear();
            }
            Some("outer" | "endloop") => {}
            Some("vertex") => {
                if normal.is_none() {
                    return Err(StlParseError::Malformed { line, reason: "vertex outside facet" });
                }
                vertices.push(parse_triple(line, parts)?);
            }
            Some("endfacet") => {
                let Some(n) = normal.take() else {
                    return Err(StlParseError::Malformed { line, reason: "endfacet without facet" });
                };
                let &[a, b, c] = vertices.as_slice() else {
                    return Err(StlParseError::Malformed {
                        line,
                        reason: "facet must have exactly three vertices",
                    });
                };
                facets.push(StlFacet {
                    normal: n,
                    vertices: [a, b, c],
                });
            }
            Some("endsolid") => return Ok(facets),
            _ => return Err(StlParseError::Malformed { line, reason: "unexpected keyword" }),
        }
    }

    Err(StlParseError::MissingFooter)
}

fn parse_triple<'a>(line: usize, mut parts: impl Iterator<Item = &'a str>) -> Result<[f64; 3], StlParseError> {
    let mut out = [0.0; 3];
    for slot in &mut out {
        let Some(token) = parts.next() else {
            return Err(StlParseError::Malformed { line, reason: "expected three numbers" });
        };
        *slot = token.parse().map_err(|_| StlParseError::InvalidNumber {
            line,
            value: token.to_string(),
        })?;
    }
    Ok(out)
}

/// Parse binary STL bytes back into facets.
pub fn parse_binary_stl(bytes: &[u8]) -> Result<Vec<StlFacet>, StlParseError> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(StlParseError::Truncated {
            expected: HEADER_SIZE + 4,
            found: bytes.len(),
        });
    }
    let mut count_bytes = [0u8; 4];
    count_bytes.copy_from_slice(&bytes[HEADER_SIZE..HEADER_SIZE + 4]);
    let count = u32::from_le_bytes(count_bytes) as usize;

    let expected = HEADER_SIZE + 4 + count * TRIANGLE_SIZE;
    if bytes.len() < expected {
        return Err(StlParseError::Truncated {
            expected,
            found: bytes.len(),
        });
    }

    let read_f32 = |offset: usize| {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes[offset..offset + 4]);
        f64::from(f32::from_le_bytes(buf))
    };
    let read_vec = |offset: usize| [read_f32(offset), read_f32(offset + 4), read_f32(offset + 8)];

    Ok((0..count)
        .map(|i| {
            let base = HEADER_SIZE + 4 + i * TRIANGLE_SIZE;
            StlFacet {
                normal: read_vec(base),
                vertices: [read_vec(base + 12), read_vec(base + 24), read_vec(base + 36)],
            }
        })
        .collect())
}

/// Build an unwelded mesh (three vertices per facet) from parsed facets.
#[must_use]
pub fn facets_to_mesh(facets: &[StlFacet]) -> TriangleMesh {
    let positions: Vec<[f64; 3]> = facets.iter().flat_map(|f| f.vertices).collect();
    let indices = (0..positions.len() as u32).collect();
    let mut mesh = TriangleMesh::new(positions, indices);
    mesh.compute_vertex_normals();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_triangle() -> TriangleMesh {
        TriangleMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn ascii_output_is_byte_exact() {
        let text = encode_ascii_stl(&one_triangle(), "tri");
        let expected = concat!(
            "solid tri\n",
            "  facet normal 0.000000e0 0.000000e0 1.000000e0\n",
            "    outer loop\n",
            "      vertex 0.000000e0 0.000000e0 0.000000e0\n",
            "      vertex 1.000000e0 0.000000e0 0.000000e0\n",
            "      vertex 0.000000e0 1.000000e0 0.000000e0\n",
            "    endloop\n",
            "  endfacet\n",
            "endsolid tri\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_mesh_is_header_and_footer_only() {
        let text = encode_ascii_stl(&TriangleMesh::default(), "my word");
        assert_eq!(text, "solid my_word\nendsolid my_word\n");
        assert!(parse_ascii_stl(&text).unwrap().is_empty());
    }

    #[test]
    fn degenerate_triangle_gets_zero_normal() {
        let mesh = TriangleMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            vec![0, 1, 2],
        );
        let facets = parse_ascii_stl(&encode_ascii_stl(&mesh, "flat")).unwrap();
        assert_eq!(facets[0].normal, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn ascii_round_trip_preserves_triangle() {
        let mesh = TriangleMesh::new(
            vec![[0.5, -1.25, 3.0], [2.0, 0.0, 3.0], [0.5, 4.0, -1.0]],
            vec![0, 1, 2],
        );
        let facets = parse_ascii_stl(&encode_ascii_stl(&mesh, "tri")).unwrap();
        assert_eq!(facets.len(), 1);
        for (parsed, original) in facets[0].vertices.iter().zip(&mesh.positions) {
            for k in 0..3 {
                assert!((parsed[k] - original[k]).abs() <= 1e-6);
            }
        }
        let back = facets_to_mesh(&facets);
        assert_eq!(back.triangle_count(), 1);
    }

    #[test]
    fn binary_layout_and_round_trip() {
        let bytes = encode_binary_stl(&one_triangle());
        assert_eq!(bytes.len(), HEADER_SIZE + 4 + TRIANGLE_SIZE);
        assert_eq!(&bytes[80..84], &1u32.to_le_bytes());
        assert!(!bytes.starts_with(b"solid"));

        let facets = parse_binary_stl(&bytes).unwrap();
        assert_eq!(facets[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(facets[0].vertices[1], [1.0, 0.0, 0.0]);

        assert!(matches!(
            parse_binary_stl(&bytes[..100]),
            Err(StlParseError::Truncated { .. })
        ));
    }

    #[test]
    fn parser_rejects_malformed_text() {
        assert_eq!(parse_ascii_stl("facet normal 0 0 1"), Err(StlParseError::MissingHeader));
        assert!(matches!(
            parse_ascii_stl("solid x\n facet normal 0 0 q\n"),
            Err(StlParseError::InvalidNumber { line: 2, .. })
        ));
        assert!(matches!(
            parse_ascii_stl("solid x\n facet normal 0 0 1\n outer loop\n vertex 0 0 0\n endloop\n endfacet\nendsolid x\n"),
            Err(StlParseError::Malformed { line: 6, .. })
        ));
        assert_eq!(parse_ascii_stl("solid x\n"), Err(StlParseError::MissingFooter));
    }
}
