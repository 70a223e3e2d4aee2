use super::CompositeSolid;
use crate::geom::{MeshGroup, TriangleMesh};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("merge requires at least one mesh")]
pub struct EmptyMergeError;

/// Fuse meshes by buffer concatenation.
///
/// Positions are appended in input order and every mesh's indices are offset
/// by the vertices before it. Nothing is welded, deduplicated or unioned, so
/// overlapping triangles survive and the triangle count is the sum of the
/// inputs. UVs are kept only when every input has them. With `merge_groups`
/// the result is one group, otherwise one group per input. Normals are
/// recomputed over the combined index buffer.
pub fn merge(meshes: Vec<TriangleMesh>, merge_groups: bool) -> Result<TriangleMesh, EmptyMergeError> {
    if meshes.is_empty() {
        return Err(EmptyMergeError);
    }

    let input_count = meshes.len();
    let vertex_total: usize = meshes.iter().map(TriangleMesh::vertex_count).sum();
    let index_total: usize = meshes.iter().map(|m| m.indices.len()).sum();
    let keep_uvs = meshes
        .iter()
        .all(|m| m.uvs.as_ref().is_some_and(|uvs| uvs.len() == m.positions.len()));
    if !keep_uvs && meshes.iter().any(|m| m.uvs.is_some()) {
        log::debug!("merge: dropping UVs because not every input mesh carries them");
    }

    let mut merged = TriangleMesh {
        positions: Vec::with_capacity(vertex_total),
        normals: Vec::new(),
        uvs: keep_uvs.then(|| Vec::with_capacity(vertex_total)),
        indices: Vec::with_capacity(index_total),
        groups: Vec::with_capacity(meshes.len()),
    };

    for (source, mesh) in meshes.into_iter().enumerate() {
        let offset = merged.positions.len() as u32;
        let first_index = merged.indices.len();

        merged.indices.extend(mesh.indices.iter().map(|&i| i + offset));
        merged.positions.extend(mesh.positions);
        if let (Some(uvs), Some(more)) = (merged.uvs.as_mut(), mesh.uvs) {
            uvs.extend(more);
        }
        merged.groups.push(MeshGroup {
            first_index,
            index_count: mesh.indices.len(),
            source,
        });
    }

    if merge_groups {
        merged.groups = vec![MeshGroup {
            first_index: 0,
            index_count: merged.indices.len(),
            source: 0,
        }];
    }

    merged.compute_vertex_normals();

    log::debug!(
        "merged {} meshes: {} vertices, {} triangles, {} groups",
        input_count,
        merged.vertex_count(),
        merged.triangle_count(),
        merged.groups.len()
    );
    Ok(merged)
}

/// Fuse the two placed words, A first.
pub fn merge_composite(solid: CompositeSolid, merge_groups: bool) -> Result<TriangleMesh, EmptyMergeError> {
    merge(vec![solid.mesh_a, solid.mesh_b], merge_groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(z: f64) -> TriangleMesh {
        TriangleMesh::new(
            vec![[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(merge(Vec::new(), false), Err(EmptyMergeError));
    }

    #[test]
    fn concatenation_offsets_indices_and_keeps_overlaps() {
        let merged = merge(vec![tri(0.0), tri(0.0), tri(1.0)], false).unwrap();
        merged.validate().unwrap();
        assert_eq!(merged.triangle_count(), 3);
        assert_eq!(merged.vertex_count(), 9);
        assert_eq!(merged.indices, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(merged.normals.len(), 9);
        assert_eq!(merged.groups.len(), 3);
        assert_eq!(merged.groups[2].first_index, 6);
        assert_eq!(merged.groups[2].source, 2);
    }

    #[test]
    fn merge_groups_collapses_to_one_group() {
        let merged = merge(vec![tri(0.0), tri(1.0)], true).unwrap();
        assert_eq!(merged.groups.len(), 1);
        assert_eq!(merged.groups[0].index_count, 6);
    }

    #[test]
    fn uvs_survive_only_when_every_input_has_them() {
        let mut a = tri(0.0);
        a.uvs = Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mut b = tri(1.0);
        b.uvs = a.uvs.clone();

        let both = merge(vec![a.clone(), b], false).unwrap();
        assert_eq!(both.uvs.as_ref().map(Vec::len), Some(6));

        let mixed = merge(vec![a, tri(2.0)], false).unwrap();
        assert!(mixed.uvs.is_none());
    }
}
