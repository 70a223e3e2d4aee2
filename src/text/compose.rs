use std::f64::consts::FRAC_PI_2;

use crate::geom::{Transform, TriangleMesh, Vec3};

/// The two placed word volumes, not yet fused.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositeSolid {
    pub mesh_a: TriangleMesh,
    pub mesh_b: TriangleMesh,
}

impl CompositeSolid {
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.mesh_a.triangle_count() + self.mesh_b.triangle_count()
    }
}

/// Placement of word B: a right-handed quarter turn about +Y
/// (`x' = z`, `z' = -x`) followed by a shift of `padding_offset` along +X.
#[must_use]
pub fn illusion_transform(padding_offset: f64) -> Transform {
    Transform::translate(Vec3::new(padding_offset, 0.0, 0.0)) * Transform::rotate_y(FRAC_PI_2)
}

/// Place word B across word A. Both meshes are expected to be centered on the
/// origin, as [`extrude_word`](super::extrude_word) leaves them; A is returned
/// untouched.
#[must_use]
pub fn compose(mesh_a: TriangleMesh, mesh_b: TriangleMesh, padding_offset: f64) -> CompositeSolid {
    let mesh_b = mesh_b.transformed(illusion_transform(padding_offset));
    log::debug!(
        "composed solid: A {} triangles, B {} triangles, padding {}",
        mesh_a.triangle_count(),
        mesh_b.triangle_count(),
        padding_offset
    );
    CompositeSolid { mesh_a, mesh_b }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point3;

    #[test]
    fn word_b_is_rotated_then_padded() {
        let b = TriangleMesh::new(
            vec![[1.0, 2.0, 3.0], [-1.0, 0.0, 0.5], [0.0, -2.0, -3.0]],
            vec![0, 1, 2],
        );
        let a = TriangleMesh::new(vec![[5.0, 5.0, 5.0]; 3], vec![0, 1, 2]);
        let solid = compose(a.clone(), b.clone(), 1.5);

        assert_eq!(solid.mesh_a, a);
        for (before, after) in b.positions.iter().zip(&solid.mesh_b.positions) {
            assert!((after[0] - (before[2] + 1.5)).abs() <= 1e-12);
            assert!((after[1] - before[1]).abs() <= 1e-12);
            assert!((after[2] + before[0]).abs() <= 1e-12);
        }
        assert_eq!(solid.triangle_count(), 2);
    }

    #[test]
    fn illusion_transform_moves_origin_by_padding_only() {
        let p = illusion_transform(2.0).apply_point(Point3::ORIGIN);
        assert_eq!(p, Point3::new(2.0, 0.0, 0.0));
    }
}
