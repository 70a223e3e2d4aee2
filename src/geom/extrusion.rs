use std::f64::consts::FRAC_PI_2;

use super::mesh::TriangleMesh;
use super::outline::Shape;
use super::triangulation::{TriangulationError, triangulate_polygon};
use super::{Point2, Tolerance};

#[derive(Debug, thiserror::Error)]
pub enum ExtrusionError {
    #[error("extrusion depth must be finite and positive, got {0}")]
    InvalidDepth(f64),
    #[error("bevel must be finite and fit inside the extrusion depth")]
    InvalidBevel,
    #[error("profile points must be finite")]
    NonFinitePoint,
    #[error("profile requires at least {min} unique points")]
    NotEnoughPoints { min: usize },
    #[error("failed to triangulate cap: {0}")]
    CapTriangulation(#[from] TriangulationError),
}

/// Rounded edge profile applied at both caps.
///
/// Ring `k` of `segments` sits at `z = thickness × (1 − cos θ)` with an inward
/// inset of `width × (1 − sin θ)`, where `θ = k / segments × π/2`. The back cap
/// mirrors the front one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BevelProfile {
    pub thickness: f64,
    pub width: f64,
    pub segments: usize,
}

impl BevelProfile {
    pub const NONE: Self = Self {
        thickness: 0.0,
        width: 0.0,
        segments: 0,
    };

    #[must_use]
    pub fn is_sharp(&self) -> bool {
        self.segments == 0 || (self.thickness <= 0.0 && self.width <= 0.0)
    }

    /// `(z, inset)` for every profile ring from the front cap to the back cap.
    #[must_use]
    pub fn rings(&self, depth: f64) -> Vec<(f64, f64)> {
        if self.is_sharp() {
            return vec![(0.0, 0.0), (depth, 0.0)];
        }

        let n = self.segments;
        let front: Vec<(f64, f64)> = (0..=n)
            .map(|k| {
                let theta = k as f64 / n as f64 * FRAC_PI_2;
                (
                    self.thickness * (1.0 - theta.cos()),
                    self.width * (1.0 - theta.sin()),
                )
            })
            .collect();

        let back = front.iter().rev().map(|&(z, inset)| (depth - z, inset));
        front.iter().copied().chain(back).collect()
    }
}

/// Extrude a shape (outer loop plus holes, in the XY plane) along +Z over
/// `[0, depth]`.
///
/// The front cap at `z = 0` faces −Z, the back cap at `z = depth` faces +Z and
/// the walls face away from the material. Every wall edge and each cap owns its
/// vertices so creases stay sharp once normals are computed.
pub fn extrude_shape(
    shape: &Shape,
    depth: f64,
    bevel: BevelProfile,
    tol: Tolerance,
) -> Result<TriangleMesh, ExtrusionError> {
    if !depth.is_finite() || depth <= 0.0 {
        return Err(ExtrusionError::InvalidDepth(depth));
    }
    if !bevel.thickness.is_finite()
        || !bevel.width.is_finite()
        || bevel.thickness < 0.0
        || bevel.width < 0.0
        || 2.0 * bevel.thickness > depth
    {
        return Err(ExtrusionError::InvalidBevel);
    }
    if shape.outer.len() < 3 {
        return Err(ExtrusionError::NotEnoughPoints { min: 3 });
    }
    if shape.loops().flatten().any(|p| !p.is_finite()) {
        return Err(ExtrusionError::NonFinitePoint);
    }

    let cap_triangles = triangulate_polygon(&shape.outer, &shape.holes, tol)?;
    let rings = bevel.rings(depth);

    let mut positions: Vec<[f64; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    // Inset copies of every loop, one per distinct inset value.
    let inset_loops = |inset: f64| -> Vec<Vec<Point2>> {
        shape
            .loops()
            .map(|l| if inset > 0.0 { inset_loop(l, inset) } else { l.to_vec() })
            .collect()
    };
    let ring_loops: Vec<Vec<Vec<Point2>>> = rings.iter().map(|&(_, inset)| inset_loops(inset)).collect();

    for loop_idx in 0..shape.loop_count() {
        let n = ring_loops[0][loop_idx].len();
        for i in 0..n {
            let j = (i + 1) % n;
            let base = positions.len() as u32;
            for (ring, &(z, _)) in rings.iter().enumerate() {
                let pts = &ring_loops[ring][loop_idx];
                positions.push([pts[i].x, pts[i].y, z]);
                positions.push([pts[j].x, pts[j].y, z]);
            }
            for span in 0..rings.len() as u32 - 1 {
                let a0 = base + span * 2;
                let b0 = a0 + 1;
                let a1 = a0 + 2;
                let b1 = a0 + 3;
                indices.extend_from_slice(&[a0, b0, b1]);
                indices.extend_from_slice(&[a0, b1, a1]);
            }
        }
    }

    let last = rings.len() - 1;
    for (ring, z, front) in [(0, rings[0].0, true), (last, rings[last].0, false)] {
        let offset = positions.len() as u32;
        positions.extend(ring_loops[ring].iter().flatten().map(|p| [p.x, p.y, z]));
        for tri in &cap_triangles {
            if front {
                indices.extend_from_slice(&[offset + tri[0], offset + tri[2], offset + tri[1]]);
            } else {
                indices.extend_from_slice(&[offset + tri[0], offset + tri[1], offset + tri[2]]);
            }
        }
    }

    Ok(TriangleMesh::new(positions, indices))
}

/// Move every vertex of a closed loop `distance` to the left of its edges
/// (into the material for counter-clockwise outers and clockwise holes).
fn inset_loop(points: &[Point2], distance: f64) -> Vec<Point2> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];

            let n0 = left_normal(prev, cur);
            let n1 = left_normal(cur, next);
            let (mx, my) = (n0.0 + n1.0, n0.1 + n1.1);
            let len = (mx * mx + my * my).sqrt();
            let (bx, by) = if len > 1e-12 { (mx / len, my / len) } else { n0 };

            // Miter length, clamped so sharp spikes do not shoot off.
            let scale = 1.0 / (bx * n0.0 + by * n0.1).max(0.25);
            Point2::new(cur.x + bx * distance * scale, cur.y + by * distance * scale)
        })
        .collect()
}

fn left_normal(a: Point2, b: Point2) -> (f64, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len > 0.0 { (-dy / len, dx / len) } else { (0.0, 0.0) }
}
