use serde::Serialize;

use super::{BBox, Point3, Transform, Vec3};

/// Contiguous range of the index buffer that came from one source mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshGroup {
    /// Offset into `indices` (always a multiple of 3).
    pub first_index: usize,
    pub index_count: usize,
    /// Ordinal of the input mesh this range was taken from.
    pub source: usize,
}

impl MeshGroup {
    #[must_use]
    pub const fn triangle_count(&self) -> usize {
        self.index_count / 3
    }

    #[must_use]
    pub const fn index_range(&self) -> std::ops::Range<usize> {
        self.first_index..self.first_index + self.index_count
    }
}

/// Indexed triangle list shared by every stage of the pipeline.
///
/// `normals` is either empty (not computed yet) or one entry per position.
/// An empty `groups` list means the whole index buffer is one group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleMesh {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    pub uvs: Option<Vec<[f64; 2]>>,
    pub indices: Vec<u32>,
    pub groups: Vec<MeshGroup>,
}

impl TriangleMesh {
    /// Create a mesh with positions and indices only.
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals: Vec::new(),
            uvs: None,
            indices,
            groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Check buffer consistency: triangle-list length, finite positions,
    /// index bounds, attribute lengths and group ranges.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.positions.len();
        if self.indices.len() % 3 != 0 {
            return Err(format!("index buffer length {} is not a multiple of 3", self.indices.len()));
        }
        if let Some(v) = self.positions.iter().position(|p| p.iter().any(|c| !c.is_finite())) {
            return Err(format!("position {v} is not finite"));
        }
        if let Some(&i) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(format!("index {i} out of bounds for {n} vertices"));
        }
        if !self.normals.is_empty() && self.normals.len() != n {
            return Err(format!("{} normals for {n} vertices", self.normals.len()));
        }
        if let Some(uvs) = self.uvs.as_ref().filter(|uvs| uvs.len() != n) {
            return Err(format!("{} uvs for {n} vertices", uvs.len()));
        }
        let bad_group = self.groups.iter().find(|g| {
            g.first_index % 3 != 0
                || g.index_count % 3 != 0
                || g.first_index + g.index_count > self.indices.len()
        });
        if let Some(g) = bad_group {
            return Err(format!(
                "group {}..{} does not cover whole triangles of {} indices",
                g.first_index,
                g.first_index + g.index_count,
                self.indices.len()
            ));
        }
        Ok(())
    }

    /// Axis-aligned bounds of the current positions; `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        BBox::from_positions(&self.positions)
    }

    /// Groups to emit, falling back to a single range over every index.
    #[must_use]
    pub fn effective_groups(&self) -> Vec<MeshGroup> {
        if self.groups.is_empty() {
            vec![MeshGroup {
                first_index: 0,
                index_count: self.indices.len(),
                source: 0,
            }]
        } else {
            self.groups.clone()
        }
    }

    /// Corner positions of every triangle, in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [[f64; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }

    /// Append `other`'s vertices and triangles, offsetting its indices.
    ///
    /// Attributes missing on either side are dropped from the result so the
    /// buffers stay the same length.
    pub fn append(&mut self, other: &Self) {
        let offset = self.positions.len() as u32;
        let had_vertices = !self.positions.is_empty();

        let keep_normals = self.normals.len() == self.positions.len()
            && other.normals.len() == other.positions.len();
        let keep_uvs = (self.uvs.is_some() || !had_vertices) && other.uvs.is_some();

        self.positions.extend_from_slice(&other.positions);
        if keep_normals {
            self.normals.extend_from_slice(&other.normals);
        } else {
            self.normals.clear();
        }
        match (keep_uvs, self.uvs.as_mut(), other.uvs.as_ref()) {
            (true, Some(uvs), Some(more)) => uvs.extend_from_slice(more),
            (true, None, Some(more)) => self.uvs = Some(more.clone()),
            _ => self.uvs = None,
        }
        self.indices.extend(other.indices.iter().map(|&i| i + offset));
    }

    /// Recompute area-weighted vertex normals from the index buffer.
    pub fn compute_vertex_normals(&mut self) {
        self.normals = compute_smooth_normals(&self.positions, &self.indices);
    }

    /// Apply `transform` to every position; normals get the linear part only.
    #[must_use]
    pub fn transformed(mut self, transform: Transform) -> Self {
        for p in &mut self.positions {
            *p = transform.apply_point(Point3::from_array(*p)).to_array();
        }
        for n in &mut self.normals {
            let v = transform.apply_vec(Vec3::from_array(*n));
            *n = v.normalized().unwrap_or(v).to_array();
        }
        self
    }

    #[must_use]
    pub fn translated(self, offset: Vec3) -> Self {
        self.transformed(Transform::translate(offset))
    }
}

/// Unit normal of the triangle `a, b, c` (counter-clockwise front face), or
/// the zero vector when the triangle is degenerate.
#[must_use]
pub fn face_normal(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f64; 3] {
    let ab = Vec3::from_array(b) - Vec3::from_array(a);
    let ac = Vec3::from_array(c) - Vec3::from_array(a);
    ab.cross(ac)
        .normalized()
        .map_or([0.0, 0.0, 0.0], Vec3::to_array)
}

fn compute_smooth_normals(positions: &[[f64; 3]], indices: &[u32]) -> Vec<[f64; 3]> {
    let mut normals = vec![[0.0, 0.0, 0.0]; positions.len()];

    for tri in indices.chunks_exact(3) {
        let i0 = tri[0] as usize;
        let i1 = tri[1] as usize;
        let i2 = tri[2] as usize;

        let (Some(a), Some(b), Some(c)) = (positions.get(i0), positions.get(i1), positions.get(i2)) else {
            continue;
        };

        // Unnormalized cross product: its length is twice the triangle area.
        let n = (Vec3::from_array(*b) - Vec3::from_array(*a))
            .cross(Vec3::from_array(*c) - Vec3::from_array(*a));

        for i in [i0, i1, i2] {
            normals[i][0] += n.x;
            normals[i][1] += n.y;
            normals[i][2] += n.z;
        }
    }

    for n in &mut normals {
        *n = Vec3::from_array(*n)
            .normalized()
            .map_or([0.0, 0.0, 1.0], Vec3::to_array);
    }

    normals
}
