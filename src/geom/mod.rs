mod core;
mod extrusion;
mod mesh;
mod outline;
mod triangulation;

pub use core::{BBox, Point2, Point3, Tolerance, Transform, Vec3};
pub use extrusion::{BevelProfile, ExtrusionError, extrude_shape};
pub use mesh::{MeshGroup, TriangleMesh, face_normal};
pub use outline::{CURVE_SEGMENTS, PathCommand, Shape, clean_loop, flatten_path, group_shapes};
pub use triangulation::{TriangulationError, point_in_loop, signed_area, triangulate_polygon};

#[cfg(test)]
mod tests;
