use crate::geom::{Point3, Transform, TriangleMesh, Vec3, face_normal};

fn unit_triangle() -> TriangleMesh {
    TriangleMesh::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        vec![0, 1, 2],
    )
}

#[test]
fn triangle_mesh_validate_rejects_bad_buffers() {
    let mesh = TriangleMesh::new(vec![[0.0, 0.0, 0.0]], vec![0]);
    assert!(mesh.validate().is_err());

    let mesh = TriangleMesh::new(vec![[0.0, 0.0, 0.0]], vec![0, 1, 0]);
    assert!(mesh.validate().is_err());

    let mesh = TriangleMesh::new(vec![[f64::NAN, 0.0, 0.0]], vec![]);
    assert!(mesh.validate().is_err());

    let mut mesh = unit_triangle();
    mesh.uvs = Some(vec![[0.0, 0.0]]);
    assert!(mesh.validate().is_err());

    let empty = TriangleMesh::default();
    empty.validate().expect("zero triangles is a valid mesh");
    assert!(empty.bounds().is_none());
}

#[test]
fn vertex_normals_are_area_weighted_and_unit_length() {
    let mut mesh = unit_triangle();
    mesh.compute_vertex_normals();
    assert_eq!(mesh.normals.len(), 3);
    for n in &mesh.normals {
        assert!((n[2] - 1.0).abs() <= 1e-12);
    }

    // Two faces sharing vertex 0: a large one facing +Z and a small one facing +X.
    let mut mesh = TriangleMesh::new(
        vec![
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [0.0, 4.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        vec![0, 1, 2, 0, 3, 4],
    );
    mesh.compute_vertex_normals();
    let shared = Vec3::from_array(mesh.normals[0]);
    assert!((shared.length() - 1.0).abs() <= 1e-12);
    assert!(shared.z > shared.x);
}

#[test]
fn face_normal_of_degenerate_triangle_is_zero() {
    assert_eq!(face_normal([0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
    assert_eq!(face_normal([0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
}

#[test]
fn append_offsets_indices_and_drops_missing_uvs() {
    let mut a = unit_triangle();
    a.uvs = Some(vec![[0.0, 0.0]; 3]);
    let b = unit_triangle().translated(Vec3::new(0.0, 0.0, 5.0));

    a.append(&b);
    assert_eq!(a.vertex_count(), 6);
    assert_eq!(a.indices, vec![0, 1, 2, 3, 4, 5]);
    assert!(a.uvs.is_none());
    a.validate().unwrap();

    let bounds = a.bounds().unwrap();
    assert_eq!(bounds.max, Point3::new(1.0, 1.0, 5.0));
}

#[test]
fn transformed_rotates_normals_without_translating_them() {
    let mut mesh = unit_triangle();
    mesh.compute_vertex_normals();
    let t = Transform::translate(Vec3::new(2.0, 0.0, 0.0))
        * Transform::rotate_y(std::f64::consts::FRAC_PI_2);
    let mesh = mesh.transformed(t);

    for n in &mesh.normals {
        assert!((n[0] - 1.0).abs() <= 1e-12);
        assert!(n[1].abs() <= 1e-12);
        assert!(n[2].abs() <= 1e-12);
    }
    assert!((mesh.positions[0][0] - 2.0).abs() <= 1e-12);
}
