use cgmath::{InnerSpace, Vector3};
use cube_drift::resources::mesh::cube_vertices;

#[test]
fn should_build_four_vertices_per_face() {
    let (vertices, indices) = cube_vertices();
    assert_eq!(vertices.len(), 24);
    assert_eq!(indices.len(), 36);
    assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
}

#[test]
fn should_stay_inside_the_unit_cube() {
    let (vertices, _) = cube_vertices();
    for vertex in &vertices {
        for axis in 0..3 {
            assert!(vertex.position[axis].abs() <= 0.5);
        }
    }
}

#[test]
fn should_have_axis_aligned_unit_normals() {
    let (vertices, _) = cube_vertices();
    for vertex in &vertices {
        let normal: Vector3<f32> = vertex.normal.into();
        assert_eq!(normal.magnitude(), 1.0);
        // exactly one axis set
        let set = vertex.normal.iter().filter(|c| c.abs() == 1.0).count();
        assert_eq!(set, 1);
    }
}

#[test]
fn should_span_the_full_uv_quad_per_face() {
    let (vertices, _) = cube_vertices();
    for face in vertices.chunks(4) {
        let mut corners: Vec<[f32; 2]> = face.iter().map(|v| v.tex_coords).collect();
        corners.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(
            corners,
            vec![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]
        );
    }
}

#[test]
fn should_wind_triangles_counter_clockwise() {
    let (vertices, indices) = cube_vertices();
    for triangle in indices.chunks(3) {
        let p0: Vector3<f32> = vertices[triangle[0] as usize].position.into();
        let p1: Vector3<f32> = vertices[triangle[1] as usize].position.into();
        let p2: Vector3<f32> = vertices[triangle[2] as usize].position.into();
        let normal: Vector3<f32> = vertices[triangle[0] as usize].normal.into();

        // the cross product of CCW edges must face the same way as the normal
        let winding = (p1 - p0).cross(p2 - p0);
        assert!(
            winding.dot(normal) > 0.0,
            "triangle {:?} winds away from its normal",
            triangle
        );
    }
}
