//! Integration tests for diffshape-mesh.

use diffshape_math::{ExecutionContext, Precision};
use diffshape_mesh::generators::{quad_grid, tetrahedron, unit_square, unweld, uv_sphere};
use diffshape_mesh::normals::{compute_normals, face_normals, vertex_normals};
use diffshape_mesh::topology::Topology;
use diffshape_mesh::weld::weld;
use diffshape_mesh::{DVec3, TriangleMesh, VertexField, WeldMap};
use diffshape_types::{DiffShapeError, VertexId};
use proptest::prelude::*;

fn close(a: DVec3, b: DVec3, tol: f64) -> bool {
    (a - b).abs().max_element() < tol
}

// ─── TriangleMesh Tests ───────────────────────────────────────

#[test]
fn basic_counts() {
    let mesh = unit_square();
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(mesh.triangle(1), [0, 2, 3]);
    assert!(mesh.validate().is_ok());
}

#[test]
fn out_of_range_face_rejected() {
    let err = TriangleMesh::new(vec![DVec3::ZERO; 3], vec![[0, 1, 3]]).unwrap_err();
    match err {
        DiffShapeError::FaceIndexOutOfRange {
            face,
            vertex,
            vertex_count,
        } => {
            assert_eq!(face, 0);
            assert_eq!(vertex, 3);
            assert_eq!(vertex_count, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_finite_position_rejected() {
    let positions = vec![DVec3::ZERO, DVec3::X, DVec3::new(f64::NAN, 0.0, 0.0)];
    let err = TriangleMesh::new(positions, vec![[0, 1, 2]]).unwrap_err();
    assert!(matches!(err, DiffShapeError::InvalidMesh(_)));
}

#[test]
fn repeated_index_face_allowed() {
    assert!(TriangleMesh::new(vec![DVec3::ZERO, DVec3::X], vec![[0, 0, 1]]).is_ok());
}

#[test]
fn from_flat_buffers() {
    let mesh = TriangleMesh::from_flat(
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        &[0, 1, 2],
    )
    .unwrap();
    assert_eq!(mesh.positions[2], DVec3::Y);
    assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    assert_eq!(mesh.flat_positions().len(), 9);

    assert!(TriangleMesh::from_flat(&[0.0, 1.0], &[]).is_err());
    assert!(TriangleMesh::from_flat(&[0.0; 9], &[0, 1]).is_err());
}

#[test]
fn with_positions_checks_length() {
    let mesh = unit_square();
    assert!(mesh.with_positions(vec![DVec3::ZERO; 3]).is_err());
    let moved = mesh.with_positions(vec![DVec3::ONE; 4]).unwrap();
    assert_eq!(moved.faces, mesh.faces);
}

#[test]
fn average_edge_length_of_unit_square() {
    let expected = (4.0 + 2.0 * 2f64.sqrt()) / 6.0;
    assert!((unit_square().average_edge_length() - expected).abs() < 1e-12);
    assert_eq!(TriangleMesh::default().average_edge_length(), 0.0);
}

#[test]
fn mesh_serde_roundtrip() {
    let mesh = tetrahedron();
    let json = serde_json::to_string(&mesh).unwrap();
    let back: TriangleMesh = serde_json::from_str(&json).unwrap();
    assert_eq!(back, mesh);
}

// ─── VertexField Tests ────────────────────────────────────────

#[test]
fn field_points_roundtrip() {
    let points = vec![DVec3::new(1.0, 2.0, 3.0), DVec3::new(-4.0, 5.0, -6.0)];
    let field = VertexField::from_points(&points);
    assert_eq!(field.x, vec![1.0, -4.0]);
    assert_eq!(field.to_points(), points);
    assert_eq!(field.point(1), points[1]);
}

#[test]
fn field_channel_lengths_checked() {
    assert!(VertexField::from_channels([vec![0.0; 2], vec![0.0; 2], vec![0.0; 1]]).is_err());
    assert!(VertexField::from_channels([vec![0.0; 2], vec![0.0; 2], vec![0.0; 2]]).is_ok());
}

#[test]
fn field_arithmetic() {
    let mut a = VertexField::from_points(&[DVec3::ONE, DVec3::X]);
    let b = VertexField::from_points(&[DVec3::Y, DVec3::Z]);
    a.axpy(2.0, &b).unwrap();
    assert_eq!(a.point(0), DVec3::new(1.0, 3.0, 1.0));
    assert_eq!(a.point(1), DVec3::new(1.0, 0.0, 2.0));
    assert_eq!(b.dot(&b).unwrap(), 2.0);
    assert!((b.norm() - 2f64.sqrt()).abs() < 1e-15);
    assert_eq!(b.scaled(3.0).point(1), DVec3::new(0.0, 0.0, 3.0));
    assert!(a.axpy(1.0, &VertexField::zeros(3)).is_err());
}

#[test]
fn gather_scatter_are_adjoint() {
    let map = [0u32, 2, 2, 1, 0];
    let u = VertexField::from_points(&[DVec3::new(1.0, 2.0, 3.0), DVec3::X, DVec3::new(0.5, -1.0, 4.0)]);
    let g = VertexField::from_points(&[
        DVec3::new(0.1, 0.2, 0.3),
        DVec3::new(-1.0, 2.0, 0.0),
        DVec3::new(3.0, 1.0, -1.0),
        DVec3::new(0.0, 0.0, 7.0),
        DVec3::new(2.0, 2.0, 2.0),
    ]);
    let lhs = u.gather(&map).unwrap().dot(&g).unwrap();
    let rhs = u.dot(&g.scatter_add(&map, 3).unwrap()).unwrap();
    assert!((lhs - rhs).abs() < 1e-12);
    assert!(u.gather(&[3]).is_err());
}

#[test]
fn single_precision_rounding() {
    let mut field = VertexField::from_points(&[DVec3::splat(0.1)]);
    field.round_to(&ExecutionContext::serial().with_precision(Precision::Single));
    assert_eq!(field.x[0], 0.1f32 as f64);
    assert_ne!(field.x[0], 0.1);
}

// ─── Weld Tests ───────────────────────────────────────────────

#[test]
fn weld_recovers_unwelded_tetrahedron() {
    let tet = tetrahedron();
    let split = unweld(&tet);
    assert_eq!(split.vertex_count(), 12);

    let welded = weld(&split, &ExecutionContext::serial()).unwrap();
    assert_eq!(welded.mesh.vertex_count(), 4);
    assert_eq!(welded.map.original_count(), 12);
    assert_eq!(welded.map.collapsed(), 8);

    // Every welded face still covers the same three corner positions
    for (t, tri) in welded.mesh.faces.iter().enumerate() {
        for (k, &v) in tri.iter().enumerate() {
            assert_eq!(welded.mesh.positions[v as usize], split.triangle_positions(t)[k]);
        }
    }
}

#[test]
fn weld_uses_first_occurrence_order() {
    let positions = vec![DVec3::Y, DVec3::X, DVec3::Y, DVec3::Z, DVec3::X];
    let mesh = TriangleMesh::new(positions, vec![[0, 1, 3], [2, 3, 4]]).unwrap();
    let welded = weld(&mesh, &ExecutionContext::serial()).unwrap();

    assert_eq!(welded.mesh.positions, vec![DVec3::Y, DVec3::X, DVec3::Z]);
    assert_eq!(welded.map.inverse(), &[0, 1, 0, 2, 1]);
    assert_eq!(welded.map.representatives(), &[0, 1, 3]);
    assert_eq!(welded.mesh.faces, vec![[0, 1, 2], [0, 2, 1]]);
    assert_eq!(
        welded.map.welded_index(VertexId::from(4)),
        Some(VertexId::from(1))
    );
    assert_eq!(
        welded.map.representative(VertexId::from(2)),
        Some(VertexId::from(3))
    );
    assert_eq!(welded.map.welded_index(VertexId::from(5)), None);
}

#[test]
fn weld_merges_one_shared_pair_across_two_faces() {
    // Vertices 1 and 3 are bit-identical copies, each used by a different face
    let positions = vec![DVec3::X, DVec3::Y, DVec3::Z, DVec3::Y, DVec3::ZERO];
    let mesh = TriangleMesh::new(positions, vec![[0, 1, 2], [3, 4, 2]]).unwrap();
    let welded = weld(&mesh, &ExecutionContext::serial()).unwrap();

    assert_eq!(welded.mesh.vertex_count(), mesh.vertex_count() - 1);
    assert_eq!(welded.map.collapsed(), 1);
    assert_eq!(welded.map.inverse(), &[0, 1, 2, 1, 3]);
    assert_eq!(welded.mesh.faces, vec![[0, 1, 2], [1, 3, 2]]);
    for t in 0..mesh.face_count() {
        assert_eq!(welded.mesh.triangle_positions(t), mesh.triangle_positions(t));
    }
}

#[test]
fn weld_of_unique_mesh_is_identity() {
    let mesh = quad_grid(3, 2, 1.0, 1.0);
    let welded = weld(&mesh, &ExecutionContext::serial()).unwrap();
    assert!(welded.map.is_identity());
    assert_eq!(welded.mesh, mesh);
}

#[test]
fn weld_is_idempotent() {
    let ctx = ExecutionContext::serial();
    let once = weld(&uv_sphere(1.0, 4, 6), &ctx).unwrap();
    let twice = weld(&once.mesh, &ctx).unwrap();
    assert!(twice.map.is_identity());
    assert_eq!(twice.mesh, once.mesh);
}

#[test]
fn weld_folds_signed_zero() {
    let positions = vec![
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(-0.0, 1.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
    ];
    let mesh = TriangleMesh::new(positions, vec![[0, 2, 1]]).unwrap();
    let welded = weld(&mesh, &ExecutionContext::serial()).unwrap();
    assert_eq!(welded.mesh.vertex_count(), 2);
}

#[test]
fn weld_keeps_nearly_coincident_vertices() {
    let positions = vec![DVec3::X, DVec3::new(1.0 + 1e-15, 0.0, 0.0), DVec3::Y];
    let mesh = TriangleMesh::new(positions, vec![[0, 1, 2]]).unwrap();
    let welded = weld(&mesh, &ExecutionContext::serial()).unwrap();
    assert_eq!(welded.mesh.vertex_count(), 3);
}

#[test]
fn weld_rejects_bad_index() {
    let mesh = TriangleMesh {
        positions: vec![DVec3::ZERO; 2],
        faces: vec![[0, 1, 2]],
    };
    let err = weld(&mesh, &ExecutionContext::serial()).unwrap_err();
    assert!(matches!(err, DiffShapeError::FaceIndexOutOfRange { .. }));
}

#[test]
fn weld_keeps_isolated_vertices() {
    let mut mesh = unit_square();
    mesh.positions.push(DVec3::splat(5.0));
    let welded = weld(&mesh, &ExecutionContext::serial()).unwrap();
    assert_eq!(welded.mesh.vertex_count(), 5);
}

#[test]
fn weld_empty_mesh() {
    let welded = weld(&TriangleMesh::default(), &ExecutionContext::serial()).unwrap();
    assert_eq!(welded.mesh.vertex_count(), 0);
    assert!(welded.map.is_identity());
}

#[test]
fn expand_restores_original_layout() {
    let split = unweld(&unit_square());
    let welded = weld(&split, &ExecutionContext::serial()).unwrap();
    let unique = VertexField::from_points(&welded.mesh.positions);
    let expanded = welded.map.expand(&unique).unwrap();
    assert_eq!(expanded.to_points(), split.positions);
    assert_eq!(
        welded.map.expand_points(&welded.mesh.positions).unwrap(),
        split.positions
    );
    assert!(welded.map.expand(&VertexField::zeros(2)).is_err());
    assert!(welded.map.reduce(&VertexField::zeros(2)).is_err());
}

#[test]
fn reduce_sums_split_copies() {
    let split = unweld(&unit_square());
    let welded = weld(&split, &ExecutionContext::serial()).unwrap();
    let ones = VertexField::from_points(&vec![DVec3::ONE; split.vertex_count()]);
    let reduced = welded.map.reduce(&ones).unwrap();
    // Vertices 0 and 2 sit on the diagonal and appear in both faces
    assert_eq!(reduced.x, vec![2.0, 1.0, 2.0, 1.0]);
}

#[test]
fn weld_parallel_matches_serial() {
    let mesh = uv_sphere(2.0, 8, 12);
    let a = weld(&mesh, &ExecutionContext::serial()).unwrap();
    let b = weld(&mesh, &ExecutionContext::parallel()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn weld_map_serde_roundtrip() {
    let welded = weld(&uv_sphere(1.0, 3, 4), &ExecutionContext::serial()).unwrap();
    let json = serde_json::to_string(&welded.map).unwrap();
    let back: WeldMap = serde_json::from_str(&json).unwrap();
    assert_eq!(back, welded.map);
}

// ─── Normal Computation Tests ─────────────────────────────────

#[test]
fn flat_grid_normals_point_up() {
    let mesh = quad_grid(4, 4, 2.0, 2.0);
    let normals = compute_normals(&mesh, &ExecutionContext::serial()).unwrap();
    for n in normals.face.iter().chain(&normals.vertex) {
        assert!(close(*n, DVec3::Z, 1e-12), "normal {n:?}");
    }
}

#[test]
fn unit_square_vertex_normals_are_identical() {
    let normals = compute_normals(&unit_square(), &ExecutionContext::serial()).unwrap();
    assert_eq!(normals.vertex.len(), 4);
    for n in &normals.vertex {
        assert!(close(*n, normals.vertex[0], 1e-15), "normal {n:?}");
    }
    assert!(close(normals.vertex[0], DVec3::Z, 1e-12));
}

#[test]
fn tetrahedron_corner_normal() {
    let normals = compute_normals(&tetrahedron(), &ExecutionContext::serial()).unwrap();
    assert!(close(normals.face[0], -DVec3::Z, 1e-12));
    assert!(close(normals.face[3], DVec3::ONE.normalize(), 1e-12));
    // Three right angles at the origin weight the axis normals equally
    assert!(close(normals.vertex[0], -DVec3::ONE.normalize(), 1e-12));
    for n in &normals.vertex {
        assert!((n.length() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn sphere_normals_point_outward() {
    let ctx = ExecutionContext::serial();
    let welded = weld(&uv_sphere(1.5, 8, 12), &ctx).unwrap();
    let mesh = &welded.mesh;
    let normals = compute_normals(mesh, &ctx).unwrap();

    for (t, n) in normals.face.iter().enumerate() {
        let [p0, p1, p2] = mesh.triangle_positions(t);
        assert!(n.dot(p0 + p1 + p2) > 0.0, "face {t} points inward");
    }
    for (p, n) in mesh.positions.iter().zip(&normals.vertex) {
        assert!(n.dot(p.normalize()) > 0.95);
    }
}

#[test]
fn angle_weighting_ignores_subdivision() {
    // Splitting one face around the apex keeps the apex's total angle per face
    let apex = DVec3::ZERO;
    let positions = vec![
        apex,
        DVec3::X,
        DVec3::Y,
        DVec3::new(-1.0, 0.0, 1.0),
        DVec3::new(-0.5, 0.5, 0.5),
    ];
    let ctx = ExecutionContext::serial();
    let coarse = [[0u32, 1, 2], [0, 2, 3]];
    let fine = [[0u32, 1, 2], [0, 2, 4], [0, 4, 3]];
    let fc = face_normals(&positions, &coarse, &ctx).unwrap();
    let ff = face_normals(&positions, &fine, &ctx).unwrap();
    let nc = vertex_normals(&positions, &coarse, &fc, &ctx).unwrap();
    let nf = vertex_normals(&positions, &fine, &ff, &ctx).unwrap();
    assert!(close(nc[0], nf[0], 1e-12));
}

#[test]
fn isolated_vertex_gets_zero_normal() {
    let mut mesh = unit_square();
    mesh.positions.push(DVec3::splat(3.0));
    let normals = compute_normals(&mesh, &ExecutionContext::serial()).unwrap();
    assert_eq!(normals.vertex[4], DVec3::ZERO);
}

#[test]
fn cancelling_faces_give_zero_normal() {
    let positions = vec![DVec3::ZERO, DVec3::X, DVec3::Y];
    let faces = [[0u32, 1, 2], [0, 2, 1]];
    let ctx = ExecutionContext::serial();
    let fnormals = face_normals(&positions, &faces, &ctx).unwrap();
    let vnormals = vertex_normals(&positions, &faces, &fnormals, &ctx).unwrap();
    assert!(vnormals.iter().all(|n| *n == DVec3::ZERO));
}

#[test]
fn zero_area_face_yields_nan() {
    let positions = vec![DVec3::ZERO, DVec3::X, DVec3::new(2.0, 0.0, 0.0), DVec3::Y];
    let faces = [[0u32, 1, 2], [0, 1, 3]];
    let ctx = ExecutionContext::serial();
    let fnormals = face_normals(&positions, &faces, &ctx).unwrap();
    assert!(!fnormals[0].is_finite());
    assert!(close(fnormals[1], DVec3::Z, 1e-12));

    let vnormals = vertex_normals(&positions, &faces, &fnormals, &ctx).unwrap();
    assert!(!vnormals[2].is_finite());
    assert!(close(vnormals[3], DVec3::Z, 1e-12));
}

#[test]
fn normal_inputs_checked() {
    let ctx = ExecutionContext::serial();
    let positions = vec![DVec3::ZERO, DVec3::X, DVec3::Y];
    assert!(face_normals(&positions, &[[0, 1, 3]], &ctx).is_err());
    let err = vertex_normals(&positions, &[[0, 1, 2]], &[], &ctx).unwrap_err();
    assert!(matches!(err, DiffShapeError::DimensionMismatch { .. }));
}

#[test]
fn single_precision_normals() {
    let ctx = ExecutionContext::serial().with_precision(Precision::Single);
    let welded = weld(&uv_sphere(1.0, 5, 7), &ctx).unwrap();
    let normals = compute_normals(&welded.mesh, &ctx).unwrap();
    for n in &normals.vertex {
        assert_eq!(n.x, n.x as f32 as f64);
        assert_eq!(n.y, n.y as f32 as f64);
        assert_eq!(n.z, n.z as f32 as f64);
    }
}

#[test]
fn normals_parallel_matches_serial() {
    let mesh = weld(&uv_sphere(1.0, 10, 16), &ExecutionContext::serial()).unwrap().mesh;
    let a = compute_normals(&mesh, &ExecutionContext::serial()).unwrap();
    let b = compute_normals(&mesh, &ExecutionContext::parallel()).unwrap();
    assert_eq!(a, b);
}

// ─── Topology Tests ───────────────────────────────────────────

#[test]
fn tetrahedron_topology() {
    let topo = Topology::from_mesh(&tetrahedron()).unwrap();
    assert_eq!(topo.edge_count(), 6);
    assert_eq!(topo.degrees(), vec![3, 3, 3, 3]);
    assert!(topo.is_closed());
    assert_eq!(topo.connected_components(), 1);
    assert_eq!(topo.euler_characteristic(4), 2);
    assert_eq!(topo.non_manifold_edge_count(), 0);
}

#[test]
fn square_topology() {
    let topo = Topology::from_mesh(&unit_square()).unwrap();
    assert_eq!(topo.edges, vec![[0, 1], [0, 2], [0, 3], [1, 2], [2, 3]]);
    assert_eq!(topo.boundary_edge_count(), 4);
    assert_eq!(topo.neighbors[0], vec![1, 2, 3]);
    assert_eq!(topo.degree(1), 2);
    assert_eq!(topo.vertex_faces[2], vec![0, 1]);
}

#[test]
fn quad_grid_edge_count() {
    let mesh = quad_grid(2, 2, 1.0, 1.0);
    let topo = Topology::from_mesh(&mesh).unwrap();
    // 12 axis-aligned edges plus one diagonal per quad
    assert_eq!(topo.edge_count(), 16);
    assert!(!topo.is_closed());
}

#[test]
fn welded_sphere_is_closed() {
    let mesh = uv_sphere(1.0, 4, 6);
    assert_eq!(mesh.vertex_count(), 35);
    assert!(!Topology::from_mesh(&mesh).unwrap().is_closed());

    let welded = weld(&mesh, &ExecutionContext::serial()).unwrap();
    assert_eq!(welded.mesh.vertex_count(), 20);
    assert_eq!(welded.mesh.face_count(), 36);
    let topo = Topology::from_mesh(&welded.mesh).unwrap();
    assert!(topo.is_closed());
    assert_eq!(topo.edge_count(), 54);
    assert_eq!(topo.euler_characteristic(welded.mesh.face_count()), 2);
}

#[test]
fn components_and_isolated_vertices() {
    let faces = [[0u32, 1, 2], [3, 4, 5]];
    let topo = Topology::build(&faces, 7).unwrap();
    assert_eq!(topo.connected_components(), 3);
    assert_eq!(topo.isolated_vertices(), vec![6]);
    assert_eq!(topo.degree(6), 0);
}

#[test]
fn degenerate_edge_not_recorded() {
    let topo = Topology::build(&[[3, 3, 5]], 6).unwrap();
    assert_eq!(topo.edges, vec![[3, 5]]);
    assert_eq!(topo.degree(3), 1);
}

#[test]
fn topology_rejects_bad_index() {
    assert!(Topology::build(&[[0, 1, 9]], 3).is_err());
}

// ─── Property Tests ───────────────────────────────────────────

proptest! {
    #[test]
    fn weld_unweld_grid(cols in 1usize..6, rows in 1usize..6) {
        let grid = quad_grid(cols, rows, 1.0, 1.0);
        let welded = weld(&unweld(&grid), &ExecutionContext::serial()).unwrap();
        prop_assert_eq!(welded.mesh.vertex_count(), grid.vertex_count());
        prop_assert_eq!(welded.mesh.face_count(), grid.face_count());
    }

    #[test]
    fn expand_reduce_adjoint(values in prop::collection::vec(-10.0f64..10.0, 36)) {
        let welded = weld(&unweld(&tetrahedron()), &ExecutionContext::serial()).unwrap();
        let (u_vals, g_vals) = values.split_at(12);
        let u = VertexField::from_channels([
            u_vals[0..4].to_vec(),
            u_vals[4..8].to_vec(),
            u_vals[8..12].to_vec(),
        ]).unwrap();
        let g = VertexField::from_channels([
            g_vals[0..12].to_vec(),
            g_vals[12..24].to_vec(),
            g_vals[0..12].iter().map(|v| -v).collect(),
        ]).unwrap();
        let lhs = welded.map.expand(&u).unwrap().dot(&g).unwrap();
        let rhs = u.dot(&welded.map.reduce(&g).unwrap()).unwrap();
        prop_assert!((lhs - rhs).abs() < 1e-9 * (1.0 + lhs.abs()));
    }
}
