//! Procedural mesh generators for benchmarks and testing.
//!
//! These generators produce deterministic, resolution-configurable meshes
//! with counter-clockwise (outward) winding.

use glam::DVec3;

use crate::mesh::TriangleMesh;

/// Regular tetrahedron corner at the origin with unit legs along the axes.
///
/// Closed, 4 vertices, 6 edges, every vertex of degree 3.
pub fn tetrahedron() -> TriangleMesh {
    TriangleMesh {
        positions: vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z],
        faces: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    }
}

/// Unit square in the XY plane split along its `0-2` diagonal.
pub fn unit_square() -> TriangleMesh {
    TriangleMesh {
        positions: vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ],
        faces: vec![[0, 1, 2], [0, 2, 3]],
    }
}

/// Generates a flat rectangular quad grid in the XY plane.
///
/// The grid spans `[-width/2, width/2]` in X and `[-height/2, height/2]` in Y,
/// centered at the origin at Z=0, with normals facing +Z.
///
/// # Arguments
/// - `cols` — Number of quads along X (vertex count = cols + 1).
/// - `rows` — Number of quads along Y (vertex count = rows + 1).
///
/// # Example
/// ```
/// use diffshape_mesh::generators::quad_grid;
/// let mesh = quad_grid(2, 2, 1.0, 1.0);
/// assert_eq!(mesh.vertex_count(), 9);  // 3×3 vertices
/// assert_eq!(mesh.face_count(), 8); // 2×2 quads × 2 tris each
/// ```
pub fn quad_grid(cols: usize, rows: usize, width: f64, height: f64) -> TriangleMesh {
    let verts_x = cols + 1;
    let verts_y = rows + 1;

    let half_w = width / 2.0;
    let half_h = height / 2.0;

    let mut positions = Vec::with_capacity(verts_x * verts_y);
    for j in 0..verts_y {
        for i in 0..verts_x {
            let u = i as f64 / cols.max(1) as f64;
            let v = j as f64 / rows.max(1) as f64;
            // Top to bottom
            positions.push(DVec3::new(-half_w + u * width, half_h - v * height, 0.0));
        }
    }

    let mut faces = Vec::with_capacity(cols * rows * 2);
    for j in 0..rows {
        for i in 0..cols {
            let top_left = (j * verts_x + i) as u32;
            let top_right = top_left + 1;
            let bot_left = top_left + verts_x as u32;
            let bot_right = bot_left + 1;

            faces.push([top_left, bot_left, top_right]);
            faces.push([top_right, bot_left, bot_right]);
        }
    }

    TriangleMesh { positions, faces }
}

/// Generates a UV sphere centered at the origin, Y up.
///
/// Like a texture-mapped export, the sphere carries seams: the last
/// longitude column repeats the first, and each pole is repeated once per
/// column. The duplicates are bitwise copies (up to the sign of zero) so
/// that welding collapses them to `(stacks - 1) * slices + 2` vertices.
///
/// # Arguments
/// - `radius` — Sphere radius.
/// - `stacks` — Number of horizontal slices (latitude divisions), at least 2.
/// - `slices` — Number of vertical slices (longitude divisions), at least 3.
pub fn uv_sphere(radius: f64, stacks: usize, slices: usize) -> TriangleMesh {
    let stacks = stacks.max(2);
    let slices = slices.max(3);

    let mut positions = Vec::with_capacity((stacks + 1) * (slices + 1));
    for i in 0..=stacks {
        let (sin_phi, cos_phi) = if i == 0 {
            (0.0, 1.0)
        } else if i == stacks {
            (0.0, -1.0)
        } else {
            (std::f64::consts::PI * i as f64 / stacks as f64).sin_cos()
        };

        for j in 0..=slices {
            // Wrap so the seam column is an exact copy of column 0
            let theta = 2.0 * std::f64::consts::PI * (j % slices) as f64 / slices as f64;
            let (sin_theta, cos_theta) = theta.sin_cos();
            positions.push(
                radius * DVec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta),
            );
        }
    }

    let mut faces = Vec::with_capacity(stacks * slices * 2);
    for i in 0..stacks {
        for j in 0..slices {
            let a = (i * (slices + 1) + j) as u32;
            let b = a + (slices + 1) as u32;

            // Skip degenerate triangles at poles
            if i != 0 {
                faces.push([a, a + 1, b]);
            }
            if i != stacks - 1 {
                faces.push([a + 1, b + 1, b]);
            }
        }
    }

    TriangleMesh { positions, faces }
}

/// Gives every face corner its own vertex, the way a per-face-attribute
/// export lays out a mesh. Welding the result recovers the input's
/// connectivity.
pub fn unweld(mesh: &TriangleMesh) -> TriangleMesh {
    let mut positions = Vec::with_capacity(mesh.faces.len() * 3);
    let mut faces = Vec::with_capacity(mesh.faces.len());
    for tri in &mesh.faces {
        let base = positions.len() as u32;
        positions.extend(tri.iter().map(|&v| mesh.positions[v as usize]));
        faces.push([base, base + 1, base + 2]);
    }
    TriangleMesh { positions, faces }
}
