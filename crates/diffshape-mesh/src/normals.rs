//! Face and vertex normals.
//!
//! Vertex normals are angle-weighted: each triangle corner adds its face
//! normal scaled by the interior angle at that corner. The result does not
//! change when an incident triangle is subdivided, which area weighting and
//! plain averaging cannot offer at irregular valences.

use glam::DVec3;

use diffshape_math::ExecutionContext;
use diffshape_types::constants::ISOLATED_NORMAL_EPSILON;
use diffshape_types::{DiffShapeError, DiffShapeResult};

use crate::mesh::{check_face_indices, TriangleMesh};

/// Face and vertex normals of one mesh state.
#[derive(Debug, Clone, PartialEq)]
pub struct Normals {
    /// One unit normal per face.
    pub face: Vec<DVec3>,
    /// One unit normal per vertex.
    pub vertex: Vec<DVec3>,
}

#[inline]
fn round_vec(ctx: &ExecutionContext, v: DVec3) -> DVec3 {
    DVec3::new(ctx.round(v.x), ctx.round(v.y), ctx.round(v.z))
}

/// Per-face unit normals `normalize((p1 - p0) × (p2 - p0))`.
///
/// Zero-area triangles yield a NaN normal; they are not repaired here.
pub fn face_normals(
    positions: &[DVec3],
    faces: &[[u32; 3]],
    ctx: &ExecutionContext,
) -> DiffShapeResult<Vec<DVec3>> {
    check_face_indices(positions.len(), faces)?;

    let normals = ctx.map_indexed(faces.len(), |t| {
        let [a, b, c] = faces[t];
        let p0 = positions[a as usize];
        let p1 = positions[b as usize];
        let p2 = positions[c as usize];
        let n = (p1 - p0).cross(p2 - p0);
        round_vec(ctx, n / n.length())
    });

    let degenerate = normals.iter().filter(|n| !n.is_finite()).count();
    if degenerate > 0 {
        tracing::warn!(degenerate, "zero-area faces produced non-finite normals");
    }
    Ok(normals)
}

/// Interior angle at each corner of triangle `[p0, p1, p2]`.
///
/// The cosine is clamped to `[-1, 1]` before `acos`: unit vectors can
/// overshoot slightly.
#[inline]
fn corner_angles(p: [DVec3; 3]) -> [f64; 3] {
    let mut angles = [0.0; 3];
    for (i, angle) in angles.iter_mut().enumerate() {
        let e0 = p[(i + 1) % 3] - p[i];
        let e1 = p[(i + 2) % 3] - p[i];
        let cos = (e0 / e0.length()).dot(e1 / e1.length());
        *angle = cos.clamp(-1.0, 1.0).acos();
    }
    angles
}

/// Angle-weighted per-vertex unit normals.
///
/// `face_normals` must hold one normal per face (see [`face_normals`]).
/// Vertices referenced by no face get a zero normal.
pub fn vertex_normals(
    positions: &[DVec3],
    faces: &[[u32; 3]],
    face_normals: &[DVec3],
    ctx: &ExecutionContext,
) -> DiffShapeResult<Vec<DVec3>> {
    check_face_indices(positions.len(), faces)?;
    if face_normals.len() != faces.len() {
        return Err(DiffShapeError::dimension(
            "face normals",
            faces.len(),
            face_normals.len(),
        ));
    }

    // Per-corner contributions, computed as one batch
    let contributions = ctx.map_indexed(faces.len(), |t| {
        let [a, b, c] = faces[t];
        let angles = corner_angles([
            positions[a as usize],
            positions[b as usize],
            positions[c as usize],
        ]);
        angles.map(|angle| face_normals[t] * angle)
    });

    // Scatter-add onto vertices
    let mut accum = vec![DVec3::ZERO; positions.len()];
    for (tri, corners) in faces.iter().zip(&contributions) {
        for (&v, &n) in tri.iter().zip(corners) {
            accum[v as usize] += n;
        }
    }

    // NaN accumulators fall through to the division and stay NaN.
    let normals = ctx.map_indexed(accum.len(), |i| {
        let n = accum[i];
        let len_sq = n.length_squared();
        if len_sq <= ISOLATED_NORMAL_EPSILON {
            DVec3::ZERO
        } else {
            round_vec(ctx, n / len_sq.sqrt())
        }
    });
    Ok(normals)
}

/// Face and vertex normals of `mesh` in one call.
pub fn compute_normals(mesh: &TriangleMesh, ctx: &ExecutionContext) -> DiffShapeResult<Normals> {
    let face = face_normals(&mesh.positions, &mesh.faces, ctx)?;
    let vertex = vertex_normals(&mesh.positions, &mesh.faces, &face, ctx)?;
    Ok(Normals { face, vertex })
}
