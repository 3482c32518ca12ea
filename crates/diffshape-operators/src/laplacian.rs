//! Discrete Laplacian construction.
//!
//! Both weightings produce a symmetric V×V matrix with non-positive
//! off-diagonals and a diagonal equal to the negated off-diagonal row sum,
//! so `L · 1 = 0` and `L` is positive semi-definite.

use serde::{Deserialize, Serialize};

use diffshape_math::{CsrMatrix, ExecutionContext};
use diffshape_mesh::mesh::check_face_indices;
use diffshape_mesh::{DVec3, Topology, TriangleMesh};
use diffshape_types::constants::HERON_PRODUCT_FLOOR;
use diffshape_types::DiffShapeResult;

/// Laplacian weighting mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaplacianKind {
    /// `-1` per undirected edge, degree on the diagonal. Depends on
    /// connectivity only.
    #[default]
    Uniform,
    /// Summed cotangents of the angles opposite each edge. Depends on the
    /// positions at build time.
    Cotangent,
}

impl LaplacianKind {
    /// Returns the config name of this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Cotangent => "cotangent",
        }
    }
}

impl std::fmt::Display for LaplacianKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds the Laplacian of `mesh` with the selected weighting.
pub fn build_laplacian(
    mesh: &TriangleMesh,
    kind: LaplacianKind,
    ctx: &ExecutionContext,
) -> DiffShapeResult<CsrMatrix> {
    let laplacian = match kind {
        LaplacianKind::Uniform => uniform_laplacian(&mesh.faces, mesh.vertex_count())?,
        LaplacianKind::Cotangent => cotangent_laplacian(&mesh.positions, &mesh.faces, ctx)?,
    };
    tracing::debug!(
        kind = kind.name(),
        vertices = laplacian.rows,
        nnz = laplacian.nnz(),
        "built Laplacian"
    );
    Ok(laplacian)
}

/// Combinatorial Laplacian: `L[i][j] = -1` for every undirected edge and
/// `L[i][i]` = number of distinct neighbors of `i`.
pub fn uniform_laplacian(faces: &[[u32; 3]], vertex_count: usize) -> DiffShapeResult<CsrMatrix> {
    let topology = Topology::build(faces, vertex_count)?;

    let mut triplets: Vec<(usize, usize, f64)> =
        Vec::with_capacity(vertex_count + topology.edge_count() * 2);
    for (i, neighbors) in topology.neighbors.iter().enumerate() {
        if !neighbors.is_empty() {
            triplets.push((i, i, neighbors.len() as f64));
        }
        triplets.extend(neighbors.iter().map(|&j| (i, j as usize, -1.0)));
    }

    Ok(CsrMatrix::from_triplets(vertex_count, vertex_count, &triplets))
}

/// Cotangents of the interior angles at `p0`, `p1`, `p2`.
///
/// Side lengths `a`, `b`, `c` are opposite `p0`, `p1`, `p2`. The Heron
/// product is floored at [`HERON_PRODUCT_FLOOR`] before the square root so
/// slivers give large finite weights instead of NaN.
pub fn triangle_cotangents(p0: DVec3, p1: DVec3, p2: DVec3) -> [f64; 3] {
    let a = (p1 - p2).length();
    let b = (p0 - p2).length();
    let c = (p0 - p1).length();

    let s = 0.5 * (a + b + c);
    let area = (s * (s - a) * (s - b) * (s - c))
        .max(HERON_PRODUCT_FLOOR)
        .sqrt();

    let (a2, b2, c2) = (a * a, b * b, c * c);
    let denom = 4.0 * area;
    [
        (b2 + c2 - a2) / denom,
        (a2 + c2 - b2) / denom,
        (a2 + b2 - c2) / denom,
    ]
}

/// Cotangent Laplacian: for each face the cotangent of the angle at a
/// corner weights the opposite edge, summed over incident faces.
pub fn cotangent_laplacian(
    positions: &[DVec3],
    faces: &[[u32; 3]],
    ctx: &ExecutionContext,
) -> DiffShapeResult<CsrMatrix> {
    check_face_indices(positions.len(), faces)?;
    let n = positions.len();

    let weights = ctx.map_indexed(faces.len(), |t| {
        let [a, b, c] = faces[t];
        triangle_cotangents(positions[a as usize], positions[b as usize], positions[c as usize])
    });

    let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(faces.len() * 12);
    for (&[v0, v1, v2], cot) in faces.iter().zip(&weights) {
        // The angle at each corner weights the edge across from it
        let opposite = [(v1, v2), (v2, v0), (v0, v1)];
        for (&(i, j), &w) in opposite.iter().zip(cot) {
            let (i, j) = (i as usize, j as usize);
            triplets.push((i, j, -w));
            triplets.push((j, i, -w));
            triplets.push((i, i, w));
            triplets.push((j, j, w));
        }
    }

    let non_finite = weights.iter().flatten().filter(|w| !w.is_finite()).count();
    if non_finite > 0 {
        tracing::warn!(non_finite, "cotangent weights are not finite");
    }

    Ok(CsrMatrix::from_triplets(n, n, &triplets))
}
