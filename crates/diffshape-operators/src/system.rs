//! System matrix assembly.
//!
//! Builds `M = I + λ·L`. For a positive semi-definite `L` and `λ ≥ 0` the
//! result is symmetric positive definite; at `λ = 0` it is the identity.

use diffshape_math::{CsrMatrix, ExecutionContext};
use diffshape_mesh::TriangleMesh;
use diffshape_types::{DiffShapeError, DiffShapeResult};

use crate::laplacian::{build_laplacian, LaplacianKind};

/// Fails with [`DiffShapeError::InvalidConfig`] unless `lambda` is finite
/// and non-negative.
pub fn check_lambda(lambda: f64) -> DiffShapeResult<()> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(DiffShapeError::InvalidConfig(format!(
            "lambda must be finite and non-negative, got {lambda}"
        )));
    }
    Ok(())
}

/// Assemble `M = I + λ·L`, coalescing repeated entries.
pub fn assemble_system_matrix(laplacian: &CsrMatrix, lambda: f64) -> DiffShapeResult<CsrMatrix> {
    check_lambda(lambda)?;
    if !laplacian.is_square() {
        return Err(DiffShapeError::dimension(
            "Laplacian columns",
            laplacian.rows,
            laplacian.cols,
        ));
    }
    if lambda == 0.0 {
        tracing::warn!("lambda is 0; the system matrix is the identity");
    }

    let n = laplacian.rows;
    let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(n + laplacian.nnz());
    triplets.extend((0..n).map(|i| (i, i, 1.0)));
    triplets.extend(
        laplacian
            .triplets()
            .into_iter()
            .map(|(r, c, v)| (r, c, lambda * v)),
    );

    let matrix = CsrMatrix::from_triplets(n, n, &triplets);
    tracing::debug!(n, nnz = matrix.nnz(), lambda, "assembled system matrix");
    Ok(matrix)
}

/// Builds the Laplacian of `mesh` and returns `I + λ·L` in one call.
pub fn compute_matrix(
    mesh: &TriangleMesh,
    kind: LaplacianKind,
    lambda: f64,
    ctx: &ExecutionContext,
) -> DiffShapeResult<CsrMatrix> {
    check_lambda(lambda)?;
    let laplacian = build_laplacian(mesh, kind, ctx)?;
    assemble_system_matrix(&laplacian, lambda)
}
