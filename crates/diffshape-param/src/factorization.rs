//! Cached sparse Cholesky factorization of the system matrix.
//!
//! Factorized once when constructed, then solved against every iteration.
//! The object is immutable after construction; a topology change requires
//! building a new one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use diffshape_math::{CsrMatrix, ExecutionContext, FaerSolver, SparseSolver};
use diffshape_mesh::VertexField;
use diffshape_types::constants::SYMMETRY_TOLERANCE;
use diffshape_types::{DiffShapeError, DiffShapeResult};

/// A symmetric positive-definite matrix together with its LLᵀ factors.
pub struct CachedFactorization {
    matrix: CsrMatrix,
    solver: FaerSolver,
    /// Number of right-hand sides solved so far.
    solves: AtomicUsize,
}

impl std::fmt::Debug for CachedFactorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedFactorization")
            .field("dimension", &self.matrix.rows)
            .field("nnz", &self.matrix.nnz())
            .field("solves", &self.solve_count())
            .finish()
    }
}

impl CachedFactorization {
    /// Factorizes `matrix`.
    ///
    /// Fails with [`DiffShapeError::NotPositiveDefinite`] if the matrix is
    /// asymmetric, has non-finite entries or is not numerically positive
    /// definite.
    pub fn new(matrix: CsrMatrix) -> DiffShapeResult<Self> {
        if !matrix.is_square() {
            return Err(DiffShapeError::dimension("system matrix columns", matrix.rows, matrix.cols));
        }
        let defect = matrix.symmetry_defect();
        if defect > SYMMETRY_TOLERANCE {
            return Err(DiffShapeError::NotPositiveDefinite(format!(
                "matrix is not symmetric (defect {defect:e})"
            )));
        }

        let span = tracing::info_span!("factorize", n = matrix.rows, nnz = matrix.nnz());
        let _guard = span.enter();
        let start = Instant::now();

        let mut solver = FaerSolver::new();
        solver.factorize(&matrix)?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
            "system matrix factorized"
        );

        Ok(Self {
            matrix,
            solver,
            solves: AtomicUsize::new(0),
        })
    }

    /// Dimension N of the N×N matrix.
    pub fn dimension(&self) -> usize {
        self.matrix.rows
    }

    /// The factorized matrix.
    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    /// Number of right-hand sides solved since construction.
    pub fn solve_count(&self) -> usize {
        self.solves.load(Ordering::Relaxed)
    }

    /// Solves `M x = b` for one right-hand side.
    pub fn solve(&self, rhs: &[f64]) -> DiffShapeResult<Vec<f64>> {
        let mut x = vec![0.0; rhs.len()];
        self.solver.solve(rhs, &mut x)?;
        self.solves.fetch_add(1, Ordering::Relaxed);
        Ok(x)
    }

    /// Solves `M X = B` with the three channels of `rhs` as one batch.
    pub fn solve_field(&self, rhs: &VertexField) -> DiffShapeResult<VertexField> {
        self.check_field(rhs)?;
        let mut columns = rhs.clone().into_channels();
        self.solver.solve_columns(&mut columns)?;
        self.solves.fetch_add(columns.len(), Ordering::Relaxed);
        tracing::trace!(n = rhs.len(), "batched solve");
        VertexField::from_channels(columns)
    }

    /// Computes `M X` per channel.
    pub fn multiply_field(
        &self,
        x: &VertexField,
        ctx: &ExecutionContext,
    ) -> DiffShapeResult<VertexField> {
        self.check_field(x)?;
        let channels = x.channels();
        let [px, py, pz] = ctx.map_channels(|c| self.matrix.mul_vec(channels[c]));
        VertexField::from_channels([px?, py?, pz?])
    }

    fn check_field(&self, field: &VertexField) -> DiffShapeResult<()> {
        if field.len() != self.dimension() {
            return Err(DiffShapeError::dimension(
                "vertex field",
                self.dimension(),
                field.len(),
            ));
        }
        Ok(())
    }
}
