//! Sparse Cholesky solver backed by `faer`.
//!
//! Implements the [`SparseSolver`] trait using faer's supernodal LLᵀ
//! factorization, entirely in f64.
//!
//! ## Workflow
//! 1. `factorize(matrix)` — converts CSR→CSC, computes symbolic + numeric LLᵀ
//! 2. `solve(rhs, solution)` — forward/backward substitution (cached factorization)
//! 3. Repeat `solve()` / `solve_columns()` with different RHS without re-factorizing

use faer::Side;
use faer::linalg::solvers::Solve;
use faer::sparse::SparseColMat;
use faer::sparse::Triplet;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};

use diffshape_types::{DiffShapeError, DiffShapeResult};

use crate::sparse::{CsrMatrix, SparseSolver};

/// Sparse Cholesky (LLᵀ) solver using `faer`.
///
/// Stores the factorization for reuse across multiple solves. The system
/// matrix of a differential parameterization only depends on the initial
/// topology and geometry, so one factorization serves the whole run.
pub struct FaerSolver {
    /// Cached LLᵀ factorization.
    factorization: Option<Llt<usize, f64>>,
    /// Matrix dimension (N×N).
    dimension: usize,
}

impl FaerSolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            factorization: None,
            dimension: 0,
        }
    }

    /// Convert our CSR matrix to faer's CSC matrix.
    ///
    /// Builds from faer `Triplet`s, which faer assembles into CSC format.
    fn csr_to_csc(matrix: &CsrMatrix) -> DiffShapeResult<SparseColMat<usize, f64>> {
        let mut triplets: Vec<Triplet<usize, usize, f64>> =
            Vec::with_capacity(matrix.values.len());
        for row in 0..matrix.rows {
            for (col, val) in matrix.row(row) {
                triplets.push(Triplet { row, col, val });
            }
        }

        SparseColMat::try_new_from_triplets(matrix.rows, matrix.cols, &triplets).map_err(|e| {
            DiffShapeError::InvalidMesh(format!("Failed to construct faer CSC matrix: {e:?}"))
        })
    }

    /// Cheap necessary conditions for positive-definiteness, checked before
    /// handing the matrix to faer: finite entries and a positive diagonal.
    fn precheck(matrix: &CsrMatrix) -> DiffShapeResult<()> {
        if !matrix.all_finite() {
            return Err(DiffShapeError::NotPositiveDefinite(
                "matrix contains non-finite entries (degenerate geometry?)".into(),
            ));
        }
        if let Some((i, d)) = matrix
            .diagonal()
            .into_iter()
            .enumerate()
            .find(|&(_, d)| d <= 0.0)
        {
            return Err(DiffShapeError::NotPositiveDefinite(format!(
                "diagonal entry {i} is {d}, expected > 0"
            )));
        }
        Ok(())
    }

    fn llt(&self) -> DiffShapeResult<&Llt<usize, f64>> {
        self.factorization.as_ref().ok_or(DiffShapeError::NotFactorized)
    }
}

impl Default for FaerSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for FaerSolver {
    fn factorize(&mut self, matrix: &CsrMatrix) -> DiffShapeResult<()> {
        self.factorization = None;
        self.dimension = 0;

        if !matrix.is_square() {
            return Err(DiffShapeError::InvalidConfig(format!(
                "Matrix must be square, got {}×{}",
                matrix.rows, matrix.cols
            )));
        }
        if matrix.rows == 0 {
            return Err(DiffShapeError::InvalidMesh("Cannot factorize empty matrix".into()));
        }
        Self::precheck(matrix)?;

        // Convert CSR → faer CSC
        let csc = Self::csr_to_csc(matrix)?;

        // Step 1: Symbolic analysis (ordering, fill-in prediction)
        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper).map_err(|e| {
            DiffShapeError::NotPositiveDefinite(format!("Symbolic analysis failed: {e:?}"))
        })?;

        // Step 2: Numeric factorization (using the symbolic structure)
        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper).map_err(|e| {
            DiffShapeError::NotPositiveDefinite(format!("Cholesky factorization failed: {e:?}"))
        })?;

        tracing::debug!(
            dimension = matrix.rows,
            nnz = matrix.nnz(),
            "faer LLᵀ factorization complete"
        );

        self.factorization = Some(llt);
        self.dimension = matrix.rows;
        Ok(())
    }

    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> DiffShapeResult<()> {
        let llt = self.llt()?;
        let n = self.dimension;

        if rhs.len() != n {
            return Err(DiffShapeError::dimension("RHS", n, rhs.len()));
        }
        if solution.len() != n {
            return Err(DiffShapeError::dimension("solution", n, solution.len()));
        }

        let rhs_mat: faer::Mat<f64> = faer::Mat::from_fn(n, 1, |i, _| rhs[i]);

        // Solve using cached factorization: L L^T x = b
        let sol = llt.solve(&rhs_mat);

        for (i, out) in solution.iter_mut().enumerate() {
            *out = sol[(i, 0)];
        }
        Ok(())
    }

    fn solve_columns(&self, columns: &mut [Vec<f64>]) -> DiffShapeResult<()> {
        let llt = self.llt()?;
        let n = self.dimension;

        if columns.is_empty() {
            return Ok(());
        }
        for column in columns.iter() {
            if column.len() != n {
                return Err(DiffShapeError::dimension("RHS column", n, column.len()));
            }
        }

        // One N×k dense right-hand side, one substitution pass
        let rhs_mat: faer::Mat<f64> = faer::Mat::from_fn(n, columns.len(), |i, j| columns[j][i]);
        let sol = llt.solve(&rhs_mat);

        for (j, column) in columns.iter_mut().enumerate() {
            for (i, out) in column.iter_mut().enumerate() {
                *out = sol[(i, j)];
            }
        }
        Ok(())
    }

    fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
