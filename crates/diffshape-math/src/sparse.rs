//! Sparse matrix representation and solver interface.
//!
//! Provides a CSR (Compressed Sparse Row) matrix and a trait for
//! sparse symmetric positive-definite solvers.

use serde::{Deserialize, Serialize};

use diffshape_types::{DiffShapeError, DiffShapeResult, Scalar};

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in row-major order. Each row's column indices are
/// strictly increasing: duplicate `(row, col)` entries are merged at
/// construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row pointer array (length = rows + 1).
    /// `row_ptr[i]..row_ptr[i+1]` are the indices into `col_idx` and `values`
    /// for non-zeros in row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices of non-zero entries.
    pub col_idx: Vec<usize>,
    /// Non-zero values.
    pub values: Vec<Scalar>,
}

impl CsrMatrix {
    /// Creates an empty CSR matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Creates the `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            rows: n,
            cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// Returns the number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the matrix is square.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Creates a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries are summed (coalesced), so scatter-add assembly can
    /// push one triplet per contribution.
    ///
    /// # Panics
    /// If a triplet lies outside the `rows × cols` shape. Mesh-derived
    /// triplets are range-checked by mesh validation before assembly.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, Scalar)]) -> Self {
        // Count entries per row
        let mut row_counts = vec![0usize; rows];
        for &(r, c, _) in triplets {
            assert!(
                r < rows && c < cols,
                "triplet ({r}, {c}) lies outside a {rows}×{cols} matrix"
            );
            row_counts[r] += 1;
        }

        // Bucket start offsets
        let mut start = vec![0usize; rows + 1];
        for i in 0..rows {
            start[i + 1] = start[i] + row_counts[i];
        }

        // Scatter into per-row buckets — use a copy of `start` as write cursor
        let mut entries = vec![(0usize, 0.0f64); triplets.len()];
        let mut cursor = start[..rows].to_vec();
        for &(r, c, v) in triplets {
            entries[cursor[r]] = (c, v);
            cursor[r] += 1;
        }

        // Sort each row by column and merge duplicates
        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_idx = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        row_ptr.push(0);

        for i in 0..rows {
            let bucket = &mut entries[start[i]..start[i + 1]];
            bucket.sort_unstable_by_key(|&(c, _)| c);

            let row_begin = col_idx.len();
            for &(c, v) in bucket.iter() {
                let last = col_idx.len();
                if last > row_begin && col_idx[last - 1] == c {
                    values[last - 1] += v;
                } else {
                    col_idx.push(c);
                    values.push(v);
                }
            }
            row_ptr.push(col_idx.len());
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Iterates over the `(col, value)` entries of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Returns entry `(r, c)`, or zero if it is not stored.
    pub fn get(&self, r: usize, c: usize) -> f64 {
        let range = self.row_ptr[r]..self.row_ptr[r + 1];
        match self.col_idx[range.clone()].binary_search(&c) {
            Ok(k) => self.values[range.start + k],
            Err(_) => 0.0,
        }
    }

    /// Returns all stored entries as `(row, col, value)` triplets.
    pub fn triplets(&self) -> Vec<(usize, usize, f64)> {
        let mut out = Vec::with_capacity(self.nnz());
        for r in 0..self.rows {
            out.extend(self.row(r).map(|(c, v)| (r, c, v)));
        }
        out
    }

    /// Computes `y = A * x`.
    pub fn mul_vec(&self, x: &[f64]) -> DiffShapeResult<Vec<f64>> {
        let mut y = vec![0.0; self.rows];
        self.mul_vec_into(x, &mut y)?;
        Ok(y)
    }

    /// Computes `y = A * x` into a caller-provided buffer.
    pub fn mul_vec_into(&self, x: &[f64], y: &mut [f64]) -> DiffShapeResult<()> {
        if x.len() != self.cols {
            return Err(DiffShapeError::dimension("matrix-vector input", self.cols, x.len()));
        }
        if y.len() != self.rows {
            return Err(DiffShapeError::dimension("matrix-vector output", self.rows, y.len()));
        }

        for (i, out) in y.iter_mut().enumerate() {
            *out = self.row(i).map(|(c, v)| v * x[c]).sum();
        }
        Ok(())
    }

    /// Returns the transpose `Aᵀ`.
    pub fn transpose(&self) -> Self {
        let triplets: Vec<(usize, usize, f64)> = self
            .triplets()
            .into_iter()
            .map(|(r, c, v)| (c, r, v))
            .collect();
        Self::from_triplets(self.cols, self.rows, &triplets)
    }

    /// Returns `s * A`.
    pub fn scale(&self, s: f64) -> Self {
        let mut out = self.clone();
        for v in &mut out.values {
            *v *= s;
        }
        out
    }

    /// Returns `A + B`, coalescing shared entries.
    pub fn add(&self, other: &CsrMatrix) -> DiffShapeResult<Self> {
        if self.rows != other.rows {
            return Err(DiffShapeError::dimension("matrix sum rows", self.rows, other.rows));
        }
        if self.cols != other.cols {
            return Err(DiffShapeError::dimension("matrix sum cols", self.cols, other.cols));
        }
        let mut triplets = self.triplets();
        triplets.extend(other.triplets());
        Ok(Self::from_triplets(self.rows, self.cols, &triplets))
    }

    /// Returns the main diagonal (zeros where nothing is stored).
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).collect()
    }

    /// Returns the sum of every row.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.rows).map(|i| self.row(i).map(|(_, v)| v).sum()).collect()
    }

    /// Returns the sum of every column.
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for (&c, &v) in self.col_idx.iter().zip(&self.values) {
            sums[c] += v;
        }
        sums
    }

    /// Largest absolute row sum. Zero for a Laplacian.
    pub fn max_abs_row_sum(&self) -> f64 {
        self.row_sums().into_iter().fold(0.0, |m, s| m.max(s.abs()))
    }

    /// Largest `|A[i,j] - A[j,i]|` over all stored entries.
    pub fn symmetry_defect(&self) -> f64 {
        if !self.is_square() {
            return f64::INFINITY;
        }
        let mut defect = 0.0f64;
        for r in 0..self.rows {
            for (c, v) in self.row(r) {
                defect = defect.max((v - self.get(c, r)).abs());
            }
        }
        defect
    }

    /// Returns true if the matrix is square and symmetric within `tolerance`.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        self.symmetry_defect() <= tolerance
    }

    /// Returns true if every stored value is finite.
    pub fn all_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// Trait for sparse symmetric positive-definite solvers.
///
/// A solver is factorized once and then solved against many times.
pub trait SparseSolver: Send + Sync {
    /// Factorize the matrix. Call once (or after topology change).
    fn factorize(&mut self, matrix: &CsrMatrix) -> DiffShapeResult<()>;

    /// Solve Ax = b using the pre-computed factorization.
    /// Returns x in the provided output buffer.
    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> DiffShapeResult<()>;

    /// Solve `A X = B` for several right-hand sides at once, in place.
    ///
    /// Each entry of `columns` is one right-hand side on input and the
    /// matching solution on output.
    fn solve_columns(&self, columns: &mut [Vec<f64>]) -> DiffShapeResult<()> {
        for column in columns.iter_mut() {
            let rhs = column.clone();
            self.solve(&rhs, column)?;
        }
        Ok(())
    }

    /// Returns true if the solver holds a valid factorization.
    fn is_factorized(&self) -> bool;

    /// Returns the dimension N of the factorized N×N matrix.
    fn dimension(&self) -> usize;
}
