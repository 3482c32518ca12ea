//! Scalar type alias for geometry and linear algebra.
//!
//! Everything is computed in `f64`: the sparse Cholesky factorization and
//! the cotangent weights are sensitive to cancellation. Single-precision
//! output is opt-in through the execution context, not through this alias.

/// The floating-point type of vertex fields and sparse matrix values.
pub type Scalar = f64;
