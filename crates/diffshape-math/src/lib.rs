//! # diffshape-math
//!
//! Linear algebra primitives for diffshape.
//!
//! Provides:
//! - Sparse matrix representation (CSR) with coalescing triplet assembly
//! - The [`SparseSolver`](sparse::SparseSolver) interface and its
//!   [`FaerSolver`](faer_solver::FaerSolver) sparse Cholesky implementation
//! - [`ExecutionContext`](context::ExecutionContext), the explicit
//!   device/precision selection threaded through every component

pub mod context;
pub mod faer_solver;
pub mod sparse;

pub use context::{Device, ExecutionContext, Precision};
pub use faer_solver::FaerSolver;
pub use sparse::{CsrMatrix, SparseSolver};
