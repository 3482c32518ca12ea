//! # diffshape-operators
//!
//! Sparse operators over a welded triangle mesh.
//!
//! ## Key Types
//!
//! - [`LaplacianKind`] selects uniform (combinatorial) or cotangent weights
//!   for [`build_laplacian`].
//! - [`assemble_system_matrix`] forms `M = I + λ·L`.
//! - [`LaplacianRegularizer`] is the `weight · mean((L v)²)` smoothness term.

pub mod laplacian;
pub mod regularize;
pub mod system;

pub use laplacian::{build_laplacian, LaplacianKind};
pub use regularize::LaplacianRegularizer;
pub use system::{assemble_system_matrix, compute_matrix};
