//! Error types for diffshape.
//!
//! All crates return `DiffShapeResult<T>` from fallible operations.
//! Nothing in this toolkit retries: every error is terminal for the run
//! that produced it.

use thiserror::Error;

/// Unified error type for diffshape.
#[derive(Debug, Error)]
pub enum DiffShapeError {
    /// Mesh data is malformed or inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// A face references a vertex that does not exist.
    #[error("Face {face} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        vertex: u32,
        vertex_count: usize,
    },

    /// Configuration value is invalid (e.g. negative λ).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The system matrix could not be Cholesky-factorized.
    #[error("System matrix is not positive definite: {0}")]
    NotPositiveDefinite(String),

    /// Two buffers that must agree in size do not.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A solve was requested before any factorization exists.
    #[error("Solver not factorized. Call factorize() first.")]
    NotFactorized,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DiffShapeError {
    /// Returns true for the fatal configuration class: an invalid parameter
    /// or a system matrix that is not positive definite.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DiffShapeError::InvalidConfig(_) | DiffShapeError::NotPositiveDefinite(_)
        )
    }

    /// Builds a [`DiffShapeError::DimensionMismatch`].
    pub fn dimension(what: &'static str, expected: usize, actual: usize) -> Self {
        DiffShapeError::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }
}

/// Convenience alias for `Result<T, DiffShapeError>`.
pub type DiffShapeResult<T> = Result<T, DiffShapeError>;
