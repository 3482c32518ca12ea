//! # diffshape-types
//!
//! Shared types, identifiers, error types, and numerical constants
//! for the diffshape differential-coordinate mesh toolkit.
//!
//! This crate has zero domain logic — it defines the vocabulary
//! that all other diffshape crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{DiffShapeError, DiffShapeResult};
pub use ids::VertexId;
pub use scalar::Scalar;
