//! # diffshape-param
//!
//! Differential-coordinate parameterization of a welded mesh.
//!
//! ## Key Types
//!
//! - [`ParameterizationConfig`] — Laplacian mode, λ, smooth toggle, context.
//! - [`CachedFactorization`] — `M = I + λL` factorized once, solved every iteration.
//! - [`DifferentialParameterizer`] — `u = M v`, `v = M⁻¹ u` and their
//!   vector-Jacobian products.
//! - [`ShapeState`] — the optimized array, differential or Cartesian.
//! - [`StepRule`] — the optimizer seam; [`GradientDescent`] is the reference rule.
//! - [`ShapePipeline`] — weld → factorize → per-iteration frames and updates.

pub mod config;
pub mod factorization;
pub mod gradient;
pub mod parameterizer;
pub mod pipeline;
pub mod state;
pub mod step;

pub use config::ParameterizationConfig;
pub use factorization::CachedFactorization;
pub use gradient::DifferentiableMap;
pub use parameterizer::DifferentialParameterizer;
pub use pipeline::{Frame, ShapePipeline, StepReport};
pub use state::ShapeState;
pub use step::{GradientDescent, StepRule};
