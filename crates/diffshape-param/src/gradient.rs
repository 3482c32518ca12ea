//! Linear maps with a registered backward rule.
//!
//! An autodiff caller records the forward call and later feeds the
//! incoming gradient to [`DifferentiableMap::backward`]. Both maps here are
//! linear, so `backward` is the transpose, and for the inverse map that
//! transpose is a solve with the factors the forward pass already used.

use diffshape_mesh::VertexField;
use diffshape_types::DiffShapeResult;

use crate::parameterizer::DifferentialParameterizer;

/// A map over per-vertex fields with an explicit vector-Jacobian product.
pub trait DifferentiableMap {
    /// Evaluates the map.
    fn forward(&self, input: &VertexField) -> DiffShapeResult<VertexField>;

    /// Pulls `grad_output` (∂loss/∂output) back to ∂loss/∂input.
    fn backward(&self, grad_output: &VertexField) -> DiffShapeResult<VertexField>;

    /// Returns the map's name.
    fn name(&self) -> &str;
}

/// `v ↦ M v`. Backward is `g ↦ M g`.
#[derive(Debug, Clone, Copy)]
pub struct ToDifferential<'a>(pub &'a DifferentialParameterizer);

/// `u ↦ M⁻¹ u`. Backward is one more solve, `g ↦ M⁻¹ g`.
#[derive(Debug, Clone, Copy)]
pub struct FromDifferential<'a>(pub &'a DifferentialParameterizer);

impl DifferentiableMap for ToDifferential<'_> {
    fn forward(&self, input: &VertexField) -> DiffShapeResult<VertexField> {
        self.0.to_differential(input)
    }

    fn backward(&self, grad_output: &VertexField) -> DiffShapeResult<VertexField> {
        self.0.to_differential_vjp(grad_output)
    }

    fn name(&self) -> &str {
        "to_differential"
    }
}

impl DifferentiableMap for FromDifferential<'_> {
    fn forward(&self, input: &VertexField) -> DiffShapeResult<VertexField> {
        self.0.from_differential(input)
    }

    fn backward(&self, grad_output: &VertexField) -> DiffShapeResult<VertexField> {
        self.0.from_differential_vjp(grad_output)
    }

    fn name(&self) -> &str {
        "from_differential"
    }
}
