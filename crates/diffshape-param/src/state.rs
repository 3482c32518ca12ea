//! Optimized shape state.
//!
//! The external optimizer only ever sees [`ShapeState::parameter`]. With
//! smoothing on that is the differential coordinate array `u` and the
//! Cartesian positions are derived from it every iteration; with smoothing
//! off it is the positions themselves.

use diffshape_mesh::VertexField;
use diffshape_types::{DiffShapeError, DiffShapeResult};

use crate::parameterizer::DifferentialParameterizer;

/// The parameter being optimized, in one of two coordinate systems.
#[derive(Debug)]
pub enum ShapeState {
    /// `u = M v` is optimized; `v = M⁻¹ u`.
    Differential {
        parameterizer: DifferentialParameterizer,
        u: VertexField,
    },
    /// `v` is optimized directly.
    Cartesian { v: VertexField },
}

impl ShapeState {
    /// Initializes `u = M v` from the starting positions.
    pub fn smooth(
        parameterizer: DifferentialParameterizer,
        v: &VertexField,
    ) -> DiffShapeResult<Self> {
        let u = parameterizer.to_differential(v)?;
        Ok(Self::Differential { parameterizer, u })
    }

    /// Optimizes positions directly.
    pub fn unsmoothed(v: VertexField) -> Self {
        Self::Cartesian { v }
    }

    /// True if the differential parameterization is active.
    pub fn is_smooth(&self) -> bool {
        matches!(self, Self::Differential { .. })
    }

    /// Number of unique vertices.
    pub fn vertex_count(&self) -> usize {
        self.parameter().len()
    }

    /// The optimized array.
    pub fn parameter(&self) -> &VertexField {
        match self {
            Self::Differential { u, .. } => u,
            Self::Cartesian { v } => v,
        }
    }

    /// The optimized array, for the optimizer to update in place.
    pub fn parameter_mut(&mut self) -> &mut VertexField {
        match self {
            Self::Differential { u, .. } => u,
            Self::Cartesian { v } => v,
        }
    }

    /// The parameterizer, if smoothing is on.
    pub fn parameterizer(&self) -> Option<&DifferentialParameterizer> {
        match self {
            Self::Differential { parameterizer, .. } => Some(parameterizer),
            Self::Cartesian { .. } => None,
        }
    }

    /// Current Cartesian positions (one solve when smooth).
    pub fn cartesian(&self) -> DiffShapeResult<VertexField> {
        match self {
            Self::Differential { parameterizer, u } => parameterizer.from_differential(u),
            Self::Cartesian { v } => Ok(v.clone()),
        }
    }

    /// Maps ∂loss/∂v to ∂loss/∂parameter (one solve when smooth).
    pub fn pullback(&self, grad_v: &VertexField) -> DiffShapeResult<VertexField> {
        if grad_v.len() != self.vertex_count() {
            return Err(DiffShapeError::dimension(
                "Cartesian gradient",
                self.vertex_count(),
                grad_v.len(),
            ));
        }
        match self {
            Self::Differential { parameterizer, .. } => parameterizer.from_differential_vjp(grad_v),
            Self::Cartesian { .. } => Ok(grad_v.clone()),
        }
    }
}
