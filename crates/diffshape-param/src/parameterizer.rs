//! Differential coordinates `u = M v` and their inverse `v = M⁻¹ u`.
//!
//! Gradients with respect to `v` become gradients with respect to `u` by
//! one more solve against the cached factorization (`M` is symmetric, so
//! `M⁻ᵀ = M⁻¹`). Taking a descent step in `u` then moves `v` by a
//! `M⁻¹`-smoothed update, which damps high-frequency gradient noise.

use diffshape_math::{CsrMatrix, ExecutionContext};
use diffshape_mesh::{TriangleMesh, VertexField};
use diffshape_operators::{assemble_system_matrix, build_laplacian, LaplacianKind};
use diffshape_types::DiffShapeResult;

use crate::config::ParameterizationConfig;
use crate::factorization::CachedFactorization;
use crate::gradient::{FromDifferential, ToDifferential};

/// The bijection between Cartesian and differential coordinates of one
/// welded mesh, built on a single factorization of `M = I + λL`.
#[derive(Debug)]
pub struct DifferentialParameterizer {
    factorization: CachedFactorization,
    ctx: ExecutionContext,
}

impl DifferentialParameterizer {
    /// Builds `L` from `mesh`, assembles `M = I + λL` and factorizes it.
    pub fn new(
        mesh: &TriangleMesh,
        kind: LaplacianKind,
        lambda: f64,
        ctx: ExecutionContext,
    ) -> DiffShapeResult<Self> {
        let laplacian = build_laplacian(mesh, kind, &ctx)?;
        Self::from_laplacian(&laplacian, lambda, ctx)
    }

    /// Builds the parameterizer described by `config`.
    pub fn from_config(mesh: &TriangleMesh, config: &ParameterizationConfig) -> DiffShapeResult<Self> {
        config.validate()?;
        Self::new(mesh, config.laplacian, config.lambda, config.context)
    }

    /// Assembles `M = I + λL` from a prebuilt Laplacian and factorizes it.
    pub fn from_laplacian(
        laplacian: &CsrMatrix,
        lambda: f64,
        ctx: ExecutionContext,
    ) -> DiffShapeResult<Self> {
        let matrix = assemble_system_matrix(laplacian, lambda)?;
        Self::from_matrix(matrix, ctx)
    }

    /// Factorizes an already assembled system matrix.
    pub fn from_matrix(matrix: CsrMatrix, ctx: ExecutionContext) -> DiffShapeResult<Self> {
        Ok(Self {
            factorization: CachedFactorization::new(matrix)?,
            ctx,
        })
    }

    /// Number of unique vertices.
    pub fn dimension(&self) -> usize {
        self.factorization.dimension()
    }

    /// The execution context every mapping runs under.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// The cached factorization (solve counter included).
    pub fn factorization(&self) -> &CachedFactorization {
        &self.factorization
    }

    /// `u = M v`.
    pub fn to_differential(&self, v: &VertexField) -> DiffShapeResult<VertexField> {
        let mut u = self.factorization.multiply_field(v, &self.ctx)?;
        u.round_to(&self.ctx);
        Ok(u)
    }

    /// `v = M⁻¹ u`, three channels solved as one batch.
    pub fn from_differential(&self, u: &VertexField) -> DiffShapeResult<VertexField> {
        let mut v = self.factorization.solve_field(u)?;
        v.round_to(&self.ctx);
        Ok(v)
    }

    /// Vector-Jacobian product of [`to_differential`](Self::to_differential):
    /// `Mᵀ g = M g`. Gradients are never rounded to the output precision.
    pub fn to_differential_vjp(&self, grad_u: &VertexField) -> DiffShapeResult<VertexField> {
        self.factorization.multiply_field(grad_u, &self.ctx)
    }

    /// Vector-Jacobian product of [`from_differential`](Self::from_differential):
    /// `M⁻ᵀ g = M⁻¹ g`, one solve with the cached factors, unrounded.
    pub fn from_differential_vjp(&self, grad_v: &VertexField) -> DiffShapeResult<VertexField> {
        self.factorization.solve_field(grad_v)
    }

    /// The forward map as a [`DifferentiableMap`](crate::gradient::DifferentiableMap).
    pub fn forward_map(&self) -> ToDifferential<'_> {
        ToDifferential(self)
    }

    /// The inverse map as a [`DifferentiableMap`](crate::gradient::DifferentiableMap).
    pub fn inverse_map(&self) -> FromDifferential<'_> {
        FromDifferential(self)
    }
}
