//! Laplacian smoothness penalty.
//!
//! `E(v) = weight · mean((L v)²)` over all V×3 entries of `L v`. Added to
//! the rendering loss to discourage high-frequency surface detail.

use diffshape_math::CsrMatrix;
use diffshape_mesh::VertexField;
use diffshape_types::{DiffShapeError, DiffShapeResult};

/// Weighted mean-square Laplacian energy and its gradient.
#[derive(Debug, Clone)]
pub struct LaplacianRegularizer {
    laplacian: CsrMatrix,
    transpose: CsrMatrix,
    weight: f64,
}

impl LaplacianRegularizer {
    /// Creates a regularizer. `weight` must be finite and non-negative.
    pub fn new(laplacian: CsrMatrix, weight: f64) -> DiffShapeResult<Self> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(DiffShapeError::InvalidConfig(format!(
                "regularization weight must be finite and non-negative, got {weight}"
            )));
        }
        if !laplacian.is_square() {
            return Err(DiffShapeError::dimension(
                "Laplacian columns",
                laplacian.rows,
                laplacian.cols,
            ));
        }
        let transpose = laplacian.transpose();
        Ok(Self {
            laplacian,
            transpose,
            weight,
        })
    }

    /// Penalty weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// True when the weight is positive.
    pub fn is_active(&self) -> bool {
        self.weight > 0.0
    }

    /// The operator being penalized.
    pub fn laplacian(&self) -> &CsrMatrix {
        &self.laplacian
    }

    fn apply(&self, v: &VertexField) -> DiffShapeResult<[Vec<f64>; 3]> {
        let [x, y, z] = v.channels();
        Ok([
            self.laplacian.mul_vec(x)?,
            self.laplacian.mul_vec(y)?,
            self.laplacian.mul_vec(z)?,
        ])
    }

    /// `weight · mean((L v)²)`. Zero for an empty field.
    pub fn energy(&self, v: &VertexField) -> DiffShapeResult<f64> {
        let lv = self.apply(v)?;
        if v.is_empty() {
            return Ok(0.0);
        }
        let sum_sq: f64 = lv.iter().flatten().map(|e| e * e).sum();
        Ok(self.weight * sum_sq / (3 * v.len()) as f64)
    }

    /// `∂E/∂v = 2·weight/(3V) · Lᵀ(L v)`.
    pub fn gradient(&self, v: &VertexField) -> DiffShapeResult<VertexField> {
        Ok(self.energy_and_gradient(v)?.1)
    }

    /// Energy and gradient from one application of `L`.
    pub fn energy_and_gradient(&self, v: &VertexField) -> DiffShapeResult<(f64, VertexField)> {
        let lv = self.apply(v)?;
        if v.is_empty() {
            return Ok((0.0, VertexField::zeros(0)));
        }
        let count = (3 * v.len()) as f64;
        let sum_sq: f64 = lv.iter().flatten().map(|e| e * e).sum();
        let scale = 2.0 * self.weight / count;

        let [gx, gy, gz] = lv;
        let mut gradient = VertexField::from_channels([
            self.transpose.mul_vec(&gx)?,
            self.transpose.mul_vec(&gy)?,
            self.transpose.mul_vec(&gz)?,
        ])?;
        for channel in gradient.channels_mut() {
            for g in channel.iter_mut() {
                *g *= scale;
            }
        }
        Ok((self.weight * sum_sq / count, gradient))
    }
}
