//! Per-vertex N×3 data in Structure-of-Arrays layout.
//!
//! Each coordinate channel is stored contiguously:
//! - `x: [x0, x1, x2, ...]`
//! - `y: [y0, y1, y2, ...]`
//! - `z: [z0, z1, z2, ...]`
//!
//! Sparse operators act on one channel at a time, so positions,
//! differential coordinates and gradients all travel in this form.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use diffshape_math::ExecutionContext;
use diffshape_types::{DiffShapeError, DiffShapeResult, Scalar};

/// An N×3 per-vertex field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexField {
    /// X channel.
    pub x: Vec<Scalar>,
    /// Y channel.
    pub y: Vec<Scalar>,
    /// Z channel.
    pub z: Vec<Scalar>,
}

impl VertexField {
    /// Creates a zero field with `n` vertices.
    pub fn zeros(n: usize) -> Self {
        Self {
            x: vec![0.0; n],
            y: vec![0.0; n],
            z: vec![0.0; n],
        }
    }

    /// Deinterleaves points into channels.
    pub fn from_points(points: &[DVec3]) -> Self {
        Self {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            z: points.iter().map(|p| p.z).collect(),
        }
    }

    /// Builds a field from three equally long channels.
    pub fn from_channels(channels: [Vec<f64>; 3]) -> DiffShapeResult<Self> {
        let [x, y, z] = channels;
        if y.len() != x.len() {
            return Err(DiffShapeError::dimension("field y channel", x.len(), y.len()));
        }
        if z.len() != x.len() {
            return Err(DiffShapeError::dimension("field z channel", x.len(), z.len()));
        }
        Ok(Self { x, y, z })
    }

    /// Consumes the field, returning its channels.
    pub fn into_channels(self) -> [Vec<f64>; 3] {
        [self.x, self.y, self.z]
    }

    /// Borrows the three channels.
    pub fn channels(&self) -> [&[f64]; 3] {
        [&self.x[..], &self.y[..], &self.z[..]]
    }

    /// Mutably borrows the three channels.
    pub fn channels_mut(&mut self) -> [&mut [f64]; 3] {
        [&mut self.x[..], &mut self.y[..], &mut self.z[..]]
    }

    /// Interleaves channels back into points.
    pub fn to_points(&self) -> Vec<DVec3> {
        (0..self.len()).map(|i| self.point(i)).collect()
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Returns vertex `i` as a point.
    #[inline]
    pub fn point(&self, i: usize) -> DVec3 {
        DVec3::new(self.x[i], self.y[i], self.z[i])
    }

    /// Sets vertex `i`.
    #[inline]
    pub fn set_point(&mut self, i: usize, p: DVec3) {
        self.x[i] = p.x;
        self.y[i] = p.y;
        self.z[i] = p.z;
    }

    /// Returns `out[i] = self[map[i]]`.
    pub fn gather(&self, map: &[u32]) -> DiffShapeResult<Self> {
        let n = self.len();
        if let Some(&bad) = map.iter().find(|&&m| m as usize >= n) {
            return Err(DiffShapeError::InvalidMesh(format!(
                "gather index {bad} out of range for a field of {n} vertices"
            )));
        }
        let pick = |channel: &[f64]| -> Vec<f64> {
            map.iter().map(|&m| channel[m as usize]).collect()
        };
        Ok(Self {
            x: pick(&self.x),
            y: pick(&self.y),
            z: pick(&self.z),
        })
    }

    /// Returns `out[map[i]] += self[i]` over a field of `target_len` zeros.
    ///
    /// This is the adjoint of [`gather`](Self::gather) with the same map.
    pub fn scatter_add(&self, map: &[u32], target_len: usize) -> DiffShapeResult<Self> {
        if map.len() != self.len() {
            return Err(DiffShapeError::dimension("scatter map", self.len(), map.len()));
        }
        if let Some(&bad) = map.iter().find(|&&m| m as usize >= target_len) {
            return Err(DiffShapeError::InvalidMesh(format!(
                "scatter index {bad} out of range for a field of {target_len} vertices"
            )));
        }
        let mut out = Self::zeros(target_len);
        for (i, &m) in map.iter().enumerate() {
            let m = m as usize;
            out.x[m] += self.x[i];
            out.y[m] += self.y[i];
            out.z[m] += self.z[i];
        }
        Ok(out)
    }

    /// `self += a * other`.
    pub fn axpy(&mut self, a: f64, other: &VertexField) -> DiffShapeResult<()> {
        self.check_len(other)?;
        for (dst, src) in self.channels_mut().into_iter().zip(other.channels()) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += a * s;
            }
        }
        Ok(())
    }

    /// Returns `s * self`.
    pub fn scaled(&self, s: f64) -> Self {
        let scale = |channel: &[f64]| -> Vec<f64> { channel.iter().map(|v| v * s).collect() };
        Self {
            x: scale(&self.x),
            y: scale(&self.y),
            z: scale(&self.z),
        }
    }

    /// Frobenius inner product over all N×3 entries.
    pub fn dot(&self, other: &VertexField) -> DiffShapeResult<f64> {
        self.check_len(other)?;
        Ok(self
            .channels()
            .into_iter()
            .zip(other.channels())
            .map(|(a, b)| a.iter().zip(b).map(|(p, q)| p * q).sum::<f64>())
            .sum())
    }

    /// Frobenius norm.
    pub fn norm(&self) -> f64 {
        self.channels()
            .into_iter()
            .flat_map(|c| c.iter())
            .map(|v| v * v)
            .sum::<f64>()
            .sqrt()
    }

    /// Largest absolute entry-wise difference.
    pub fn max_abs_diff(&self, other: &VertexField) -> DiffShapeResult<f64> {
        self.check_len(other)?;
        Ok(self
            .channels()
            .into_iter()
            .zip(other.channels())
            .flat_map(|(a, b)| a.iter().zip(b).map(|(p, q)| (p - q).abs()))
            .fold(0.0, f64::max))
    }

    /// Returns true if every entry is finite.
    pub fn all_finite(&self) -> bool {
        self.channels()
            .into_iter()
            .all(|c| c.iter().all(|v| v.is_finite()))
    }

    /// Rounds every entry to the context's output precision.
    pub fn round_to(&mut self, ctx: &ExecutionContext) {
        for channel in self.channels_mut() {
            ctx.round_slice(channel);
        }
    }

    fn check_len(&self, other: &VertexField) -> DiffShapeResult<()> {
        if other.len() != self.len() {
            return Err(DiffShapeError::dimension("vertex field", self.len(), other.len()));
        }
        Ok(())
    }
}
