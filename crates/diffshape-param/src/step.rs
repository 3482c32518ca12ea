//! Step rule trait, the seam to the external optimizer.
//!
//! A rule receives the optimized array and its gradient and updates the
//! array in place. Any state it keeps (moments, counters) is its own.

use diffshape_mesh::VertexField;
use diffshape_types::constants::DEFAULT_STEP_SIZE;
use diffshape_types::{DiffShapeError, DiffShapeResult};

/// Trait for parameter update rules.
///
/// # Implementations
///
/// - [`GradientDescent`] — `p ← p − η·g`
pub trait StepRule: Send {
    /// Update `parameter` in place given its gradient.
    fn step(&mut self, parameter: &mut VertexField, gradient: &VertexField) -> DiffShapeResult<()>;

    /// Returns the rule's name.
    fn name(&self) -> &str;
}

/// Plain gradient descent with a fixed step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientDescent {
    step_size: f64,
}

impl GradientDescent {
    /// Creates a rule. `step_size` must be finite and positive.
    pub fn new(step_size: f64) -> DiffShapeResult<Self> {
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(DiffShapeError::InvalidConfig(format!(
                "step size must be finite and positive, got {step_size}"
            )));
        }
        Ok(Self { step_size })
    }

    /// The step size η.
    pub fn step_size(&self) -> f64 {
        self.step_size
    }
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self {
            step_size: DEFAULT_STEP_SIZE,
        }
    }
}

impl StepRule for GradientDescent {
    fn step(&mut self, parameter: &mut VertexField, gradient: &VertexField) -> DiffShapeResult<()> {
        parameter.axpy(-self.step_size, gradient)
    }

    fn name(&self) -> &str {
        "gradient_descent"
    }
}
