//! Parameterization configuration.
//!
//! Everything that decides how a run's system matrix is built and whether
//! the differential parameterization is used at all. Loaded from TOML or
//! JSON by the CLI; every field has a default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use diffshape_math::ExecutionContext;
use diffshape_operators::LaplacianKind;
use diffshape_types::constants::DEFAULT_LAMBDA;
use diffshape_types::{DiffShapeError, DiffShapeResult};

/// Configuration for one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterizationConfig {
    /// Laplacian weighting used for `M = I + λL` and the regularizer.
    pub laplacian: LaplacianKind,

    /// Smoothing strength λ. Must be finite and non-negative.
    pub lambda: f64,

    /// Optimize differential coordinates (`true`) or raw positions.
    pub smooth: bool,

    /// Weight of the `mean((L v)²)` penalty. 0 disables it.
    pub regularization: f64,

    /// Device and precision selection.
    pub context: ExecutionContext,
}

impl Default for ParameterizationConfig {
    fn default() -> Self {
        Self {
            laplacian: LaplacianKind::Uniform,
            lambda: DEFAULT_LAMBDA,
            smooth: true,
            regularization: 0.0,
            context: ExecutionContext::default(),
        }
    }
}

impl ParameterizationConfig {
    /// Uniform Laplacian with the given λ.
    pub fn uniform(lambda: f64) -> Self {
        Self {
            laplacian: LaplacianKind::Uniform,
            lambda,
            ..Default::default()
        }
    }

    /// Cotangent Laplacian with the given λ.
    pub fn cotangent(lambda: f64) -> Self {
        Self {
            laplacian: LaplacianKind::Cotangent,
            lambda,
            ..Default::default()
        }
    }

    /// Raw Cartesian optimization; no system matrix is built.
    pub fn unsmoothed() -> Self {
        Self {
            smooth: false,
            ..Default::default()
        }
    }

    /// Returns a copy with a different execution context.
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Returns a copy with a different regularization weight.
    pub fn with_regularization(mut self, weight: f64) -> Self {
        self.regularization = weight;
        self
    }

    /// Rejects negative or non-finite λ and regularization weight.
    pub fn validate(&self) -> DiffShapeResult<()> {
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(DiffShapeError::InvalidConfig(format!(
                "lambda must be finite and non-negative, got {}",
                self.lambda
            )));
        }
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(DiffShapeError::InvalidConfig(format!(
                "regularization must be finite and non-negative, got {}",
                self.regularization
            )));
        }
        Ok(())
    }

    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> DiffShapeResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DiffShapeError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML config.
    pub fn from_toml_str(toml: &str) -> DiffShapeResult<Self> {
        let config: Self =
            toml::from_str(toml).map_err(|e| DiffShapeError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file: `.json` files as JSON,
    /// anything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> DiffShapeResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json_string(&self) -> DiffShapeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DiffShapeError::Serialization(e.to_string()))
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> DiffShapeResult<String> {
        toml::to_string(self).map_err(|e| DiffShapeError::Serialization(e.to_string()))
    }
}
