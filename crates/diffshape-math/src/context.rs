//! Execution context: explicit device and precision selection.
//!
//! Every component that performs batch work takes an `&ExecutionContext`
//! instead of assuming a process-wide device or float type. The context is
//! created once per run and passed down.
//!
//! - [`Device::Serial`] runs batches on the calling thread.
//! - [`Device::Parallel`] runs batches data-parallel over faces, vertices or
//!   coordinate channels using rayon's global pool.
//!
//! Computation is always f64. [`Precision::Single`] rounds produced values
//! through f32, matching what a single-precision accelerator would hand to
//! a renderer.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Where batch operations run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    /// Sequential on the calling thread.
    #[default]
    Serial,
    /// Data-parallel on the rayon thread pool.
    Parallel,
}

/// Precision of the values a component hands back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// Full f64 results.
    #[default]
    Double,
    /// Results rounded to the nearest f32.
    Single,
}

/// Device/precision selection for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Batch execution device.
    #[serde(default)]
    pub device: Device,
    /// Output precision.
    #[serde(default)]
    pub precision: Precision,
}

impl ExecutionContext {
    /// Serial, double precision.
    pub fn serial() -> Self {
        Self::default()
    }

    /// Data-parallel, double precision.
    pub fn parallel() -> Self {
        Self {
            device: Device::Parallel,
            ..Self::default()
        }
    }

    /// Returns a copy with the given output precision.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Returns true if batches run on the rayon pool.
    #[inline]
    pub fn is_parallel(&self) -> bool {
        self.device == Device::Parallel
    }

    /// Short name for logs, e.g. `"parallel_f32"`.
    pub fn name(&self) -> &'static str {
        match (self.device, self.precision) {
            (Device::Serial, Precision::Double) => "serial_f64",
            (Device::Serial, Precision::Single) => "serial_f32",
            (Device::Parallel, Precision::Double) => "parallel_f64",
            (Device::Parallel, Precision::Single) => "parallel_f32",
        }
    }

    /// Evaluates `f(0..n)` as one batch and collects the results in index order.
    pub fn map_indexed<T, F>(&self, n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
    {
        match self.device {
            Device::Serial => (0..n).map(f).collect(),
            Device::Parallel => (0..n).into_par_iter().map(f).collect(),
        }
    }

    /// Evaluates `f` once per coordinate channel (0, 1, 2).
    pub fn map_channels<T, F>(&self, f: F) -> [T; 3]
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
    {
        match self.device {
            Device::Serial => [f(0), f(1), f(2)],
            Device::Parallel => {
                let (x, (y, z)) = rayon::join(|| f(0), || rayon::join(|| f(1), || f(2)));
                [x, y, z]
            }
        }
    }

    /// Rounds one value to the output precision.
    #[inline]
    pub fn round(&self, x: f64) -> f64 {
        match self.precision {
            Precision::Double => x,
            Precision::Single => x as f32 as f64,
        }
    }

    /// Rounds a buffer in place to the output precision.
    pub fn round_slice(&self, values: &mut [f64]) {
        if self.precision == Precision::Single {
            for v in values {
                *v = *v as f32 as f64;
            }
        }
    }
}
