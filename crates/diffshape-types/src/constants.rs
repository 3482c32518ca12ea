//! Numerical constants and configuration defaults.

/// Floor applied to the Heron product `s(s-a)(s-b)(s-c)` before the square
/// root. Nearly-degenerate triangles can make the product slightly negative.
pub const HERON_PRODUCT_FLOOR: f64 = 1.0e-12;

/// Default regularization strength λ of the system matrix `I + λL`.
pub const DEFAULT_LAMBDA: f64 = 1.0;

/// Default step size of the reference gradient-descent rule.
pub const DEFAULT_STEP_SIZE: f64 = 1.0e-2;

/// Tolerance used when checking symmetry of assembled matrices.
pub const SYMMETRY_TOLERANCE: f64 = 1.0e-9;

/// Squared length below which an accumulated vertex normal is treated as
/// belonging to an isolated vertex.
pub const ISOLATED_NORMAL_EPSILON: f64 = 1.0e-20;
