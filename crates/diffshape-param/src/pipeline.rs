//! One optimization run's geometry pipeline.
//!
//! ```text
//! source mesh → weld → L → M = I + λL → factorize (once) → u = M v
//! every iteration:
//!     frame():          v = M⁻¹ u → normals → expand to the original layout
//!     apply_gradient(): reduce → + regularizer → M⁻¹ g → step rule
//! ```
//!
//! The renderer and the loss live outside; they only exchange [`Frame`]s
//! and original-layout gradients with the pipeline.

use diffshape_math::ExecutionContext;
use diffshape_mesh::normals::compute_normals;
use diffshape_mesh::topology::Topology;
use diffshape_mesh::weld::weld;
use diffshape_mesh::{DVec3, TriangleMesh, VertexField, WeldMap};
use diffshape_operators::{build_laplacian, LaplacianRegularizer};
use diffshape_types::DiffShapeResult;

use crate::config::ParameterizationConfig;
use crate::parameterizer::DifferentialParameterizer;
use crate::state::ShapeState;
use crate::step::StepRule;

/// Geometry handed to the renderer for one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Positions in the original (seam-duplicated) layout.
    pub positions: Vec<DVec3>,
    /// Angle-weighted vertex normals in the original layout.
    pub normals: Vec<DVec3>,
    /// The original faces.
    pub faces: Vec<[u32; 3]>,
    /// Positions of the unique vertices.
    pub unique_positions: VertexField,
}

/// Summary of one parameter update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Iterations completed, this one included.
    pub iteration: usize,
    /// Regularization energy at the positions the gradient was taken at.
    pub regularization_energy: f64,
    /// Norm of the gradient handed to the step rule.
    pub gradient_norm: f64,
}

/// Owns everything one run needs between iterations.
#[derive(Debug)]
pub struct ShapePipeline {
    config: ParameterizationConfig,
    original_faces: Vec<[u32; 3]>,
    welded: TriangleMesh,
    map: WeldMap,
    state: ShapeState,
    regularizer: Option<LaplacianRegularizer>,
    iteration: usize,
}

impl ShapePipeline {
    /// Welds `source` and, when smoothing, factorizes its system matrix.
    pub fn new(source: &TriangleMesh, config: ParameterizationConfig) -> DiffShapeResult<Self> {
        config.validate()?;
        let ctx = config.context;

        let welded = weld(source, &ctx)?;
        let topology = Topology::from_mesh(&welded.mesh)?;
        let components = topology.connected_components();
        if components > 1 {
            tracing::warn!(components, "mesh has several connected components");
        }

        let needs_laplacian = config.smooth || config.regularization > 0.0;
        let laplacian = if needs_laplacian {
            Some(build_laplacian(&welded.mesh, config.laplacian, &ctx)?)
        } else {
            None
        };

        let v0 = VertexField::from_points(&welded.mesh.positions);
        let state = match (&laplacian, config.smooth) {
            (Some(l), true) => {
                let parameterizer = DifferentialParameterizer::from_laplacian(l, config.lambda, ctx)?;
                ShapeState::smooth(parameterizer, &v0)?
            }
            _ => ShapeState::unsmoothed(v0),
        };

        let regularizer = match laplacian {
            Some(l) if config.regularization > 0.0 => {
                Some(LaplacianRegularizer::new(l, config.regularization)?)
            }
            _ => None,
        };

        tracing::info!(
            original = welded.map.original_count(),
            unique = welded.map.unique_count(),
            smooth = config.smooth,
            laplacian = config.laplacian.name(),
            lambda = config.lambda,
            context = ctx.name(),
            "shape pipeline ready"
        );

        Ok(Self {
            config,
            original_faces: source.faces.clone(),
            welded: welded.mesh,
            map: welded.map,
            state,
            regularizer,
            iteration: 0,
        })
    }

    /// The run's configuration.
    pub fn config(&self) -> &ParameterizationConfig {
        &self.config
    }

    /// The execution context.
    pub fn context(&self) -> &ExecutionContext {
        &self.config.context
    }

    /// Original ↔ unique vertex mapping.
    pub fn weld_map(&self) -> &WeldMap {
        &self.map
    }

    /// The welded mesh at its initial positions.
    pub fn welded_mesh(&self) -> &TriangleMesh {
        &self.welded
    }

    /// The optimized state.
    pub fn state(&self) -> &ShapeState {
        &self.state
    }

    /// Mutable access to the optimized state.
    pub fn state_mut(&mut self) -> &mut ShapeState {
        &mut self.state
    }

    /// Iterations completed.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current unique-vertex positions.
    pub fn unique_positions(&self) -> DiffShapeResult<VertexField> {
        self.state.cartesian()
    }

    /// Positions, normals and faces in the original layout.
    pub fn frame(&self) -> DiffShapeResult<Frame> {
        let ctx = self.context();
        let unique = self.state.cartesian()?;
        let points = unique.to_points();
        let normals = compute_normals(&self.welded.with_positions(points.clone())?, ctx)?;

        Ok(Frame {
            positions: self.map.expand_points(&points)?,
            normals: self.map.expand_points(&normals.vertex)?,
            faces: self.original_faces.clone(),
            unique_positions: unique,
        })
    }

    /// Applies one update from ∂loss/∂(original-layout positions).
    pub fn apply_gradient(
        &mut self,
        grad_original: &VertexField,
        rule: &mut dyn StepRule,
    ) -> DiffShapeResult<StepReport> {
        let mut grad_v = self.map.reduce(grad_original)?;

        let mut regularization_energy = 0.0;
        if let Some(reg) = self.regularizer.as_ref().filter(|r| r.is_active()) {
            let v = self.state.cartesian()?;
            let (energy, grad) = reg.energy_and_gradient(&v)?;
            grad_v.axpy(1.0, &grad)?;
            regularization_energy = energy;
        }

        let grad_param = self.state.pullback(&grad_v)?;
        let gradient_norm = grad_param.norm();
        rule.step(self.state.parameter_mut(), &grad_param)?;
        self.iteration += 1;

        tracing::trace!(
            iteration = self.iteration,
            rule = rule.name(),
            gradient_norm,
            regularization_energy,
            "parameter updated"
        );

        Ok(StepReport {
            iteration: self.iteration,
            regularization_energy,
            gradient_norm,
        })
    }
}
