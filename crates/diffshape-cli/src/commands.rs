//! CLI command implementations.

use std::time::Instant;

use clap::ValueEnum;
use tracing::info_span;

use diffshape_math::ExecutionContext;
use diffshape_mesh::generators::{quad_grid, tetrahedron, unweld, uv_sphere};
use diffshape_mesh::topology::Topology;
use diffshape_mesh::weld::weld as weld_mesh;
use diffshape_mesh::{TriangleMesh, VertexField};
use diffshape_operators::{assemble_system_matrix, build_laplacian};
use diffshape_param::{DifferentialParameterizer, ParameterizationConfig};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Procedural shapes the commands run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shape {
    /// UV sphere with seams; `resolution` stacks and `2·resolution` slices.
    Sphere,
    /// Flat `resolution × resolution` quad grid.
    Grid,
    /// Unit tetrahedron (resolution ignored).
    Tetrahedron,
}

impl Shape {
    /// Generates the shape in its exported (possibly seam-split) layout.
    fn generate(self, resolution: usize) -> TriangleMesh {
        let resolution = resolution.max(2);
        match self {
            Shape::Sphere => uv_sphere(1.0, resolution, 2 * resolution),
            Shape::Grid => quad_grid(resolution, resolution, 1.0, 1.0),
            Shape::Tetrahedron => tetrahedron(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Shape::Sphere => "sphere",
            Shape::Grid => "grid",
            Shape::Tetrahedron => "tetrahedron",
        }
    }
}

fn load_config(path: Option<&str>) -> Result<ParameterizationConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => ParameterizationConfig::from_file(path)?,
        None => ParameterizationConfig::default(),
    };
    Ok(config)
}

/// Build L and M and report operator diagnostics.
pub fn inspect(shape: Shape, resolution: usize, config_path: Option<&str>) -> CommandResult {
    let _span = info_span!("inspect", shape = shape.name(), resolution).entered();
    let config = load_config(config_path)?;
    let ctx = config.context;

    println!("diffshape Operator Inspector");
    println!("────────────────────────────");
    println!("Shape:        {} (resolution {resolution})", shape.name());
    println!("Laplacian:    {}", config.laplacian);
    println!("Lambda:       {}", config.lambda);
    println!("Context:      {}", ctx.name());
    println!();

    let welded = weld_mesh(&shape.generate(resolution), &ctx)?;
    let mesh = &welded.mesh;
    let topology = Topology::from_mesh(mesh)?;
    println!("Vertices:     {} ({} welded away)", mesh.vertex_count(), welded.map.collapsed());
    println!("Faces:        {}", mesh.face_count());
    println!("Edges:        {}", topology.edge_count());
    println!("Boundary:     {} edges", topology.boundary_edge_count());
    println!("Components:   {}", topology.connected_components());
    println!("Avg edge:     {:.6}", mesh.average_edge_length());
    println!();

    let laplacian = build_laplacian(mesh, config.laplacian, &ctx)?;
    println!("L nnz:        {}", laplacian.nnz());
    println!("L max |row Σ|: {:.3e}", laplacian.max_abs_row_sum());
    println!("L symmetry:   {:.3e}", laplacian.symmetry_defect());

    let matrix = assemble_system_matrix(&laplacian, config.lambda)?;
    println!("M nnz:        {}", matrix.nnz());
    println!("M symmetry:   {:.3e}", matrix.symmetry_defect());

    let start = Instant::now();
    let parameterizer = DifferentialParameterizer::from_matrix(matrix, ctx)?;
    println!("Factorize:    {:.3}ms", start.elapsed().as_secs_f64() * 1e3);

    let v = VertexField::from_points(&mesh.positions);
    let back = parameterizer.from_differential(&parameterizer.to_differential(&v)?)?;
    println!("Round trip:   {:.3e} max abs error", back.max_abs_diff(&v)?);

    Ok(())
}

/// Split a shape into per-face vertices, weld it and report counts.
pub fn weld(shape: Shape, resolution: usize) -> CommandResult {
    let _span = info_span!("weld", shape = shape.name(), resolution).entered();
    let ctx = ExecutionContext::serial();

    println!("diffshape Weld");
    println!("──────────────");

    let exported = shape.generate(resolution);
    let seams = weld_mesh(&exported, &ctx)?;
    println!(
        "Exported:     {} vertices → {} unique ({} seam copies)",
        exported.vertex_count(),
        seams.map.unique_count(),
        seams.map.collapsed()
    );

    let split = unweld(&exported);
    let start = Instant::now();
    let welded = weld_mesh(&split, &ctx)?;
    println!(
        "Unwelded:     {} vertices → {} unique in {:.3}ms",
        split.vertex_count(),
        welded.map.unique_count(),
        start.elapsed().as_secs_f64() * 1e3
    );

    let again = weld_mesh(&welded.mesh, &ctx)?;
    println!("Idempotent:   {}", again.map.is_identity());

    Ok(())
}

/// Time `from_differential` solves against one cached factorization.
pub fn bench(
    shape: Shape,
    resolution: usize,
    iterations: usize,
    config_path: Option<&str>,
) -> CommandResult {
    let _span = info_span!("bench", shape = shape.name(), resolution, iterations).entered();
    let config = load_config(config_path)?;
    let ctx = config.context;

    println!("diffshape Solve Benchmark");
    println!("═════════════════════════");

    let mesh = weld_mesh(&shape.generate(resolution), &ctx)?.mesh;
    println!(
        "Shape:        {} ({} verts, {} tris)",
        shape.name(),
        mesh.vertex_count(),
        mesh.face_count()
    );
    println!("Config:       {} λ={} ({})", config.laplacian, config.lambda, ctx.name());

    let start = Instant::now();
    let parameterizer = DifferentialParameterizer::from_config(&mesh, &config)?;
    let factorize_ms = start.elapsed().as_secs_f64() * 1e3;

    let u = parameterizer.to_differential(&VertexField::from_points(&mesh.positions))?;
    let iterations = iterations.max(1);
    let start = Instant::now();
    for _ in 0..iterations {
        parameterizer.from_differential(&u)?;
    }
    let solve_ms = start.elapsed().as_secs_f64() * 1e3 / iterations as f64;

    println!();
    println!("  Factorize:     {factorize_ms:.3}ms (once)");
    println!("  Avg solve:     {solve_ms:.3}ms ({iterations} iterations)");
    println!("  Break-even:    {:.1} solves", factorize_ms / solve_ms.max(f64::EPSILON));
    println!("  Total solves:  {}", parameterizer.factorization().solve_count());

    Ok(())
}
