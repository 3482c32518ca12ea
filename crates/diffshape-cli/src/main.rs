//! diffshape CLI — operator inspection, welding and solve timing.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::Shape;

#[derive(Parser)]
#[command(name = "diffshape")]
#[command(version, about = "diffshape — differential-coordinate mesh parameterization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build L and M for a generated shape and report their properties.
    Inspect {
        /// Generated shape.
        #[arg(short, long, value_enum, default_value_t = Shape::Sphere)]
        shape: Shape,

        /// Subdivision level of the shape.
        #[arg(short, long, default_value_t = 16)]
        resolution: usize,

        /// Parameterization config (TOML, or JSON with a `.json` extension).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Split a generated shape along seams, weld it back and report counts.
    Weld {
        /// Generated shape.
        #[arg(short, long, value_enum, default_value_t = Shape::Sphere)]
        shape: Shape,

        /// Subdivision level of the shape.
        #[arg(short, long, default_value_t = 16)]
        resolution: usize,
    },

    /// Time per-iteration `from_differential` solves.
    Bench {
        /// Generated shape.
        #[arg(short, long, value_enum, default_value_t = Shape::Sphere)]
        shape: Shape,

        /// Subdivision level of the shape.
        #[arg(short, long, default_value_t = 64)]
        resolution: usize,

        /// Number of solves to time.
        #[arg(short, long, default_value_t = 100)]
        iterations: usize,

        /// Parameterization config (TOML, or JSON with a `.json` extension).
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "diffshape=info",
            2 => "diffshape=debug",
            _ => "diffshape=trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Inspect {
            shape,
            resolution,
            config,
        } => commands::inspect(shape, resolution, config.as_deref()),
        Commands::Weld { shape, resolution } => commands::weld(shape, resolution),
        Commands::Bench {
            shape,
            resolution,
            iterations,
            config,
        } => commands::bench(shape, resolution, iterations, config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
