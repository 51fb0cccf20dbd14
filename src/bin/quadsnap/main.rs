//! quadsnap CLI - snap a quad mesh onto a reference triangle surface.
//!
//! Usage: quadsnap <COMMAND> ...
//!
//! Run `quadsnap --help` for available commands. Set `RUST_LOG=info` to see
//! per-round statistics.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};

use quadsnap::algo::driver::{ProjectionDriver, SnapshotWriter};
use quadsnap::algo::label::{clear_labels, label_surface, LabelOptions, DEFAULT_COS_ANGLE};
use quadsnap::algo::project::ReferenceSurface;
use quadsnap::algo::Progress;
use quadsnap::config::{parse_pair, ProjectConfig};
use quadsnap::io;
use quadsnap::mesh::{HalfEdgeMesh, VertexLabel};

const USAGE: &str = "\
Usage: quadsnap project orig=<tri.vtk> input=<quad.vtk> output=<out.vtk> iters=<1> preserveQuality=<false> \
preserveSharpFeature=<false> treatSharpFeatureAsRegular=<true> treatCornerAsRegular=<false> cosangle=<0.939692621>
       quadsnap convert <input> <output>
       quadsnap info <input>

Info: cos10° = 0.984807753; cos15° = 0.965925826; cos20° = 0.939692621; cos25° = 0.906307787; cos30° = 0.866025404";

#[derive(Parser)]
#[command(name = "quadsnap")]
#[command(author, version, about = "Quad mesh smoothing and projection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Smooth a quad mesh and project it onto a reference surface
    Project {
        /// Settings as KEY=VALUE (orig, input, output, iters, preserveQuality,
        /// preserveSharpFeature, treatSharpFeatureAsRegular, treatCornerAsRegular,
        /// cosangle, snapshots, faces, sequential)
        #[arg(value_parser = parse_setting)]
        settings: Vec<(String, String)>,
    },

    /// Convert a mesh between file formats
    Convert {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,
    },

    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Cosine threshold for sharp features
        #[arg(long, default_value_t = DEFAULT_COS_ANGLE)]
        cosangle: f64,
    },
}

fn parse_setting(arg: &str) -> Result<(String, String), String> {
    parse_pair(arg).map_err(|e| e.to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if std::env::args().len() < 2 {
        println!("{}", USAGE);
        std::process::exit(-1);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Project { settings } => {
            if settings.is_empty() {
                println!("{}", USAGE);
                std::process::exit(-1);
            }
            cmd_project(settings)?;
        }

        Commands::Convert { input, output } => {
            cmd_convert(&input, &output)?;
        }

        Commands::Info { input, cosangle } => {
            cmd_info(&input, cosangle)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |step| {
        if step.total == 0 {
            return;
        }

        let percent = (step.fraction() * 100.0).round() as usize;

        // Never move backwards; only redraw when the bar grows
        let previous = max_percent.fetch_max(percent, Ordering::Relaxed);
        if percent <= previous && !step.is_finished() {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, percent, step.stage);
        let _ = std::io::stderr().flush();

        if step.is_finished() {
            eprintln!();
        }
    })
}

fn cmd_project(settings: Vec<(String, String)>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ProjectConfig::from_pairs(settings)?;
    println!("-----------------------------------");
    println!("{}", config);
    println!("-----------------------------------");
    let options = config.to_driver_options()?;

    let reference: ReferenceSurface = ReferenceSurface::load(&config.orig, config.cos_angle)?;
    println!(
        "Reference: {} faces, {} feature segments",
        reference.mesh().num_faces(),
        reference.num_feature_segments()
    );

    let mut target: HalfEdgeMesh = io::load(&config.input)?;
    target.extract_boundary();
    println!("Target: {} vertices, {} faces", target.num_vertices(), target.num_faces());

    let mut driver = ProjectionDriver::new(&reference, options);
    if config.iters > 0 {
        driver = driver.with_progress(create_progress());
    }
    if let Some(prefix) = &config.snapshots {
        driver = driver.with_observer(SnapshotWriter::new(prefix.clone()));
    }

    let mode = if config.sequential { "sequential" } else { "parallel" };
    println!("Running {} rounds ({})...", config.iters, mode);

    let start = Instant::now();
    let report = driver.run(&mut target)?;
    let elapsed = start.elapsed();

    println!("Labels: {}", report.labels);
    if report.rounds > 0 {
        println!(
            "Last round: {} vertices projected, max distance {:.6}, mean {:.6}",
            report.projection.projected,
            report.projection.max_distance,
            report.projection.mean_distance
        );
    }

    io::save_faces_vtk(&target, &config.faces)?;
    io::save(&target, &config.output)?;
    println!("Saved: {} and {} ({:.2?})", config.output.display(), config.faces.display(), elapsed);

    Ok(())
}

fn cmd_convert(input: &PathBuf, output: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;
    io::save(&mesh, output)?;
    println!("Converted {} -> {}", input.display(), output.display());
    Ok(())
}

fn cmd_info(input: &PathBuf, cosangle: f64) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Edges: {}", mesh.num_edges());
    println!("Faces: {}", mesh.num_faces());

    if mesh.is_triangle_mesh() {
        println!("Mesh type: Triangle mesh");
    } else if mesh.is_quad_mesh() {
        println!("Mesh type: Quad mesh");
    } else {
        println!("Mesh type: Mixed polygon mesh");
    }

    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Average edge length: {:.6}", mesh.average_edge_length());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    mesh.extract_boundary();
    if let Some(boundary) = mesh.boundary() {
        if boundary.num_boundary_edges() == 0 {
            println!("Topology: Closed (no boundary)");
        } else {
            println!(
                "Topology: Open ({} boundary edges in {} loops)",
                boundary.num_boundary_edges(),
                boundary.loops().len()
            );
        }
    }

    clear_labels(&mut mesh);
    let summary = label_surface(&mut mesh, &LabelOptions::with_cos_angle(cosangle)?)?;
    println!("\nLabels (cosangle = {}):", cosangle);
    for label in [
        VertexLabel::Interior,
        VertexLabel::Regular,
        VertexLabel::SharpFeature,
        VertexLabel::Corner,
    ] {
        println!("  {:<13} {}", label.name(), mesh.labels().count(label));
    }
    println!("  sharp edges   {}", summary.sharp_edges);

    Ok(())
}
