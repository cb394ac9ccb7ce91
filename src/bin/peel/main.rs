//! Peel CLI - automatic UV unwrapping tool.
//!
//! Usage: peel <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `peel --help` for available commands.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use peel::io::obj;
use peel::prelude::*;
use peel::seam::DEFAULT_ANGLE_THRESHOLD_DEG;
use peel::topology::build_topology;

#[derive(Parser)]
#[command(name = "peel")]
#[command(author, version, about = "Automatic UV unwrapping for triangle meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Unwrap a mesh and write it back with UVs
    Unwrap {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Angular defect threshold in degrees for seam refinement
        #[arg(long, default_value_t = DEFAULT_ANGLE_THRESHOLD_DEG)]
        angle_threshold: f64,

        /// Promote extra seams near sharp features
        #[arg(long)]
        refine_seams: bool,

        /// Minimum faces for an island to receive an LSCM solve
        #[arg(long, default_value = "1")]
        min_island_faces: usize,

        /// Skip packing islands into the unit square
        #[arg(long)]
        no_pack: bool,

        /// Spacing between packed islands
        #[arg(long, default_value = "0.02")]
        margin: f64,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> std::result::Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => cmd_info(&input)?,

        Commands::Unwrap {
            input,
            output,
            angle_threshold,
            refine_seams,
            min_island_faces,
            no_pack,
            margin,
            sequential,
        } => cmd_unwrap(
            &input,
            &output,
            angle_threshold,
            refine_seams,
            min_island_faces,
            no_pack,
            margin,
            sequential,
        )?,
    }

    Ok(())
}

fn cmd_info(input: &PathBuf) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mesh = obj::load(input)?;
    let topo = build_topology(&mesh);

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_triangles());
    println!("Edges: {}", topo.num_edges());
    println!(
        "Euler characteristic: {}",
        topo.euler_characteristic(mesh.num_vertices(), mesh.num_triangles())
    );

    let boundary = topo.num_boundary_edges();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary edges)", boundary);
    }

    let (min, max) = mesh.bounding_box();
    println!(
        "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
        min.x, min.y, min.z, max.x, max.y, max.z
    );

    if mesh.uvs().is_some() {
        println!("UVs: present");
    } else {
        println!("UVs: none");
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_unwrap(
    input: &PathBuf,
    output: &PathBuf,
    angle_threshold: f64,
    refine_seams: bool,
    min_island_faces: usize,
    no_pack: bool,
    margin: f64,
    sequential: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut mesh = obj::load(input)?;
    println!(
        "Loaded: {} vertices, {} faces",
        mesh.num_vertices(),
        mesh.num_triangles()
    );

    let options = UnwrapOptions::default()
        .with_angle_threshold(angle_threshold)
        .with_refine_seams(refine_seams)
        .with_min_island_faces(min_island_faces)
        .with_pack_islands(!no_pack)
        .with_island_margin(margin)
        .with_parallel(!sequential);

    let mode = if sequential { "sequential" } else { "parallel" };
    println!("Unwrapping ({})...", mode);

    let start = Instant::now();
    let result = unwrap_mesh(&mesh, &options)?;
    let elapsed = start.elapsed();

    println!("Islands: {}", result.num_islands);
    println!(
        "Stretch: avg {:.3}, max {:.3}",
        result.avg_stretch, result.max_stretch
    );
    println!("Coverage: {:.1}%", result.coverage * 100.0);

    mesh.set_uvs(result.uvs)?;
    obj::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
