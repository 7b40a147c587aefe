//! quadpatch CLI - cavity filling with quad patterns.
//!
//! Usage: quadpatch <COMMAND> [OPTIONS]
//!
//! Run `quadpatch --help` for available commands. Set `RUST_LOG=debug` to see
//! matcher details.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::{info, warn};

use quadpatch::algo::matcher::{find_best_pattern, MatchOptions};
use quadpatch::algo::remesh::{remesh_cavity, RemeshOptions};
use quadpatch::algo::small_cavity::{remesh_small_cavity, SmallCavityOptions};
use quadpatch::algo::smooth::SmoothOptions;
use quadpatch::io;
use quadpatch::mesh::{circular_cavity, circular_loop};
use quadpatch::pattern::{usage, DiskLibrary, PatternCatalog};

#[derive(Parser)]
#[command(name = "quadpatch")]
#[command(author, version, about = "Quad-pattern cavity remeshing CLI", long_about = None)]
struct Cli {
    /// Load the disk-quadrangulation library from this file instead of the
    /// embedded one
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the fixed patterns and the disk library contents
    Catalog,

    /// Find the best pattern for a cavity
    Match {
        /// Vertices per side, corners included (e.g. 3,4,3,4)
        #[arg(value_delimiter = ',', required = true)]
        sides: Vec<usize>,

        /// Maximum number of trial assignments per orientation
        #[arg(short, long, default_value = "1000")]
        trial_budget: usize,
    },

    /// Fill a circular cavity with the best pattern and write it as OBJ
    Fill {
        /// Vertices per side, corners included (e.g. 3,4,3,4)
        #[arg(value_delimiter = ',', required = true)]
        sides: Vec<usize>,

        /// Output mesh file
        output: PathBuf,

        /// Radius of the cavity boundary
        #[arg(short, long, default_value = "1.0")]
        radius: f64,

        /// Number of smoothing iterations
        #[arg(short, long, default_value = "10")]
        iterations: usize,

        /// Maximum number of trial assignments per orientation
        #[arg(short, long, default_value = "1000")]
        trial_budget: usize,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Fill a small circular cavity from the disk library and write it as OBJ
    Small {
        /// Ideal number of new quads at each boundary vertex (e.g. 1,2,1,1,2,1)
        #[arg(value_delimiter = ',', required = true)]
        ideal: Vec<usize>,

        /// Output mesh file
        output: PathBuf,

        /// Smallest allowed number of new quads per boundary vertex
        #[arg(long, default_value = "1")]
        min: usize,

        /// Largest allowed number of new quads per boundary vertex
        #[arg(long, default_value = "3")]
        max: usize,

        /// Radius of the cavity boundary
        #[arg(short, long, default_value = "1.0")]
        radius: f64,

        /// Number of smoothing iterations
        #[arg(short, long, default_value = "10")]
        iterations: usize,

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

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &cli.library {
        install_library(path)?;
    }

    match cli.command {
        Commands::Catalog => cmd_catalog(),
        Commands::Match {
            sides,
            trial_budget,
        } => cmd_match(&sides, trial_budget),
        Commands::Fill {
            sides,
            output,
            radius,
            iterations,
            trial_budget,
            sequential,
        } => {
            let options = RemeshOptions::default()
                .with_matching(MatchOptions::default().with_trial_budget(trial_budget))
                .with_smoothing(
                    SmoothOptions::default()
                        .with_iterations(iterations)
                        .with_parallel(!sequential),
                );
            cmd_fill(&sides, &output, radius, &options)
        }
        Commands::Small {
            ideal,
            output,
            min,
            max,
            radius,
            iterations,
            sequential,
        } => {
            let options = SmallCavityOptions::default()
                .with_parallel(!sequential)
                .with_smoothing(
                    SmoothOptions::default()
                        .with_iterations(iterations)
                        .with_parallel(!sequential),
                );
            cmd_small(&ideal, min, max, &output, radius, &options)
        }
    }
}

fn install_library(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    if DiskLibrary::install_global(&text) {
        info!("disk library loaded from {}", path.display());
    } else {
        warn!("disk library already loaded, ignoring {}", path.display());
    }
    Ok(())
}

fn cmd_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = PatternCatalog::global();
    println!("Fixed patterns: {}", catalog.len());
    for entry in catalog.entries() {
        let p = &entry.topology;
        let singular = p
            .vertex_ids()
            .filter(|&v| !p.is_boundary_vertex(v) && p.valence(v) != 4)
            .count();
        println!(
            "  #{}: {} quads, {} sides {:?}, {} chords, {} singular vertices",
            entry.id,
            p.num_quads(),
            p.num_sides(),
            p.side_edge_counts(),
            p.num_chords(),
            singular
        );
    }

    let library = DiskLibrary::global();
    println!("Disk quadrangulations: {}", library.len());
    for b in library.boundary_sizes() {
        println!("  boundary {}: {} entries", b, library.with_boundary_size(b).len());
    }
    Ok(())
}

fn cmd_match(sides: &[usize], trial_budget: usize) -> Result<(), Box<dyn std::error::Error>> {
    let options = MatchOptions::default().with_trial_budget(trial_budget);
    let start = Instant::now();
    let found = find_best_pattern(PatternCatalog::global(), sides, &options);
    let elapsed = start.elapsed();

    match found {
        Some(m) => {
            println!("Pattern: #{}", m.pattern);
            println!(
                "Orientation: shift {}{}",
                m.orientation.shift,
                if m.orientation.mirrored { ", mirrored" } else { "" }
            );
            println!("Quantization: {:?}", m.quantization);
            println!("Score: {:.4} ({:.2?})", m.score, elapsed);
        }
        None => println!("No pattern fits {:?} ({:.2?})", sides, elapsed),
    }
    Ok(())
}

fn cmd_fill(
    sides: &[usize],
    output: &Path,
    radius: f64,
    options: &RemeshOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut soup, cavity) = circular_cavity(sides, radius)?;
    println!("Cavity: {} sides {:?}", cavity.num_sides(), cavity.side_sizes());

    let start = Instant::now();
    let catalog = PatternCatalog::global();
    let Some(found) = find_best_pattern(catalog, sides, &options.matching) else {
        return Err(format!("no pattern fits {:?}", sides).into());
    };
    let patch = remesh_cavity(catalog, &cavity, &found, options)?;
    let elapsed = start.elapsed();

    println!(
        "Pattern #{}: {} quads, {} new vertices ({} irregular)",
        found.pattern,
        patch.num_quads(),
        patch.num_new_vertices(),
        patch.num_irregular()
    );
    patch.commit(&mut soup);
    usage::log_usage();

    io::save(&soup, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);
    Ok(())
}

fn cmd_small(
    ideal: &[usize],
    min: usize,
    max: usize,
    output: &Path,
    radius: f64,
    options: &SmallCavityOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if min > max {
        return Err(format!("--min {} is larger than --max {}", min, max).into());
    }
    let (mut soup, ring) = circular_loop(ideal.len(), radius);
    let allowed = vec![min..=max; ideal.len()];

    let start = Instant::now();
    let patch = remesh_small_cavity(DiskLibrary::global(), &ring, ideal, &allowed, options)?
        .ok_or_else(|| format!("no disk quadrangulation fits {:?}", ideal))?;
    let elapsed = start.elapsed();

    println!(
        "{} quads, {} new vertices ({} irregular)",
        patch.num_quads(),
        patch.num_new_vertices(),
        patch.num_irregular()
    );
    patch.commit(&mut soup);
    usage::log_usage();

    io::save(&soup, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);
    Ok(())
}
