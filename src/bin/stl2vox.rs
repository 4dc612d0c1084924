//! stl2vox command-line front end
//!
//! ```text
//! stl2vox --dimension-x 256 --dimension-y 256 --dimension-z 128 \
//!     --output-path part.ui8 body.stl 1 insert.stl 7
//! ```
//!
//! Layers are given as `FILE MATERIAL` pairs, in precedence order: where
//! meshes overlap, the later pair wins.

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use stl2vox::{LayerConfig, Voxelizer, VoxelizerConfig};

/// Convert binary STL meshes into a raw multi-material voxel volume
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Volume width in voxels
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    dimension_x: Option<u32>,

    /// Volume height in voxels
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    dimension_y: Option<u32>,

    /// Number of slices
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    dimension_z: Option<u32>,

    /// Where to write the volume [default: scene.ui8]
    #[arg(short, long, value_name = "PATH")]
    output_path: Option<PathBuf>,

    /// TOML scene file; command-line layers are added after its layers
    #[arg(short, long, value_name = "PATH")]
    scene: Option<PathBuf>,

    /// Render this slice to a PNG instead of writing a volume
    #[arg(long, value_name = "D", requires = "preview_path")]
    preview_slice: Option<usize>,

    /// PNG written by --preview-slice
    #[arg(long, value_name = "PNG", requires = "preview_slice")]
    preview_path: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Mesh files and material ids, as FILE MATERIAL pairs
    #[arg(value_name = "FILE MATERIAL")]
    layers: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match (args.preview_slice, &args.preview_path) {
        (Some(depth), Some(path)) => export_preview(&config, depth, path),
        _ => write_volume(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge the scene file (if any) with the command line
///
/// Usage problems exit the process here, before any mesh is read.
fn build_config(args: &Args) -> stl2vox::Result<VoxelizerConfig> {
    if args.layers.len() % 2 != 0 {
        usage_error(
            ErrorKind::WrongNumberOfValues,
            format!(
                "layers must be FILE MATERIAL pairs, got {} values",
                args.layers.len()
            ),
        );
    }

    let mut config = match &args.scene {
        Some(scene) => VoxelizerConfig::from_scene_file(scene)?,
        None => VoxelizerConfig::new(0, 0, 0),
    };

    let [scene_x, scene_y, scene_z] = config.dimensions();
    let x = resolve_dimension(args.dimension_x, scene_x, "--dimension-x");
    let y = resolve_dimension(args.dimension_y, scene_y, "--dimension-y");
    let z = resolve_dimension(args.dimension_z, scene_z, "--dimension-z");
    config = config.with_dimensions(x, y, z);

    for pair in args.layers.chunks_exact(2) {
        let material = pair[1].parse::<u32>().unwrap_or_else(|_| {
            usage_error(
                ErrorKind::InvalidValue,
                format!("invalid material id '{}' for mesh '{}'", pair[1], pair[0]),
            )
        });
        config = config.with_layer(LayerConfig::new(&pair[0], material));
    }

    if let Some(output_path) = &args.output_path {
        config = config.with_output_path(output_path);
    }

    Ok(config)
}

fn resolve_dimension(arg: Option<u32>, scene: usize, flag: &str) -> usize {
    match arg {
        Some(value) => value as usize,
        None if scene > 0 => scene,
        None => usage_error(
            ErrorKind::MissingRequiredArgument,
            format!("{} is required", flag),
        ),
    }
}

fn usage_error(kind: ErrorKind, message: String) -> ! {
    Args::command().error(kind, message).exit()
}

fn write_volume(config: VoxelizerConfig) -> stl2vox::Result<()> {
    let output_path = config.output_path().to_path_buf();
    let mut voxelizer = Voxelizer::new(config);

    let report = voxelizer.run_with_progress(|progress| {
        eprint!("\rslice {}/{}", progress.depth, progress.total);
    });
    eprintln!();
    let report = report?;

    println!(
        "Wrote {} bytes ({}x{}x{}) to {}",
        report.bytes_written,
        report.dimensions.x,
        report.dimensions.y,
        report.dimensions.z,
        output_path.display()
    );
    for layer in &report.layers {
        println!(
            "  layer {} (material {}): {} triangles",
            layer.name, layer.material, layer.triangles
        );
    }
    for (material, voxels) in &report.material_voxels {
        println!("  material {}: {} voxels", material, voxels);
    }
    Ok(())
}

#[cfg(feature = "preview")]
fn export_preview(config: &VoxelizerConfig, depth: usize, path: &Path) -> stl2vox::Result<()> {
    let scene = stl2vox::load_scene(config)?;
    let mut session = stl2vox::PreviewSession::new(scene)?;
    let slice = session.show(depth)?;
    stl2vox::preview::save_png(&slice, path)?;

    println!(
        "Saved slice {} ({} filled cells) to {}",
        depth,
        slice.as_bytes().iter().filter(|&&cell| cell != stl2vox::EMPTY).count(),
        path.display()
    );
    Ok(())
}

#[cfg(not(feature = "preview"))]
fn export_preview(_config: &VoxelizerConfig, _depth: usize, _path: &Path) -> stl2vox::Result<()> {
    Err(stl2vox::Error::config(
        "slice preview requires the 'preview' feature",
    ))
}
