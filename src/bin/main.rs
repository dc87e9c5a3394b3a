//! Static Mesher CLI
//!
//! Build optimized static meshes from JSON mesh descriptions.

use clap::{Parser, Subcommand, ValueEnum};
use static_mesher::input::{self, MeshDescription};
use static_mesher::{MeshBuilder, MeshOutput};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "static-mesher")]
#[command(author, version, about = "Build optimized static meshes from JSON descriptions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a mesh and write it to disk
    Build {
        /// Input JSON mesh description
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "obj")]
        format: OutputFormat,

        /// Keep the input normals instead of computing smoothed ones
        #[arg(long)]
        no_normals: bool,

        /// Pass whose texture index orders faces (overrides the input file)
        #[arg(long)]
        order_pass: Option<usize>,

        /// Stage whose texture index orders faces (overrides the input file)
        #[arg(long)]
        order_stage: Option<usize>,
    },

    /// Build a mesh and print its statistics as JSON
    Stats {
        /// Input JSON mesh description
        #[arg(short, long)]
        input: PathBuf,

        /// Keep the input normals instead of computing smoothed ones
        #[arg(long)]
        no_normals: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Wavefront OBJ with a companion MTL file
    Obj,
    /// JSON dump of the built mesh
    Json,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            format,
            no_normals,
            order_pass,
            order_stage,
        } => {
            let description = load(&input)?;
            let mut config = description.config();
            if let Some(pass) = order_pass {
                config.ordering_pass = pass;
            }
            if let Some(stage) = order_stage {
                config.ordering_stage = stage;
            }
            let builder = build(description.into_builder_with(config)?, !no_normals);
            export_output(&MeshOutput::from_builder(&builder), &output, format)?;
        }
        Commands::Stats { input, no_normals } => {
            let builder = build(load(&input)?.into_builder()?, !no_normals);
            println!("{}", serde_json::to_string_pretty(builder.mesh_stats())?);
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<MeshDescription, Box<dyn std::error::Error>> {
    eprintln!("Loading mesh description from {:?}...", path);
    let description = input::load_from_path(path)?;
    eprintln!("  Loaded {} faces", description.faces.len());
    Ok(description)
}

fn build(mut builder: MeshBuilder, compute_normals: bool) -> MeshBuilder {
    builder.build_mesh(compute_normals);
    let stats = builder.mesh_stats();
    eprintln!(
        "  Built {} vertices, {} faces in {} strips (max {}, avg {:.2})",
        builder.vertex_count(),
        builder.face_count(),
        stats.strip_count,
        stats.max_strip_length,
        stats.avg_strip_length
    );
    if stats.degenerate_faces_removed + stats.duplicate_faces_removed > 0 {
        eprintln!(
            "  Removed {} degenerate and {} duplicate faces",
            stats.degenerate_faces_removed, stats.duplicate_faces_removed
        );
    }
    if stats.normal_mismatches > 0 {
        eprintln!("  Warning: {} faces failed normal verification", stats.normal_mismatches);
    }
    builder
}

fn export_output(
    output: &MeshOutput,
    path: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Obj => {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("mesh");
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let obj_export = output.to_obj(name)?;
            let obj_path = obj_export.write_to_dir(dir)?;

            println!("Exported OBJ to {:?}", obj_path);
            println!("  Material: {:?}", obj_path.with_extension("mtl"));
        }
        OutputFormat::Json => {
            let json_path = if path.extension().is_some() {
                path.to_path_buf()
            } else {
                path.with_extension("json")
            };
            let json = serde_json::to_string_pretty(output)?;
            fs::write(&json_path, &json)?;
            println!("Exported JSON ({} bytes) to {:?}", json.len(), json_path);
        }
    }

    Ok(())
}
