//! Converts a glTF or OBJ scene into a flattened level glTF.
//!
//! ```text
//! level_converter <input.gltf|input.glb|input.obj> <output.gltf> [--scale S] [--settings import.json]
//! ```
//!
//! Set `RUST_LOG=debug` to see every texture as it is loaded.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use glam::Mat4;
use tessera::{ExportSettings, FileAssetReader, ImportSettings, LevelAssets, write_assets_to_gltf};

const USAGE: &str = "usage: level_converter <input.gltf|input.glb|input.obj> <output.gltf> [--scale S] [--settings import.json]";

struct Args {
    input: PathBuf,
    output: PathBuf,
    scale: Option<f32>,
    settings: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut scale = None;
    let mut settings = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--scale" => {
                let value = args.next().context("--scale needs a value")?;
                scale = Some(value.parse::<f32>().with_context(|| format!("invalid scale \"{value}\""))?);
            }
            "--settings" => settings = Some(PathBuf::from(args.next().context("--settings needs a path")?)),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let [input, output] = <[PathBuf; 2]>::try_from(positional).map_err(|_| anyhow::anyhow!(USAGE))?;
    Ok(Args { input, output, scale, settings })
}

fn load(input: &Path, settings: &ImportSettings) -> anyhow::Result<LevelAssets> {
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let reader = FileAssetReader;

    let level = match extension.as_str() {
        "gltf" | "glb" => {
            let mut level = LevelAssets::new();
            tessera::load_assets_from_gltf(input, &mut level, &reader, settings)?;
            level
        }
        "obj" => tessera::load_static_scene(input, &reader, settings)?,
        other => bail!("unsupported input format \".{other}\""),
    };
    Ok(level)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let is_obj = args.input.extension().is_some_and(|e| e.eq_ignore_ascii_case("obj"));
    let mut settings = match &args.settings {
        Some(path) => ImportSettings::from_json_file(path)
            .with_context(|| format!("Failed to read import settings {}", path.display()))?,
        None if is_obj => ImportSettings::obj(),
        None => ImportSettings::default(),
    };
    if let Some(scale) = args.scale {
        settings.model_matrix = Mat4::from_scale(glam::Vec3::splat(scale)) * settings.model_matrix;
    }

    let level = load(&args.input, &settings)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    log::info!(
        "{} meshes, {} vertices, {} triangles, {} materials, {} textures",
        level.meshes.len(),
        level.vertex_count(),
        level.triangle_count(),
        level.materials.len(),
        level.textures.len()
    );

    let all_meshes: Vec<usize> = (0..level.meshes.len()).collect();
    write_assets_to_gltf(&args.output, &level, &all_meshes, &ExportSettings::default())
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    Ok(())
}
