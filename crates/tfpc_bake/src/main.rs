use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::time::Instant;
use tfpc_bake::{
    bake,
    cli::{BakeImageArgs, BakeShapeArgs, Cli, Command, PreviewArgs},
    inspect, preview,
};
use thoughtform::{Rotation, SamplerOptions, ShapeRegistry, LEGACY_SHAPE_MAP};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::BakeImage(args) => bake_images(args),
        Command::BakeShape(args) => bake_shape(args),
        Command::Inspect { path } => {
            let size = std::fs::metadata(&path)
                .with_context(|| format!("stat {}", path.display()))?
                .len();
            let decoded =
                tfpc::read_file(&path).with_context(|| format!("read {}", path.display()))?;
            print!("{}", inspect::describe(&decoded, size as usize));
            Ok(())
        }
        Command::Shapes => {
            list_shapes();
            Ok(())
        }
        Command::Preview(args) => render_preview(args),
    }
}

fn bake_images(args: BakeImageArgs) -> Result<()> {
    let mut options = match &args.settings {
        Some(path) => bake::load_settings(path)?,
        None => SamplerOptions::default(),
    };
    if let Some(n) = args.particles {
        options.particle_budget = n;
    }
    if let Some(seed) = args.seed {
        options.seed = seed;
    }

    let started = Instant::now();
    let summary = bake::bake_directory(&args.input_dir, &args.output_dir, &options, args.overwrite)?;
    info!(
        "Done in {:.1?}: {} written, {} skipped, {} failed",
        started.elapsed(),
        summary.written,
        summary.skipped,
        summary.failed
    );
    Ok(())
}

fn bake_shape(args: BakeShapeArgs) -> Result<()> {
    let registry = ShapeRegistry::builtin();
    let resolved = registry.resolve(&args.shape);
    let data = bake::bake_shape(&registry, resolved.id, args.particles, args.size, args.seed);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let written = tfpc::write_file(&args.output, &data)
        .with_context(|| format!("write {}", args.output.display()))?;

    info!(
        "OK {} -> {} ({} particles, {})",
        resolved.id,
        args.output.display(),
        data.total_count(),
        tfpc::format_file_size(written as u64)
    );
    Ok(())
}

fn list_shapes() {
    let registry = ShapeRegistry::builtin();
    for option in registry.sigil_shape_options() {
        println!("{:<18} {:<18} {:?}", option.id, option.label, option.category);
    }
    println!();
    for (legacy, target) in LEGACY_SHAPE_MAP {
        println!("{legacy:<18} -> {target}");
    }
}

fn render_preview(args: PreviewArgs) -> Result<()> {
    let registry = ShapeRegistry::builtin();
    let rotation = Rotation::new(args.tilt.to_radians(), args.turn.to_radians(), 0.0);
    let img = preview::render_preview(
        &registry,
        &args.shape,
        args.particles,
        args.seed,
        args.size,
        rotation,
    );
    img.save_with_format(&args.output, image::ImageFormat::Png)
        .with_context(|| format!("write {}", args.output.display()))?;
    info!("Preview {} -> {}", args.shape, args.output.display());
    Ok(())
}
