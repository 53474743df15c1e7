use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};
use tfpc::{ArtDirectionConfig, LayerData, LayerKind, LayeredParticleData, Particle};
use thoughtform::{depth_bounds, SamplerOptions, ShapeRegistry, SourceImage};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Image files under `dir`, sorted for stable output.
pub fn collect_images(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|s| s.to_str())
                .map(|s| IMAGE_EXTENSIONS.contains(&s.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    out.sort();
    out
}

/// Reads a sampler settings document. Every field is optional.
pub fn load_settings(path: &Path) -> Result<SamplerOptions> {
    let file = File::open(path).with_context(|| format!("open settings {}", path.display()))?;
    let options = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse settings {}", path.display()))?;
    Ok(options)
}

pub fn load_image(path: &Path) -> Result<SourceImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok(SourceImage::new(width, height, img.into_raw())?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeOutcome {
    Written { particles: usize, bytes: usize },
    Skipped,
}

pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    output_dir.join(format!("{stem}.{}", tfpc::TFPC_EXTENSION))
}

pub fn bake_image(
    input: &Path,
    output_dir: &Path,
    options: &SamplerOptions,
    overwrite: bool,
) -> Result<BakeOutcome> {
    let out_path = output_path(input, output_dir);
    if out_path.exists() && !overwrite {
        debug!("Skipping existing file: {}", out_path.display());
        return Ok(BakeOutcome::Skipped);
    }

    info!("Processing {} -> {}", input.display(), out_path.display());
    let image = load_image(input)?;
    let data = thoughtform::sample_layers(&image, options)?;
    let written = tfpc::write_file(&out_path, &data)
        .with_context(|| format!("write {}", out_path.display()))?;

    info!(
        "OK {} -> {} ({} particles, {})",
        input.display(),
        out_path.display(),
        data.total_count(),
        tfpc::format_file_size(written as u64)
    );

    Ok(BakeOutcome::Written {
        particles: data.total_count(),
        bytes: written,
    })
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BakeSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Bakes every image under `input_dir` in parallel. Per-file failures are
/// logged and counted, never fatal.
pub fn bake_directory(
    input_dir: &Path,
    output_dir: &Path,
    options: &SamplerOptions,
    overwrite: bool,
) -> Result<BakeSummary> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;

    let inputs = collect_images(input_dir);
    info!("Processing {} images...", inputs.len());

    let written = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    inputs.par_iter().for_each(|path| {
        match bake_image(path, output_dir, options, overwrite) {
            Ok(BakeOutcome::Written { .. }) => written.fetch_add(1, Ordering::Relaxed),
            Ok(BakeOutcome::Skipped) => skipped.fetch_add(1, Ordering::Relaxed),
            Err(err) => {
                warn!("Error processing {}: {:#}", path.display(), err);
                failed.fetch_add(1, Ordering::Relaxed)
            }
        };
    });

    Ok(BakeSummary {
        written: written.into_inner(),
        skipped: skipped.into_inner(),
        failed: failed.into_inner(),
    })
}

/// Shape points in the fill layer, white, with luma from normalized depth
/// (near = bright). Contour and highlight stay empty.
pub fn bake_shape(
    registry: &ShapeRegistry,
    shape: &str,
    particles: usize,
    size: f32,
    seed: u32,
) -> LayeredParticleData {
    let points = registry.generate(shape, seed, particles, size);
    let (min_z, max_z) = depth_bounds(&points);
    let range = max_z - min_z;

    let mut data = LayeredParticleData::new(0, 0, ArtDirectionConfig::default());

    let fill = &mut data.layers[LayerKind::Fill];
    *fill = LayerData::with_capacity(fill.config, points.len());
    for (i, p) in points.iter().enumerate() {
        let luma = if range > f32::EPSILON {
            1.0 - (p.z - min_z) / range
        } else {
            1.0
        };
        fill.push(
            Particle {
                position: p.to_array(),
                color: [1.0, 1.0, 1.0],
                luma,
                alpha: 1.0,
                edge_weight: 0.0,
            },
            i as f32 / points.len().max(1) as f32,
        );
    }
    data
}
