//! Image → layered particle cloud.
//!
//! Every pixel is reduced to tone-mapped luma, alpha and an edge weight. Each
//! enabled layer then picks its share of the particle budget from the pixels
//! that pass its thresholds, biased towards edges by `importance_edge_bias`.
//! Sampling is driven by [`SeededRng`], so the same image and options always
//! bake to the same cloud.

use crate::rng::{combine_seed, hash_string, SeededRng};
use serde::{Deserialize, Deserializer, Serialize};
use tfpc::{
    ArtDirectionConfig, ColorMode, LayerConfig, LayerConfigPatch, LayerData, LayerKind,
    LayeredParticleData, Particle, PerLayer,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("image buffer has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// 8-bit RGBA pixels, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SourceImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, SampleError> {
        let image = Self {
            width,
            height,
            rgba,
        };
        image.validate()?;
        Ok(image)
    }

    pub fn validate(&self) -> Result<(), SampleError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.rgba.len() != expected {
            return Err(SampleError::BufferSize {
                width: self.width,
                height: self.height,
                expected,
                actual: self.rgba.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SamplerOptions {
    /// Total particles across all enabled layers.
    pub particle_budget: usize,
    pub seed: u32,
    pub art_direction: ArtDirectionConfig,
    /// Layers or fields left out of a document keep their preset values.
    #[serde(deserialize_with = "presets_with_overrides")]
    pub layer_configs: PerLayer<LayerConfig>,
    /// Linear RGB in [0, 1], used by layers with `ColorMode::Tint`.
    #[serde(deserialize_with = "default_tints_with_overrides")]
    pub tints: PerLayer<[f32; 3]>,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            particle_budget: 20_000,
            seed: 0,
            art_direction: ArtDirectionConfig::default(),
            layer_configs: PerLayer::from_fn(LayerConfig::preset),
            tints: default_tints(),
        }
    }
}

fn default_tints() -> PerLayer<[f32; 3]> {
    PerLayer {
        contour: [0.55, 0.75, 1.0],
        fill: [0.85, 0.85, 0.9],
        highlight: [1.0, 0.95, 0.8],
    }
}

fn presets_with_overrides<'de, D>(deserializer: D) -> Result<PerLayer<LayerConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let patches = PerLayer::<Option<LayerConfigPatch>>::deserialize(deserializer)?;
    Ok(PerLayer::from_fn(|kind| {
        let preset = LayerConfig::preset(kind);
        match &patches[kind] {
            Some(patch) => patch.apply(preset),
            None => preset,
        }
    }))
}

fn default_tints_with_overrides<'de, D>(deserializer: D) -> Result<PerLayer<[f32; 3]>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(PerLayer::<Option<[f32; 3]>>::deserialize(deserializer)?.or(default_tints()))
}

/// Per-pixel attributes after tone mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub luma: f32,
    pub alpha: f32,
    pub edge: f32,
}

/// Rec.709 luma of an sRGB triple in [0, 1].
#[inline]
pub fn rec709_luma(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Contrast around mid-grey, then `l^(1/gamma)`.
pub fn tone_map(luma: f32, art: &ArtDirectionConfig) -> f32 {
    let l = ((luma - 0.5) * art.contrast + 0.5).clamp(0.0, 1.0);
    if art.gamma > 0.0 && art.gamma != 1.0 {
        l.powf(1.0 / art.gamma)
    } else {
        l
    }
}

/// Luma, alpha and normalized Sobel edge weight for every pixel.
pub fn analyze(image: &SourceImage, art: &ArtDirectionConfig) -> Result<Vec<PixelSample>, SampleError> {
    image.validate()?;

    let w = image.width as usize;
    let h = image.height as usize;
    let raw: Vec<f32> = image
        .rgba
        .chunks_exact(4)
        .map(|px| rec709_luma(px[0] as f32 / 255.0, px[1] as f32 / 255.0, px[2] as f32 / 255.0))
        .collect();

    // clamp-to-edge addressing
    let at = |x: isize, y: isize| -> f32 {
        let x = x.clamp(0, w as isize - 1) as usize;
        let y = y.clamp(0, h as isize - 1) as usize;
        raw[y * w + x]
    };

    let mut magnitude = Vec::with_capacity(raw.len());
    let mut max_mag = 0.0f32;
    for y in 0..h as isize {
        for x in 0..w as isize {
            let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
            let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
            let m = (gx * gx + gy * gy).sqrt();
            max_mag = max_mag.max(m);
            magnitude.push(m);
        }
    }

    Ok(raw
        .iter()
        .zip(&magnitude)
        .zip(image.rgba.chunks_exact(4))
        .map(|((&l, &m), px)| PixelSample {
            luma: tone_map(l, art),
            alpha: px[3] as f32 / 255.0,
            edge: if max_mag > 0.0 {
                (m / max_mag).clamp(0.0, 1.0)
            } else {
                0.0
            },
        })
        .collect())
}

/// Splits `budget` across enabled layers in proportion to `weight`. Leftover
/// particles from rounding go to the largest fractional shares, earlier layers
/// winning ties.
pub fn layer_budgets(budget: usize, configs: &PerLayer<LayerConfig>) -> PerLayer<usize> {
    let weight = |c: &LayerConfig| {
        if c.enabled && c.weight > 0.0 {
            c.weight as f64
        } else {
            0.0
        }
    };

    let total: f64 = configs.iter().map(|(_, c)| weight(c)).sum();
    if total <= 0.0 || budget == 0 {
        return PerLayer::default();
    }

    let exact = configs.map(|_, c| budget as f64 * weight(c) / total);
    let mut out = exact.map(|_, e| e.floor() as usize);
    let assigned: usize = out.iter().map(|(_, n)| *n).sum();

    let mut order: Vec<LayerKind> = LayerKind::ALL
        .into_iter()
        .filter(|&k| weight(&configs[k]) > 0.0)
        .collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa).then(a.cmp(&b))
    });

    for kind in order.into_iter().cycle().take(budget.saturating_sub(assigned)) {
        out[kind] += 1;
    }
    out
}

/// Produce the layered cloud for `image`.
pub fn sample_layers(
    image: &SourceImage,
    options: &SamplerOptions,
) -> Result<LayeredParticleData, SampleError> {
    let art = &options.art_direction;
    let pixels = analyze(image, art)?;
    let budgets = layer_budgets(options.particle_budget, &options.layer_configs);

    let mut data = LayeredParticleData::new(image.width, image.height, *art);

    for kind in LayerKind::ALL {
        let config = options.layer_configs[kind];
        let layer = sample_layer(image, &pixels, kind, &config, budgets[kind], options);
        log::debug!(
            "layer {kind}: {} of {} requested particles",
            layer.count(),
            budgets[kind]
        );
        data.layers[kind] = layer;
    }

    Ok(data)
}

fn sample_layer(
    image: &SourceImage,
    pixels: &[PixelSample],
    kind: LayerKind,
    config: &LayerConfig,
    budget: usize,
    options: &SamplerOptions,
) -> LayerData {
    if !config.enabled || budget == 0 {
        return LayerData::with_config(*config);
    }

    let art = &options.art_direction;
    let mut rng = SeededRng::new(combine_seed(&[options.seed, hash_string(kind.name())]));

    // Efraimidis–Spirakis: key = ln(u) / w, keep the largest keys.
    let bias = config.importance_edge_bias.clamp(0.0, 1.0) as f64;
    let mut keyed: Vec<(f64, usize)> = pixels
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            p.luma >= art.luma_threshold
                && p.alpha >= art.alpha_threshold
                && p.alpha >= config.min_alpha
                && p.luma >= config.min_luma
                && p.edge >= config.min_edge
        })
        .map(|(i, p)| {
            let importance = ((1.0 - bias) + bias * p.edge as f64).max(1e-6);
            let u = 1.0 - rng.next_f64();
            (u.ln() / importance, i)
        })
        .collect();

    keyed.sort_unstable_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    keyed.truncate(budget);

    let w = image.width as f32;
    let h = image.height as f32;
    let scale = 2.0 / w.max(h);
    let tint = options.tints[kind];

    let mut layer = LayerData::with_capacity(*config, keyed.len());
    for (_, i) in keyed {
        let p = pixels[i];
        let px = (i % image.width as usize) as f32 + rng.next_f64() as f32;
        let py = (i / image.width as usize) as f32 + rng.next_f64() as f32;

        let mut depth = p.luma.powf(art.depth_gamma.max(1e-3));
        if art.depth_invert {
            depth = 1.0 - depth;
        }

        let color = match config.color_mode {
            ColorMode::Image => {
                let rgba = &image.rgba[i * 4..i * 4 + 3];
                [
                    rgba[0] as f32 / 255.0,
                    rgba[1] as f32 / 255.0,
                    rgba[2] as f32 / 255.0,
                ]
            }
            ColorMode::Tint => tint,
        };

        layer.push(
            Particle {
                position: [
                    (px - w * 0.5) * scale,
                    (h * 0.5 - py) * scale,
                    (depth - 0.5) * art.depth_scale,
                ],
                color,
                luma: p.luma,
                alpha: p.alpha,
                edge_weight: p.edge,
            },
            rng.next_f64() as f32,
        );
    }
    layer
}
