//! In-memory model of a layered particle cloud.
//!
//! A cloud is split into three layers that are always stored and serialized in
//! the same order: contour, fill, highlight. Each layer keeps its particle
//! attributes as parallel, tightly packed `f32` arrays so they can be uploaded
//! to a GPU buffer without reshuffling.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the three fixed particle layers. The discriminant is the layer's
/// position in every serialized structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LayerKind {
    Contour = 0,
    Fill = 1,
    Highlight = 2,
}

impl LayerKind {
    /// All layers in serialization order.
    pub const ALL: [LayerKind; 3] = [LayerKind::Contour, LayerKind::Fill, LayerKind::Highlight];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Contour => "contour",
            LayerKind::Fill => "fill",
            LayerKind::Highlight => "highlight",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a layer's particles are colored at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ColorMode {
    /// Use the color sampled from the source image.
    #[default]
    Image = 0,
    /// Use a single configured tint for the whole layer.
    Tint = 1,
}

/// Per-layer tunables. Persisted verbatim in the TFPC layer-config block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerConfig {
    pub enabled: bool,
    /// Relative share of the total particle budget.
    pub weight: f32,
    /// 0 = uniform sampling, 1 = sampling density follows edge weight.
    pub importance_edge_bias: f32,
    pub min_alpha: f32,
    pub min_luma: f32,
    pub min_edge: f32,
    pub opacity_multiplier: f32,
    pub size_multiplier: f32,
    pub color_mode: ColorMode,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weight: 1.0,
            importance_edge_bias: 0.0,
            min_alpha: 0.1,
            min_luma: 0.0,
            min_edge: 0.0,
            opacity_multiplier: 1.0,
            size_multiplier: 1.0,
            color_mode: ColorMode::Image,
        }
    }
}

impl LayerConfig {
    /// Sensible starting point for each layer.
    pub fn preset(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Contour => Self {
                weight: 0.35,
                importance_edge_bias: 0.85,
                min_edge: 0.2,
                size_multiplier: 0.8,
                ..Self::default()
            },
            LayerKind::Fill => Self {
                weight: 0.5,
                importance_edge_bias: 0.1,
                opacity_multiplier: 0.7,
                ..Self::default()
            },
            LayerKind::Highlight => Self {
                weight: 0.15,
                min_luma: 0.75,
                opacity_multiplier: 1.2,
                size_multiplier: 1.4,
                ..Self::default()
            },
        }
    }
}

/// A partial [`LayerConfig`], as found in hand-written settings documents.
/// Fields left out keep the value of whatever config the patch is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerConfigPatch {
    pub enabled: Option<bool>,
    pub weight: Option<f32>,
    pub importance_edge_bias: Option<f32>,
    pub min_alpha: Option<f32>,
    pub min_luma: Option<f32>,
    pub min_edge: Option<f32>,
    pub opacity_multiplier: Option<f32>,
    pub size_multiplier: Option<f32>,
    pub color_mode: Option<ColorMode>,
}

impl LayerConfigPatch {
    pub fn apply(&self, base: LayerConfig) -> LayerConfig {
        LayerConfig {
            enabled: self.enabled.unwrap_or(base.enabled),
            weight: self.weight.unwrap_or(base.weight),
            importance_edge_bias: self.importance_edge_bias.unwrap_or(base.importance_edge_bias),
            min_alpha: self.min_alpha.unwrap_or(base.min_alpha),
            min_luma: self.min_luma.unwrap_or(base.min_luma),
            min_edge: self.min_edge.unwrap_or(base.min_edge),
            opacity_multiplier: self.opacity_multiplier.unwrap_or(base.opacity_multiplier),
            size_multiplier: self.size_multiplier.unwrap_or(base.size_multiplier),
            color_mode: self.color_mode.unwrap_or(base.color_mode),
        }
    }
}

/// Global tone-mapping parameters applied before layer classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtDirectionConfig {
    pub contrast: f32,
    pub gamma: f32,
    pub depth_scale: f32,
    pub depth_gamma: f32,
    pub depth_invert: bool,
    pub luma_threshold: f32,
    pub alpha_threshold: f32,
}

impl Default for ArtDirectionConfig {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            gamma: 1.0,
            depth_scale: 0.5,
            depth_gamma: 1.0,
            depth_invert: false,
            luma_threshold: 0.0,
            alpha_threshold: 0.05,
        }
    }
}

/// A value per layer, indexable by [`LayerKind`]. Layers missing from a
/// serialized document deserialize to `T::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerLayer<T> {
    #[serde(default)]
    pub contour: T,
    #[serde(default)]
    pub fill: T,
    #[serde(default)]
    pub highlight: T,
}

impl<T> PerLayer<Option<T>> {
    /// Takes each present value, falling back to `base` for absent layers.
    pub fn or(self, base: PerLayer<T>) -> PerLayer<T> {
        PerLayer {
            contour: self.contour.unwrap_or(base.contour),
            fill: self.fill.unwrap_or(base.fill),
            highlight: self.highlight.unwrap_or(base.highlight),
        }
    }
}

impl<T> PerLayer<T> {
    pub fn from_fn(mut f: impl FnMut(LayerKind) -> T) -> Self {
        Self {
            contour: f(LayerKind::Contour),
            fill: f(LayerKind::Fill),
            highlight: f(LayerKind::Highlight),
        }
    }

    /// Iterate `(kind, value)` in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (LayerKind, &T)> {
        LayerKind::ALL.into_iter().map(move |k| (k, &self[k]))
    }

    pub fn map<U>(&self, mut f: impl FnMut(LayerKind, &T) -> U) -> PerLayer<U> {
        PerLayer::from_fn(|k| f(k, &self[k]))
    }
}

impl<T> Index<LayerKind> for PerLayer<T> {
    type Output = T;

    fn index(&self, kind: LayerKind) -> &T {
        match kind {
            LayerKind::Contour => &self.contour,
            LayerKind::Fill => &self.fill,
            LayerKind::Highlight => &self.highlight,
        }
    }
}

impl<T> IndexMut<LayerKind> for PerLayer<T> {
    fn index_mut(&mut self, kind: LayerKind) -> &mut T {
        match kind {
            LayerKind::Contour => &mut self.contour,
            LayerKind::Fill => &mut self.fill,
            LayerKind::Highlight => &mut self.highlight,
        }
    }
}

/// Particles of a single layer as parallel arrays.
///
/// `positions` and `colors` hold three floats per particle, the remaining
/// arrays one. `seed` is runtime-only animation input and is never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerData {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub luma: Vec<f32>,
    pub alpha: Vec<f32>,
    pub edge_weight: Vec<f32>,
    pub seed: Vec<f32>,
    pub config: LayerConfig,
}

/// A single particle's persisted attributes, used when building layers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub luma: f32,
    pub alpha: f32,
    pub edge_weight: f32,
}

impl LayerData {
    pub fn with_config(config: LayerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_capacity(config: LayerConfig, n: usize) -> Self {
        Self {
            positions: Vec::with_capacity(n * 3),
            colors: Vec::with_capacity(n * 3),
            luma: Vec::with_capacity(n),
            alpha: Vec::with_capacity(n),
            edge_weight: Vec::with_capacity(n),
            seed: Vec::with_capacity(n),
            config,
        }
    }

    /// Number of particles, taken from the `luma` array.
    #[inline]
    pub fn count(&self) -> usize {
        self.luma.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.luma.is_empty()
    }

    pub fn push(&mut self, p: Particle, seed: f32) {
        self.positions.extend_from_slice(&p.position);
        self.colors.extend_from_slice(&p.color);
        self.luma.push(p.luma);
        self.alpha.push(p.alpha);
        self.edge_weight.push(p.edge_weight);
        self.seed.push(seed);
    }

    /// Returns the persisted attributes of particle `i`.
    pub fn particle(&self, i: usize) -> Option<Particle> {
        if i >= self.count() {
            return None;
        }

        let p = &self.positions[i * 3..i * 3 + 3];
        let c = &self.colors[i * 3..i * 3 + 3];

        Some(Particle {
            position: [p[0], p[1], p[2]],
            color: [c[0], c[1], c[2]],
            luma: self.luma[i],
            alpha: self.alpha[i],
            edge_weight: self.edge_weight[i],
        })
    }

    /// Checks that every parallel array agrees with `count()`.
    /// `seed` may be empty (not yet generated) or full length.
    pub fn shape_error(&self) -> Option<String> {
        let n = self.count();
        let checks = [
            ("positions", self.positions.len(), n * 3),
            ("colors", self.colors.len(), n * 3),
            ("alpha", self.alpha.len(), n),
            ("edgeWeight", self.edge_weight.len(), n),
        ];

        for (name, got, want) in checks {
            if got != want {
                return Some(format!("{name} has {got} values, expected {want}"));
            }
        }

        if !self.seed.is_empty() && self.seed.len() != n {
            return Some(format!("seed has {} values, expected 0 or {n}", self.seed.len()));
        }

        None
    }
}

/// The aggregate root written to and read from TFPC blobs.
///
/// The total particle count is always derived from the layers, so it cannot
/// drift from the sum of the per-layer counts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayeredParticleData {
    pub layers: PerLayer<LayerData>,
    pub image_width: u32,
    pub image_height: u32,
    pub art_direction: ArtDirectionConfig,
}

impl LayeredParticleData {
    pub fn new(image_width: u32, image_height: u32, art_direction: ArtDirectionConfig) -> Self {
        Self {
            layers: PerLayer::from_fn(|k| LayerData::with_config(LayerConfig::preset(k))),
            image_width,
            image_height,
            art_direction,
        }
    }

    #[inline]
    pub fn total_count(&self) -> usize {
        self.layers.contour.count() + self.layers.fill.count() + self.layers.highlight.count()
    }

    pub fn counts(&self) -> PerLayer<u32> {
        self.layers.map(|_, l| l.count() as u32)
    }

    pub fn layer_configs(&self) -> PerLayer<LayerConfig> {
        self.layers.map(|_, l| l.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(v: f32) -> Particle {
        Particle {
            position: [v, -v, 0.5],
            color: [0.1, 0.2, 0.3],
            luma: v,
            alpha: 1.0,
            edge_weight: 0.25,
        }
    }

    #[test]
    fn total_count_tracks_layers() {
        let mut data = LayeredParticleData::new(4, 4, ArtDirectionConfig::default());
        data.layers.contour.push(particle(0.1), 0.0);
        data.layers.fill.push(particle(0.2), 0.0);
        data.layers.fill.push(particle(0.3), 0.0);

        assert_eq!(data.total_count(), 3);
        assert_eq!(data.counts(), PerLayer { contour: 1, fill: 2, highlight: 0 });
    }

    #[test]
    fn particle_reads_back_pushed_values() {
        let mut layer = LayerData::default();
        layer.push(particle(0.4), 0.9);

        assert_eq!(layer.particle(0), Some(particle(0.4)));
        assert_eq!(layer.particle(1), None);
        assert!(layer.shape_error().is_none());
    }

    #[test]
    fn shape_error_reports_ragged_arrays() {
        let mut layer = LayerData::default();
        layer.push(particle(0.4), 0.9);
        layer.colors.pop();

        let msg = layer.shape_error().expect("ragged colors must be reported");
        assert!(msg.contains("colors"));
    }

    #[test]
    fn layer_config_json_uses_camel_case() {
        let cfg: LayerConfig =
            serde_json::from_str(r#"{"minEdge":0.4,"colorMode":"tint"}"#).unwrap();

        assert_eq!(cfg.min_edge, 0.4);
        assert_eq!(cfg.color_mode, ColorMode::Tint);
        assert!(cfg.enabled);
    }

    #[test]
    fn patch_keeps_unset_fields_of_base() {
        let patch: LayerConfigPatch = serde_json::from_str(r#"{"minEdge":0.3}"#).unwrap();
        let base = LayerConfig::preset(LayerKind::Contour);
        let merged = patch.apply(base);

        assert_eq!(merged.min_edge, 0.3);
        assert_eq!(merged.weight, base.weight);
        assert_eq!(merged.importance_edge_bias, base.importance_edge_bias);
    }

    #[test]
    fn per_layer_fills_missing_layers() {
        let partial: PerLayer<Option<[f32; 3]>> =
            serde_json::from_str(r#"{"fill":[1.0,0.0,0.0]}"#).unwrap();
        let merged = partial.or(PerLayer::from_fn(|_| [0.5; 3]));

        assert_eq!(merged.fill, [1.0, 0.0, 0.0]);
        assert_eq!(merged.contour, [0.5; 3]);
        assert_eq!(merged.highlight, [0.5; 3]);
    }
}
