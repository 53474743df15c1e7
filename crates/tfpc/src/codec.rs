//! TFPC encode/decode over contiguous byte buffers.

use crate::error::{Result, TfpcError};
use crate::model::{
    ArtDirectionConfig, ColorMode, LayerConfig, LayerData, LayerKind, LayeredParticleData, PerLayer,
};
use bytemuck::{Pod, Zeroable};
use rand::Rng;

pub const TFPC_MAGIC: [u8; 4] = *b"TFPC";
pub const TFPC_VERSION: u32 = 1;

pub const HEADER_SIZE: usize = 64;
pub const ART_DIRECTION_SIZE: usize = 48;
pub const LAYER_CONFIG_SIZE: usize = 48;
pub const LAYER_CONFIGS_SIZE: usize = 3 * LAYER_CONFIG_SIZE;
pub const BYTES_PER_PARTICLE: usize = 36;

pub const ART_DIRECTION_OFFSET: usize = HEADER_SIZE;
pub const LAYER_CONFIGS_OFFSET: usize = ART_DIRECTION_OFFSET + ART_DIRECTION_SIZE;
pub const PAYLOAD_OFFSET: usize = LAYER_CONFIGS_OFFSET + LAYER_CONFIGS_SIZE;

/// One particle as laid out in the payload: 9 little-endian f32.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ParticleRecord {
    position: [f32; 3],
    color: [f32; 3],
    luma: f32,
    alpha: f32,
    edge_weight: f32,
}

const _: () = assert!(std::mem::size_of::<ParticleRecord>() == BYTES_PER_PARTICLE);

/// Exact encoded size for `particle_count` particles.
#[inline]
pub const fn estimate_tfpc_size(particle_count: u64) -> u64 {
    PAYLOAD_OFFSET as u64 + particle_count * BYTES_PER_PARTICLE as u64
}

/// True if `bytes` starts with the TFPC magic. Upload endpoints use this
/// before accepting a file; the decoder applies the same check.
#[inline]
pub fn has_tfpc_magic(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[..4] == TFPC_MAGIC
}

/// Rejects a received upload unless it carries the TFPC magic.
pub fn validate_upload(bytes: &[u8]) -> Result<()> {
    if bytes.len() < 4 {
        return Err(TfpcError::Truncated {
            needed: 4,
            available: bytes.len(),
        });
    }

    if !has_tfpc_magic(bytes) {
        return Err(bad_magic(bytes));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Serialize `data` into a freshly allocated TFPC blob.
pub fn encode_tfpc(data: &LayeredParticleData) -> Result<Vec<u8>> {
    for (kind, layer) in data.layers.iter() {
        if let Some(detail) = layer.shape_error() {
            return Err(TfpcError::LayerShape {
                layer: kind.name(),
                detail,
            });
        }
    }

    let total = data.total_count();
    let total_u32 =
        u32::try_from(total).map_err(|_| TfpcError::TooManyParticles { count: total })?;

    let size = estimate_tfpc_size(total as u64) as usize;
    let mut out = Vec::<u8>::with_capacity(size);

    // Header
    out.extend_from_slice(&TFPC_MAGIC);
    put_u32(&mut out, TFPC_VERSION);
    put_u32(&mut out, total_u32);
    for (_, layer) in data.layers.iter() {
        put_u32(&mut out, layer.count() as u32);
    }
    put_u32(&mut out, data.image_width);
    put_u32(&mut out, data.image_height);
    pad_to(&mut out, ART_DIRECTION_OFFSET);

    // Art direction
    let ad = &data.art_direction;
    put_f32(&mut out, ad.contrast);
    put_f32(&mut out, ad.gamma);
    put_f32(&mut out, ad.depth_scale);
    put_f32(&mut out, ad.depth_gamma);
    put_bool_padded(&mut out, ad.depth_invert);
    put_f32(&mut out, ad.luma_threshold);
    put_f32(&mut out, ad.alpha_threshold);
    pad_to(&mut out, LAYER_CONFIGS_OFFSET);

    // Layer configs
    for (kind, layer) in data.layers.iter() {
        let c = &layer.config;
        put_bool_padded(&mut out, c.enabled);
        put_f32(&mut out, c.weight);
        put_f32(&mut out, c.importance_edge_bias);
        put_f32(&mut out, c.min_alpha);
        put_f32(&mut out, c.min_luma);
        put_f32(&mut out, c.min_edge);
        put_f32(&mut out, c.opacity_multiplier);
        put_f32(&mut out, c.size_multiplier);
        out.push(c.color_mode as u8);
        pad_to(&mut out, LAYER_CONFIGS_OFFSET + (kind.index() + 1) * LAYER_CONFIG_SIZE);
    }

    // Payload: contour, fill, highlight
    for (_, layer) in data.layers.iter() {
        for i in 0..layer.count() {
            for v in &layer.positions[i * 3..i * 3 + 3] {
                put_f32(&mut out, *v);
            }
            for v in &layer.colors[i * 3..i * 3 + 3] {
                put_f32(&mut out, *v);
            }
            put_f32(&mut out, layer.luma[i]);
            put_f32(&mut out, layer.alpha[i]);
            put_f32(&mut out, layer.edge_weight[i]);
        }
    }

    debug_assert_eq!(out.len(), size);
    log::debug!(
        "encoded TFPC: {} particles ({}/{}/{}), {} bytes",
        total,
        data.layers.contour.count(),
        data.layers.fill.count(),
        data.layers.highlight.count(),
        out.len()
    );

    Ok(out)
}

#[inline]
fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[inline]
fn put_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// 1-byte bool followed by 3 bytes of alignment padding.
#[inline]
fn put_bool_padded(out: &mut Vec<u8>, v: bool) {
    out.extend_from_slice(&[v as u8, 0, 0, 0]);
}

#[inline]
fn pad_to(out: &mut Vec<u8>, offset: usize) {
    debug_assert!(out.len() <= offset);
    out.resize(offset, 0);
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Result of decoding a TFPC blob.
///
/// Attribute arrays are concatenated in layer order so a renderer can upload
/// them once and select layers with [`DecodedTfpc::draw_range`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTfpc {
    pub version: u32,
    pub total_count: u32,
    pub counts: PerLayer<u32>,
    /// Start index (in particles) of each layer within the concatenated arrays.
    pub offsets: PerLayer<u32>,
    pub image_width: u32,
    pub image_height: u32,
    pub art_direction: ArtDirectionConfig,
    pub layer_configs: PerLayer<LayerConfig>,
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub luma: Vec<f32>,
    pub alpha: Vec<f32>,
    pub edge_weight: Vec<f32>,
    /// Regenerated on every decode; not part of the file.
    pub seed: Vec<f32>,
}

impl DecodedTfpc {
    /// `(start, count)` of `kind` scaled by `density` in [0, 1].
    pub fn draw_range(&self, kind: LayerKind, density: f32) -> (u32, u32) {
        let count = self.counts[kind];
        let density = if density.is_finite() { density.clamp(0.0, 1.0) } else { 0.0 };
        let n = ((count as f64) * density as f64).floor() as u32;
        (self.offsets[kind], n.min(count))
    }

    /// Split the concatenated arrays back into per-layer data.
    pub fn into_layered(self) -> LayeredParticleData {
        let slice_layer = |kind: LayerKind| {
            let start = self.offsets[kind] as usize;
            let end = start + self.counts[kind] as usize;
            LayerData {
                positions: self.positions[start * 3..end * 3].to_vec(),
                colors: self.colors[start * 3..end * 3].to_vec(),
                luma: self.luma[start..end].to_vec(),
                alpha: self.alpha[start..end].to_vec(),
                edge_weight: self.edge_weight[start..end].to_vec(),
                seed: self.seed[start..end].to_vec(),
                config: self.layer_configs[kind],
            }
        };

        LayeredParticleData {
            layers: PerLayer::from_fn(slice_layer),
            image_width: self.image_width,
            image_height: self.image_height,
            art_direction: self.art_direction,
        }
    }
}

#[inline(always)]
fn need(buf: &[u8], want: usize) -> Result<()> {
    if buf.len() < want {
        Err(TfpcError::Truncated {
            needed: want,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

#[inline(always)]
fn take<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    need(buf, n)?;
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

#[inline(always)]
fn le_u32(buf: &mut &[u8]) -> Result<u32> {
    let b = take(buf, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

#[inline(always)]
fn le_f32(buf: &mut &[u8]) -> Result<f32> {
    let b = take(buf, 4)?;
    Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Bool byte plus its 3 pad bytes.
#[inline(always)]
fn le_bool_padded(buf: &mut &[u8]) -> Result<bool> {
    Ok(take(buf, 4)?[0] != 0)
}

#[cold]
fn bad_magic(bytes: &[u8]) -> TfpcError {
    let mut found = [0u8; 4];
    found.copy_from_slice(&bytes[..4]);
    TfpcError::BadMagic { found }
}

fn read_art_direction(mut p: &[u8]) -> Result<ArtDirectionConfig> {
    Ok(ArtDirectionConfig {
        contrast: le_f32(&mut p)?,
        gamma: le_f32(&mut p)?,
        depth_scale: le_f32(&mut p)?,
        depth_gamma: le_f32(&mut p)?,
        depth_invert: le_bool_padded(&mut p)?,
        luma_threshold: le_f32(&mut p)?,
        alpha_threshold: le_f32(&mut p)?,
    })
}

fn read_layer_config(mut p: &[u8]) -> Result<LayerConfig> {
    Ok(LayerConfig {
        enabled: le_bool_padded(&mut p)?,
        weight: le_f32(&mut p)?,
        importance_edge_bias: le_f32(&mut p)?,
        min_alpha: le_f32(&mut p)?,
        min_luma: le_f32(&mut p)?,
        min_edge: le_f32(&mut p)?,
        opacity_multiplier: le_f32(&mut p)?,
        size_multiplier: le_f32(&mut p)?,
        color_mode: if take(&mut p, 1)?[0] == 1 {
            ColorMode::Tint
        } else {
            ColorMode::Image
        },
    })
}

/// Parse a TFPC blob. This is the single source of truth for parsing.
///
/// Magic and version are checked before anything else, and the buffer length
/// is checked against the declared counts before any particle array is
/// allocated.
pub fn decode_tfpc(buf: &[u8]) -> Result<DecodedTfpc> {
    let mut p = buf;

    // Header
    need(p, 4)?;
    if !has_tfpc_magic(p) {
        return Err(bad_magic(p));
    }
    take(&mut p, 4)?;

    let version = le_u32(&mut p)?;
    if version != TFPC_VERSION {
        return Err(TfpcError::UnsupportedVersion {
            found: version,
            supported: TFPC_VERSION,
        });
    }

    need(buf, PAYLOAD_OFFSET)?;

    let total_count = le_u32(&mut p)?;
    let counts = PerLayer {
        contour: le_u32(&mut p)?,
        fill: le_u32(&mut p)?,
        highlight: le_u32(&mut p)?,
    };
    let image_width = le_u32(&mut p)?;
    let image_height = le_u32(&mut p)?;

    let sum = counts.contour as u64 + counts.fill as u64 + counts.highlight as u64;
    if sum != total_count as u64 {
        return Err(TfpcError::CountMismatch {
            total: total_count,
            sum,
        });
    }

    let art_direction =
        read_art_direction(&buf[ART_DIRECTION_OFFSET..ART_DIRECTION_OFFSET + ART_DIRECTION_SIZE])?;

    let layer_configs = PerLayer::from_fn(|kind| {
        let start = LAYER_CONFIGS_OFFSET + kind.index() * LAYER_CONFIG_SIZE;
        read_layer_config(&buf[start..start + LAYER_CONFIG_SIZE])
    });
    let layer_configs = PerLayer {
        contour: layer_configs.contour?,
        fill: layer_configs.fill?,
        highlight: layer_configs.highlight?,
    };

    // Payload
    let n = total_count as usize;
    let payload_len = n
        .checked_mul(BYTES_PER_PARTICLE)
        .and_then(|len| len.checked_add(PAYLOAD_OFFSET))
        .ok_or(TfpcError::TooManyParticles { count: n })?;
    need(buf, payload_len)?;
    let raw = &buf[PAYLOAD_OFFSET..payload_len];

    let mut positions = Vec::with_capacity(n * 3);
    let mut colors = Vec::with_capacity(n * 3);
    let mut luma = Vec::with_capacity(n);
    let mut alpha = Vec::with_capacity(n);
    let mut edge_weight = Vec::with_capacity(n);

    for chunk in raw.chunks_exact(BYTES_PER_PARTICLE) {
        let rec = read_record(chunk);
        positions.extend_from_slice(&rec.position);
        colors.extend_from_slice(&rec.color);
        luma.push(rec.luma);
        alpha.push(rec.alpha);
        edge_weight.push(rec.edge_weight);
    }

    let mut rng = rand::thread_rng();
    let seed: Vec<f32> = (0..n).map(|_| rng.gen::<f32>()).collect();

    let offsets = PerLayer {
        contour: 0,
        fill: counts.contour,
        highlight: counts.contour + counts.fill,
    };

    log::debug!(
        "decoded TFPC v{}: {} particles ({}/{}/{}), image {}x{}",
        version,
        total_count,
        counts.contour,
        counts.fill,
        counts.highlight,
        image_width,
        image_height
    );

    Ok(DecodedTfpc {
        version,
        total_count,
        counts,
        offsets,
        image_width,
        image_height,
        art_direction,
        layer_configs,
        positions,
        colors,
        luma,
        alpha,
        edge_weight,
        seed,
    })
}

#[cfg(target_endian = "little")]
#[inline(always)]
fn read_record(chunk: &[u8]) -> ParticleRecord {
    // The payload may start at any alignment (e.g. inside a larger download).
    bytemuck::pod_read_unaligned(chunk)
}

#[cfg(not(target_endian = "little"))]
#[inline(always)]
fn read_record(chunk: &[u8]) -> ParticleRecord {
    let f = |i: usize| {
        let b = &chunk[i * 4..i * 4 + 4];
        f32::from_le_bytes([b[0], b[1], b[2], b[3]])
    };

    ParticleRecord {
        position: [f(0), f(1), f(2)],
        color: [f(3), f(4), f(5)],
        luma: f(6),
        alpha: f(7),
        edge_weight: f(8),
    }
}
