//! TFPC: layered particle cloud format for baked hero visuals.
//!
//! - Three particle layers (contour, fill, highlight) stored back to back so a
//!   renderer can upload one buffer and pick per-layer draw ranges.
//! - Art-direction and per-layer configs travel with the particles.
//! - Per-particle seeds are not stored; they are regenerated on every decode.
//!
//! File layout (little-endian, fixed offsets):
//!   000 : [u8;4]  magic = b"TFPC"
//!   004 : u32     version = 1
//!   008 : u32     total_count (== contour + fill + highlight)
//!   00C : u32     contour_count
//!   010 : u32     fill_count
//!   014 : u32     highlight_count
//!   018 : u32     image_width
//!   01C : u32     image_height
//!   020 : [u8;32] reserved
//!   040 : art direction (48 bytes)
//!         f32 contrast, f32 gamma, f32 depth_scale, f32 depth_gamma,
//!         u8 depth_invert + 3 pad, f32 luma_threshold, f32 alpha_threshold, pad
//!   070 : 3 x layer config (48 bytes each, contour, fill, highlight)
//!         u8 enabled + 3 pad, f32 weight, f32 importance_edge_bias,
//!         f32 min_alpha, f32 min_luma, f32 min_edge, f32 opacity_multiplier,
//!         f32 size_multiplier, u8 color_mode (0 image, 1 tint), pad
//!   100 : payload, 36 bytes per particle, contour first then fill then highlight:
//!         f32 px, py, pz, r, g, b, luma, alpha, edge_weight
//!
//! Any change to field order is a version bump.

pub mod codec;
pub mod error;
pub mod io;
pub mod model;

pub use codec::{
    decode_tfpc, encode_tfpc, estimate_tfpc_size, has_tfpc_magic, validate_upload, DecodedTfpc,
    BYTES_PER_PARTICLE, PAYLOAD_OFFSET, TFPC_MAGIC, TFPC_VERSION,
};
pub use error::{Result, TfpcError};
#[cfg(feature = "remote")]
pub use io::load_tfpc;
pub use io::{read_file, write_file};
pub use model::{
    ArtDirectionConfig, ColorMode, LayerConfig, LayerConfigPatch, LayerData, LayerKind,
    LayeredParticleData, Particle, PerLayer,
};

/// File extension for baked assets.
pub const TFPC_EXTENSION: &str = "tfpc";

/// Content type used when uploading baked assets.
pub const TFPC_CONTENT_TYPE: &str = "application/octet-stream";

/// Human-readable size for UI display: bytes, then KB with one decimal, then
/// MB with two decimals (1024-based).
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}
