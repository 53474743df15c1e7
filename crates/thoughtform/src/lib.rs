//! Deterministic particle geometry for thoughtform visuals.
//!
//! - [`rng`]: Mulberry32 generator plus seed hashing helpers.
//! - [`shapes`]: catalog of named point-cloud generators with legacy id remapping.
//! - [`projection`]: rotation and perspective projection to canvas space.
//! - [`sampler`]: bakes an image into a layered cloud ready for the TFPC codec.

pub mod projection;
pub mod rng;
pub mod sampler;
pub mod shapes;

pub use projection::{
    depth_bounds, depth_to_alpha, depth_to_size, project_point, project_points,
    project_visible_sorted, sort_by_depth, to_sigil_points, ProjectedPoint, ProjectionConfig,
    ProjectionMode, Rotation, SigilOptions, SigilPoint,
};
pub use rng::{combine_seed, hash_string, SeededRng};
pub use sampler::{sample_layers, SampleError, SamplerOptions, SourceImage};
pub use shapes::{
    ShapeCategory, ShapeDefinition, ShapeGeneratorFn, ShapeOption, ShapeRegistry, ShapeSource,
    DEFAULT_SHAPE_ID, LEGACY_SHAPE_MAP,
};

/// Generator output type.
pub type Point3 = glam::Vec3;

/// Resolve `id` through `registry` and generate `point_count` points.
pub fn generate_shape(
    registry: &ShapeRegistry,
    id: &str,
    seed: u32,
    point_count: usize,
    size: f32,
) -> Vec<Point3> {
    registry.generate(id, seed, point_count, size)
}
