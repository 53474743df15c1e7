//! Shape catalog: named, deterministic point-cloud generators.
//!
//! A registry is built once (usually [`ShapeRegistry::builtin`]) and then
//! shared read-only. Lookups never fail: unknown ids are remapped through the
//! legacy table and finally fall back to [`DEFAULT_SHAPE_ID`].

mod geometric;
mod thoughtforms;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// `(seed, point_count, size) -> points`. Must be pure and return exactly
/// `point_count` points.
pub type ShapeGeneratorFn = fn(u32, usize, f32) -> Vec<Vec3>;

pub const DEFAULT_SHAPE_ID: &str = "sphere";

/// Ids that existed in older saved pages, mapped to their current shape.
pub const LEGACY_SHAPE_MAP: &[(&str, &str)] = &[
    ("star4", "tf_filamentField"),
    ("star6", "tf_starburst"),
    ("circle", "ring"),
    ("triangle", "tetrahedron"),
    ("square", "cube"),
    ("hexagon", "tf_seedOfLife"),
    ("spiral2d", "spiral"),
    ("eye", "tf_vortex"),
    ("knot", "tf_torusKnot"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeCategory {
    Geometric,
    Thoughtform,
}

#[derive(Debug, Clone, Copy)]
pub struct ShapeDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub category: ShapeCategory,
    pub generate: ShapeGeneratorFn,
    /// False for flat shapes whose points all sit at z = 0.
    pub has_3d_depth: bool,
}

/// Where a resolved id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeSource {
    Registered,
    Legacy,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedShape {
    pub id: &'static str,
    pub source: ShapeSource,
}

/// Entry for shape pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeOption {
    pub id: &'static str,
    pub label: &'static str,
    pub category: ShapeCategory,
}

#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    shapes: Vec<ShapeDefinition>,
    index: HashMap<&'static str, usize>,
}

impl ShapeRegistry {
    /// An empty registry; useful for tests and custom catalogs.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full built-in catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for def in geometric::definitions()
            .into_iter()
            .chain(thoughtforms::definitions())
        {
            registry.register(def);
        }
        registry
    }

    /// Adds `def`; a definition with the same id is replaced in place.
    pub fn register(&mut self, def: ShapeDefinition) {
        match self.index.get(def.id) {
            Some(&i) => self.shapes[i] = def,
            None => {
                self.index.insert(def.id, self.shapes.len());
                self.shapes.push(def);
            }
        }
    }

    pub fn get_shape(&self, id: &str) -> Option<&ShapeDefinition> {
        self.index.get(id).map(|&i| &self.shapes[i])
    }

    #[inline]
    pub fn is_valid_shape(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// True iff `id` is only known through the legacy remap table.
    pub fn is_legacy_shape(&self, id: &str) -> bool {
        !self.is_valid_shape(id) && legacy_target(id).is_some()
    }

    /// Registered id → itself; legacy id → its replacement; anything else →
    /// the default shape.
    pub fn resolve(&self, id: &str) -> ResolvedShape {
        if let Some(def) = self.get_shape(id) {
            return ResolvedShape {
                id: def.id,
                source: ShapeSource::Registered,
            };
        }

        if let Some(target) = legacy_target(id) {
            if let Some(def) = self.get_shape(target) {
                log::debug!("shape id '{id}' is legacy, using '{}'", def.id);
                return ResolvedShape {
                    id: def.id,
                    source: ShapeSource::Legacy,
                };
            }
        }

        log::warn!("unknown shape id '{id}', substituting '{DEFAULT_SHAPE_ID}'");
        ResolvedShape {
            id: DEFAULT_SHAPE_ID,
            source: ShapeSource::Fallback,
        }
    }

    #[inline]
    pub fn resolve_shape_id(&self, id: &str) -> &'static str {
        self.resolve(id).id
    }

    /// Generator for `id`, never failing. Falls back to the built-in sphere if
    /// even the default id is missing from a custom registry.
    pub fn get_shape_generator(&self, id: &str) -> ShapeGeneratorFn {
        let resolved = self.resolve(id);
        self.get_shape(resolved.id)
            .map(|def| def.generate)
            .unwrap_or(geometric::sphere as ShapeGeneratorFn)
    }

    /// Resolve `id` and run its generator.
    pub fn generate(&self, id: &str, seed: u32, point_count: usize, size: f32) -> Vec<Vec3> {
        (self.get_shape_generator(id))(seed, point_count, size)
    }

    /// Definitions in registration order.
    pub fn get_all_shapes(&self) -> &[ShapeDefinition] {
        &self.shapes
    }

    pub fn get_shapes_by_category(&self, category: ShapeCategory) -> Vec<&ShapeDefinition> {
        self.shapes
            .iter()
            .filter(|d| d.category == category)
            .collect()
    }

    pub fn get_all_shape_ids(&self) -> Vec<&'static str> {
        self.shapes.iter().map(|d| d.id).collect()
    }

    pub fn get_shape_labels(&self) -> BTreeMap<&'static str, &'static str> {
        self.shapes.iter().map(|d| (d.id, d.label)).collect()
    }

    /// Picker entries sorted by category, then id.
    pub fn sigil_shape_options(&self) -> Vec<ShapeOption> {
        let mut options: Vec<ShapeOption> = self
            .shapes
            .iter()
            .map(|d| ShapeOption {
                id: d.id,
                label: d.label,
                category: d.category,
            })
            .collect();
        options.sort_by(|a, b| (a.category, a.id).cmp(&(b.category, b.id)));
        options
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

fn legacy_target(id: &str) -> Option<&'static str> {
    LEGACY_SHAPE_MAP
        .iter()
        .find(|(legacy, _)| *legacy == id)
        .map(|&(_, target)| target)
}

/// Small isotropic jitter shared by several generators.
#[inline]
pub(crate) fn jitter(rng: &mut crate::rng::SeededRng, amount: f64) -> Vec3 {
    Vec3::new(
        rng.gaussian(0.0, amount) as f32,
        rng.gaussian(0.0, amount) as f32,
        rng.gaussian(0.0, amount) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(_seed: u32, n: usize, size: f32) -> Vec<Vec3> {
        vec![Vec3::splat(size); n]
    }

    #[test]
    fn builtin_has_both_categories() {
        let registry = ShapeRegistry::builtin();
        assert!(!registry.get_shapes_by_category(ShapeCategory::Geometric).is_empty());
        assert!(!registry.get_shapes_by_category(ShapeCategory::Thoughtform).is_empty());
        assert!(registry.is_valid_shape(DEFAULT_SHAPE_ID));
    }

    #[test]
    fn legacy_targets_are_all_registered() {
        let registry = ShapeRegistry::builtin();
        for (legacy, target) in LEGACY_SHAPE_MAP {
            assert!(registry.is_valid_shape(target), "{legacy} -> {target}");
            assert!(registry.is_legacy_shape(legacy));
            assert_eq!(registry.resolve(legacy).source, ShapeSource::Legacy);
        }
    }

    #[test]
    fn resolve_prefers_registered_then_legacy_then_default() {
        let registry = ShapeRegistry::builtin();
        assert_eq!(registry.resolve_shape_id("torus"), "torus");
        assert_eq!(registry.resolve_shape_id("star4"), "tf_filamentField");
        assert_eq!(
            registry.resolve("definitely-not-a-shape"),
            ResolvedShape {
                id: DEFAULT_SHAPE_ID,
                source: ShapeSource::Fallback
            }
        );
    }

    #[test]
    fn registered_id_shadows_legacy_entry() {
        let mut registry = ShapeRegistry::builtin();
        registry.register(ShapeDefinition {
            id: "star4",
            label: "Star",
            category: ShapeCategory::Geometric,
            generate: flat,
            has_3d_depth: false,
        });

        assert!(!registry.is_legacy_shape("star4"));
        assert_eq!(registry.resolve_shape_id("star4"), "star4");
    }

    #[test]
    fn register_overwrites_in_place() {
        let mut registry = ShapeRegistry::builtin();
        let before = registry.len();
        let position = registry.get_all_shape_ids().iter().position(|id| *id == "cube");

        registry.register(ShapeDefinition {
            id: "cube",
            label: "Flat cube",
            category: ShapeCategory::Geometric,
            generate: flat,
            has_3d_depth: false,
        });

        assert_eq!(registry.len(), before);
        assert_eq!(
            registry.get_all_shape_ids().iter().position(|id| *id == "cube"),
            position
        );
        assert_eq!(registry.get_shape_labels()["cube"], "Flat cube");
        assert_eq!(registry.generate("cube", 1, 2, 3.0), vec![Vec3::splat(3.0); 2]);
    }

    #[test]
    fn empty_registry_still_yields_a_generator() {
        let registry = ShapeRegistry::new();
        let points = registry.generate("anything", 4, 10, 1.0);
        assert_eq!(points.len(), 10);
    }

    #[test]
    fn options_are_sorted() {
        let options = ShapeRegistry::builtin().sigil_shape_options();
        let mut sorted = options.clone();
        sorted.sort_by(|a, b| (a.category, a.id).cmp(&(b.category, b.id)));
        assert_eq!(options, sorted);
        assert_eq!(options.first().map(|o| o.category), Some(ShapeCategory::Geometric));
    }
}
