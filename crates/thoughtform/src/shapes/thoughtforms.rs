//! Organic and topological "thoughtform" shapes.

use super::{jitter, ShapeCategory, ShapeDefinition, ShapeGeneratorFn};
use crate::rng::SeededRng;
use glam::Vec3;
use std::f64::consts::{PI, TAU};

fn def(
    id: &'static str,
    label: &'static str,
    generate: ShapeGeneratorFn,
    has_3d_depth: bool,
) -> ShapeDefinition {
    ShapeDefinition {
        id,
        label,
        category: ShapeCategory::Thoughtform,
        generate,
        has_3d_depth,
    }
}

pub(super) fn definitions() -> Vec<ShapeDefinition> {
    vec![
        def("tf_filamentField", "Filament Field", filament_field, true),
        def("tf_torusKnot", "Torus Knot", torus_knot, true),
        def("tf_lissajous", "Lissajous Orbit", lissajous, true),
        def("tf_mobius", "Möbius Band", mobius, true),
        def("tf_vortex", "Vortex", vortex, true),
        def("tf_nebula", "Nebula", nebula, true),
        def("tf_seedOfLife", "Seed of Life", seed_of_life, false),
        def("tf_starburst", "Starburst", starburst, true),
    ]
}

/// Curved strands between random points on the sphere. Strand layout is
/// drawn first so it does not depend on `n`.
fn filament_field(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    const STRANDS: usize = 12;

    let mut rng = SeededRng::new(seed);
    let strands: Vec<[Vec3; 3]> = (0..STRANDS)
        .map(|_| {
            let a = rng.unit_sphere() * 0.9;
            let b = rng.unit_sphere() * 0.9;
            // control point pulled towards the centre bends the strand inward
            let c = (a + b) * 0.25 + rng.unit_ball() * 0.35;
            [a, c, b]
        })
        .collect();

    (0..n)
        .map(|i| {
            let [a, c, b] = strands[i % STRANDS];
            let t = rng.next_f64() as f32;
            let u = 1.0 - t;
            let p = a * (u * u) + c * (2.0 * u * t) + b * (t * t);
            (p + jitter(&mut rng, 0.012)) * size
        })
        .collect()
}

fn torus_knot(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    const P: f64 = 2.0;
    const Q: f64 = 3.0;

    let mut rng = SeededRng::new(seed);
    (0..n)
        .map(|_| {
            let t = rng.angle();
            let r = (Q * t).cos() + 2.0;
            let p = Vec3::new(
                (r * (P * t).cos() / 3.0) as f32,
                (r * (P * t).sin() / 3.0) as f32,
                (-(Q * t).sin() / 3.0) as f32,
            );
            (p + jitter(&mut rng, 0.02)) * size
        })
        .collect()
}

fn lissajous(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    let mut rng = SeededRng::new(seed);
    (0..n)
        .map(|_| {
            let t = rng.angle();
            let p = Vec3::new(
                (3.0 * t + PI / 2.0).sin() as f32,
                (2.0 * t).sin() as f32,
                ((5.0 * t).sin() * 0.6) as f32,
            );
            (p * 0.9 + jitter(&mut rng, 0.01)) * size
        })
        .collect()
}

fn mobius(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    let mut rng = SeededRng::new(seed);
    (0..n)
        .map(|_| {
            let u = rng.angle();
            let v = rng.range(-0.35, 0.35);
            let r = 0.7 + v * (u / 2.0).cos();
            Vec3::new(
                (r * u.cos()) as f32,
                (r * u.sin()) as f32,
                (v * (u / 2.0).sin()) as f32,
            ) * size
        })
        .collect()
}

fn vortex(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    const ARMS: usize = 3;
    const WINDS: f64 = 2.5;

    let mut rng = SeededRng::new(seed);
    (0..n)
        .map(|i| {
            let arm = (i % ARMS) as f64;
            let t = rng.next_f64();
            let radius = 0.08 + 0.85 * t;
            let a = t * WINDS * TAU + arm * TAU / ARMS as f64;
            let p = Vec3::new(
                (radius * a.cos()) as f32,
                (0.9 - 1.6 * t * t) as f32,
                (radius * a.sin()) as f32,
            );
            (p + jitter(&mut rng, 0.02 + 0.03 * t)) * size
        })
        .collect()
}

fn nebula(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    const CLUSTERS: usize = 5;

    let mut rng = SeededRng::new(seed);
    let centres: Vec<Vec3> = (0..CLUSTERS).map(|_| rng.unit_ball() * 0.55).collect();

    (0..n)
        .map(|_| {
            let centre = rng.pick(&centres).copied().unwrap_or(Vec3::ZERO);
            let p = centre + jitter(&mut rng, 0.18);
            p.clamp_length_max(1.0) * size
        })
        .collect()
}

/// Seven overlapping circles: one centred, six around it.
fn seed_of_life(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    const R: f64 = 1.0 / 3.0;

    let mut rng = SeededRng::new(seed);
    (0..n)
        .map(|i| {
            let circle = i % 7;
            let (cx, cy) = if circle == 0 {
                (0.0, 0.0)
            } else {
                let a = (circle - 1) as f64 * TAU / 6.0;
                (R * a.cos(), R * a.sin())
            };
            let a = rng.angle();
            let r = R + rng.gaussian(0.0, 0.006);
            Vec3::new((cx + r * a.cos()) as f32, (cy + r * a.sin()) as f32, 0.0) * (size * 1.4)
        })
        .collect()
}

fn starburst(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    const RAYS: usize = 24;

    let mut rng = SeededRng::new(seed);
    let rays: Vec<Vec3> = (0..RAYS).map(|_| rng.unit_sphere()).collect();

    (0..n)
        .map(|i| {
            let t = rng.next_f64();
            // squaring bunches points near the core
            let reach = (t * t) as f32;
            (rays[i % RAYS] * reach + jitter(&mut rng, 0.008)) * size
        })
        .collect()
}
