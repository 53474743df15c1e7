//! Geometric primitives. Points lie roughly in [-1, 1] before scaling by `size`.

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
        category: ShapeCategory::Geometric,
        generate,
        has_3d_depth,
    }
}

pub(super) fn definitions() -> Vec<ShapeDefinition> {
    vec![
        def("sphere", "Sphere", sphere, true),
        def("cube", "Cube", cube, true),
        def("tetrahedron", "Tetrahedron", tetrahedron, true),
        def("octahedron", "Octahedron", octahedron, true),
        def("torus", "Torus", torus, true),
        def("helix", "Double Helix", helix, true),
        def("spiral", "Golden Spiral", spiral, false),
        def("ring", "Ring", ring, false),
    ]
}

pub(super) fn sphere(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    let mut rng = SeededRng::new(seed);
    (0..n).map(|_| rng.unit_sphere() * size).collect()
}

fn cube(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    let mut rng = SeededRng::new(seed);
    (0..n)
        .map(|_| {
            let face = rng.int(0, 5);
            let u = rng.range_f32(-1.0, 1.0);
            let v = rng.range_f32(-1.0, 1.0);
            let sign = if face % 2 == 0 { 1.0 } else { -1.0 };
            let p = match face / 2 {
                0 => Vec3::new(sign, u, v),
                1 => Vec3::new(u, sign, v),
                _ => Vec3::new(u, v, sign),
            };
            p * (size * 0.7)
        })
        .collect()
}

/// Points spread along the edges of a polyhedron, cycling edges so every edge
/// gets within one point of the same share.
fn along_edges(
    rng: &mut SeededRng,
    vertices: &[Vec3],
    edges: &[(usize, usize)],
    n: usize,
    size: f32,
) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let (a, b) = edges[i % edges.len()];
            let t = rng.next_f64() as f32;
            (vertices[a].lerp(vertices[b], t) + jitter(rng, 0.01)) * size
        })
        .collect()
}

fn tetrahedron(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    let mut rng = SeededRng::new(seed);
    let s = 1.0 / 3f32.sqrt();
    let vertices = [
        Vec3::new(s, s, s),
        Vec3::new(s, -s, -s),
        Vec3::new(-s, s, -s),
        Vec3::new(-s, -s, s),
    ];
    let edges = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
    along_edges(&mut rng, &vertices, &edges, n, size)
}

fn octahedron(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    let mut rng = SeededRng::new(seed);
    let vertices = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
    let mut edges = Vec::with_capacity(12);
    for a in 0..6 {
        for b in (a + 1)..6 {
            // every pair except opposite vertices
            if a / 2 != b / 2 {
                edges.push((a, b));
            }
        }
    }
    along_edges(&mut rng, &vertices, &edges, n, size)
}

fn torus(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    const MAJOR: f64 = 0.7;
    const MINOR: f64 = 0.28;

    let mut rng = SeededRng::new(seed);
    (0..n)
        .map(|_| {
            let u = rng.angle();
            let v = rng.angle();
            let r = MAJOR + MINOR * v.cos();
            Vec3::new(
                (r * u.cos()) as f32,
                (r * u.sin()) as f32,
                (MINOR * v.sin()) as f32,
            ) * size
        })
        .collect()
}

fn helix(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    const TURNS: f64 = 3.0;
    const RADIUS: f64 = 0.45;

    let mut rng = SeededRng::new(seed);
    (0..n)
        .map(|i| {
            let strand = (i % 2) as f64;
            let t = rng.next_f64();
            let a = t * TURNS * TAU + strand * PI;
            let p = Vec3::new(
                (RADIUS * a.cos()) as f32,
                (t * 2.0 - 1.0) as f32,
                (RADIUS * a.sin()) as f32,
            );
            (p + jitter(&mut rng, 0.015)) * size
        })
        .collect()
}

fn spiral(_seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    let golden_angle = PI * (3.0 - 5f64.sqrt());
    (0..n)
        .map(|i| {
            let r = ((i as f64 + 0.5) / n as f64).sqrt();
            let a = i as f64 * golden_angle;
            Vec3::new((r * a.cos()) as f32, (r * a.sin()) as f32, 0.0) * size
        })
        .collect()
}

fn ring(seed: u32, n: usize, size: f32) -> Vec<Vec3> {
    let mut rng = SeededRng::new(seed);
    (0..n)
        .map(|_| {
            let a = rng.angle();
            let r = 0.8 + rng.gaussian(0.0, 0.035);
            Vec3::new((r * a.cos()) as f32, (r * a.sin()) as f32, 0.0) * size
        })
        .collect()
}
