//! Seeded Mulberry32 generator and the distributions built on it.
//!
//! The same seed and call sequence yields the same values on every platform:
//! all state is a single `u32` advanced with wrapping integer math.

use glam::{Vec2, Vec3};
use std::f64::consts::TAU;

#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u32,
    spare: Option<f64>,
}

impl SeededRng {
    #[inline]
    pub fn new(seed: u32) -> Self {
        Self {
            state: seed,
            spare: None,
        }
    }

    /// Convenience for seeds that arrive as signed 32-bit integers.
    #[inline]
    pub fn from_i32(seed: i32) -> Self {
        Self::new(seed as u32)
    }

    /// Raw Mulberry32 step.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut t = self.state.wrapping_add(0x6D2B_79F5);
        self.state = t;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    #[inline]
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    #[inline]
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        self.range(min as f64, max as f64) as f32
    }

    /// Uniform integer in `[min, max]` (both inclusive).
    pub fn int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max as i128 - min as i128 + 1;
        let offset = (self.next_f64() * span as f64).floor() as i128;
        (min as i128 + offset).min(max as i128) as i64
    }

    /// True with probability `p`.
    #[inline]
    pub fn bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniformly chosen element, `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let i = (self.next_f64() * items.len() as f64).floor() as usize;
        items.get(i.min(items.len() - 1))
    }

    /// In-place Fisher–Yates, swapping from the last element down.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.int(0, i as i64) as usize;
            items.swap(i, j);
        }
    }

    /// Box–Muller normal sample. Each pair of uniforms produces two values;
    /// the second is cached and returned by the next call.
    pub fn gaussian(&mut self, mean: f64, stddev: f64) -> f64 {
        if let Some(z) = self.spare.take() {
            return mean + z * stddev;
        }

        // 1 - u keeps the log argument in (0, 1].
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let mag = (-2.0 * u1.ln()).sqrt();
        let (s, c) = (TAU * u2).sin_cos();

        self.spare = Some(mag * s);
        mean + mag * c * stddev
    }

    /// Uniform angle in `[0, 2π)`.
    #[inline]
    pub fn angle(&mut self) -> f64 {
        self.next_f64() * TAU
    }

    /// Uniform point on the unit sphere (cylindrical equal-area).
    pub fn unit_sphere(&mut self) -> Vec3 {
        let theta = self.angle();
        let phi = (2.0 * self.next_f64() - 1.0).acos();
        let (sp, cp) = phi.sin_cos();
        let (st, ct) = theta.sin_cos();
        Vec3::new((sp * ct) as f32, (sp * st) as f32, cp as f32)
    }

    /// Uniform point inside the unit disk (rejection sampling).
    pub fn unit_disk(&mut self) -> Vec2 {
        loop {
            let x = self.range(-1.0, 1.0);
            let y = self.range(-1.0, 1.0);
            if x * x + y * y <= 1.0 {
                return Vec2::new(x as f32, y as f32);
            }
        }
    }

    /// Uniform point inside the unit ball.
    pub fn unit_ball(&mut self) -> Vec3 {
        let r = self.next_f64().cbrt() as f32;
        self.unit_sphere() * r
    }
}

impl rand::RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        SeededRng::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        let lo = SeededRng::next_u32(self) as u64;
        let hi = SeededRng::next_u32(self) as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = SeededRng::next_u32(self).to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// 32-bit FNV-1a over the UTF-8 bytes of `s`.
pub fn hash_string(s: &str) -> u32 {
    const OFFSET_BASIS: u32 = 0x811C_9DC5;
    const PRIME: u32 = 0x0100_0193;

    s.bytes()
        .fold(OFFSET_BASIS, |h, b| (h ^ b as u32).wrapping_mul(PRIME))
}

/// Fold several seeds into one. Order matters: `[a, b]` and `[b, a]` differ.
pub fn combine_seed(seeds: &[u32]) -> u32 {
    seeds.iter().fold(0x9E37_79B9u32, |h, &s| {
        let mut x = (h ^ s).wrapping_mul(0x85EB_CA6B);
        x ^= x >> 13;
        x = x.wrapping_mul(0xC2B2_AE35);
        x ^ (x >> 16)
    })
}
