use image::{Rgba, RgbaImage};
use thoughtform::{to_sigil_points, Rotation, ShapeRegistry, SigilOptions};

pub const BACKGROUND: Rgba<u8> = Rgba([8, 10, 18, 255]);

/// Renders `shape` as additive dots on a dark square canvas.
pub fn render_preview(
    registry: &ShapeRegistry,
    shape: &str,
    particles: usize,
    seed: u32,
    size: u32,
    rotation: Rotation,
) -> RgbaImage {
    let points = registry.generate(shape, seed, particles, 1.0);
    let options = SigilOptions {
        size: size as f32,
        rotation,
        ..SigilOptions::default()
    };

    let mut img = RgbaImage::from_pixel(size, size, BACKGROUND);
    for p in to_sigil_points(&points, &options) {
        let (x, y) = (p.x.floor(), p.y.floor());
        if x < 0.0 || y < 0.0 || x >= size as f32 || y >= size as f32 {
            continue;
        }

        let px = img.get_pixel_mut(x as u32, y as u32);
        let add = (p.alpha * 160.0) as u16;
        for c in 0..3 {
            px.0[c] = (px.0[c] as u16 + add).min(255) as u8;
        }
    }
    img
}
