//! Projection of generator points onto a 2D canvas.
//!
//! Rotation is always applied about X, then Y, then Z. Perspective projection
//! then pushes the point `camera_distance` along +Z and divides by depth; the
//! screen Y axis points down.

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Points at or in front of this camera-space depth are not drawn.
pub const NEAR_PLANE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    #[default]
    Perspective,
    /// No perspective divide; every point is visible at uniform scale.
    Orthographic,
}

/// Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Combined matrix for X, then Y, then Z.
    #[inline]
    pub fn matrix(&self) -> Mat3 {
        Mat3::from_rotation_z(self.z) * Mat3::from_rotation_y(self.y) * Mat3::from_rotation_x(self.x)
    }

    #[inline]
    pub fn apply(&self, p: Vec3) -> Vec3 {
        self.matrix() * p
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectionConfig {
    pub width: f32,
    pub height: f32,
    pub focal_length: f32,
    pub camera_distance: f32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub rotation: Rotation,
    pub mode: ProjectionMode,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            focal_length: 400.0,
            camera_distance: 4.0,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: Rotation::IDENTITY,
            mode: ProjectionMode::Perspective,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Index of the source point, kept so attributes survive sorting.
    pub index: usize,
    pub x: f32,
    pub y: f32,
    /// Depth after rotation, before the camera translation.
    pub z: f32,
    pub depth_scale: f32,
    pub visible: bool,
}

pub fn project_point(p: Vec3, config: &ProjectionConfig) -> ProjectedPoint {
    project_rotated(0, config.rotation.apply(p), config)
}

fn project_rotated(index: usize, r: Vec3, config: &ProjectionConfig) -> ProjectedPoint {
    let cx = config.width * 0.5;
    let cy = config.height * 0.5;

    match config.mode {
        ProjectionMode::Perspective => {
            let z = r.z + config.camera_distance;
            if z <= NEAR_PLANE {
                return ProjectedPoint {
                    index,
                    x: 0.0,
                    y: 0.0,
                    z: r.z,
                    depth_scale: 0.0,
                    visible: false,
                };
            }

            let depth_scale = config.focal_length / z * config.scale;
            ProjectedPoint {
                index,
                x: cx + r.x * depth_scale + config.offset_x,
                y: cy - r.y * depth_scale + config.offset_y,
                z: r.z,
                depth_scale,
                visible: true,
            }
        }
        ProjectionMode::Orthographic => ProjectedPoint {
            index,
            x: cx + r.x * config.scale + config.offset_x,
            y: cy - r.y * config.scale + config.offset_y,
            z: r.z,
            depth_scale: config.scale,
            visible: true,
        },
    }
}

/// Project every point, preserving input order and indices.
pub fn project_points(points: &[Vec3], config: &ProjectionConfig) -> Vec<ProjectedPoint> {
    let m = config.rotation.matrix();
    points
        .iter()
        .enumerate()
        .map(|(i, &p)| project_rotated(i, m * p, config))
        .collect()
}

/// Drops invisible points and orders the rest back to front (descending z).
pub fn sort_by_depth(mut points: Vec<ProjectedPoint>) -> Vec<ProjectedPoint> {
    points.retain(|p| p.visible);
    points.sort_by(cmp_depth_desc);
    points
}

/// Projection plus painter's-order sorting in one step.
pub fn project_visible_sorted(points: &[Vec3], config: &ProjectionConfig) -> Vec<ProjectedPoint> {
    sort_by_depth(project_points(points, config))
}

/// `(min_z, max_z)` of `points`, `(0, 0)` when empty.
pub fn depth_bounds(points: &[Vec3]) -> (f32, f32) {
    if points.is_empty() {
        return (0.0, 0.0);
    }

    points
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.z), hi.max(p.z))
        })
}

/// Nearness in [0, 1]: 1 at `min_z`, 0 at `max_z`. A flat range counts as near.
#[inline]
fn nearness(z: f32, min_z: f32, max_z: f32) -> f32 {
    let range = max_z - min_z;
    if range.abs() <= f32::EPSILON {
        return 1.0;
    }
    (1.0 - (z - min_z) / range).clamp(0.0, 1.0)
}

/// Linear alpha falloff with depth; nearer points are more opaque.
pub fn depth_to_alpha(z: f32, min_z: f32, max_z: f32, min_alpha: f32, max_alpha: f32) -> f32 {
    min_alpha + nearness(z, min_z, max_z) * (max_alpha - min_alpha)
}

/// Linear size falloff with depth; nearer points are larger.
pub fn depth_to_size(z: f32, min_z: f32, max_z: f32, min_size: f32, max_size: f32) -> f32 {
    min_size + nearness(z, min_z, max_z) * (max_size - min_size)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SigilOptions {
    /// Canvas edge length in pixels; the canvas is square.
    pub size: f32,
    pub rotation: Rotation,
    /// Fraction of the half-size left empty around the shape.
    pub padding: f32,
    pub min_alpha: f32,
    pub max_alpha: f32,
}

impl Default for SigilOptions {
    fn default() -> Self {
        Self {
            size: 512.0,
            rotation: Rotation::IDENTITY,
            padding: 0.1,
            min_alpha: 0.25,
            max_alpha: 1.0,
        }
    }
}

/// A point placed on a square sigil canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigilPoint {
    pub x: f32,
    pub y: f32,
    /// Depth normalized to [0, 1], 0 nearest.
    pub z: f32,
    pub alpha: f32,
}

/// Rotate, fit into a `size × size` canvas and attach depth-based alpha.
pub fn to_sigil_points(points: &[Vec3], options: &SigilOptions) -> Vec<SigilPoint> {
    let m = options.rotation.matrix();
    let rotated: Vec<Vec3> = points.iter().map(|&p| m * p).collect();

    let (min_z, max_z) = depth_bounds(&rotated);
    let z_range = max_z - min_z;

    let extent = rotated
        .iter()
        .fold(0.0f32, |acc, p| acc.max(p.x.abs()).max(p.y.abs()));
    let half = options.size * 0.5;
    let fit = if extent > f32::EPSILON {
        half * (1.0 - options.padding.clamp(0.0, 0.9)) / extent
    } else {
        0.0
    };

    rotated
        .iter()
        .map(|p| SigilPoint {
            x: half + p.x * fit,
            y: half - p.y * fit,
            z: if z_range > f32::EPSILON {
                (p.z - min_z) / z_range
            } else {
                0.0
            },
            alpha: depth_to_alpha(p.z, min_z, max_z, options.min_alpha, options.max_alpha),
        })
        .collect()
}

/// Ordering helper for callers that sort by something other than depth.
#[inline]
pub fn cmp_depth_desc(a: &ProjectedPoint, b: &ProjectedPoint) -> Ordering {
    b.z.total_cmp(&a.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn point_at_camera_plane_is_invisible() {
        let config = ProjectionConfig::default();
        let p = project_point(Vec3::new(0.3, 0.3, -config.camera_distance), &config);

        assert!(!p.visible);
        assert_eq!(p.depth_scale, 0.0);
        assert_eq!((p.x, p.y), (0.0, 0.0));
    }

    #[test]
    fn visible_point_uses_perspective_divide() {
        let config = ProjectionConfig {
            scale: 2.0,
            offset_x: 5.0,
            offset_y: -5.0,
            ..ProjectionConfig::default()
        };
        let p = project_point(Vec3::new(1.0, 1.0, 1.0), &config);

        let z = 1.0 + config.camera_distance;
        let ds = config.focal_length / z * config.scale;
        assert!(p.visible);
        assert!(approx(p.depth_scale, ds));
        assert!(approx(p.x, 400.0 + ds + 5.0));
        assert!(approx(p.y, 300.0 - ds - 5.0));
    }

    #[test]
    fn rotation_order_is_x_then_y_then_z() {
        // X then Y: +Y -> +Z (about X) -> +X (about Y).
        let r = Rotation::new(FRAC_PI_2, FRAC_PI_2, 0.0);
        let p = r.apply(Vec3::Y);
        assert!(approx(p.x, 1.0) && approx(p.y, 0.0) && approx(p.z, 0.0), "{p:?}");

        // Reversed order would give a different result.
        let reversed = Mat3::from_rotation_x(FRAC_PI_2) * Mat3::from_rotation_y(FRAC_PI_2) * Vec3::Y;
        assert!(!approx(reversed.x, p.x) || !approx(reversed.z, p.z));
    }

    #[test]
    fn orthographic_ignores_depth() {
        let config = ProjectionConfig {
            mode: ProjectionMode::Orthographic,
            scale: 100.0,
            ..ProjectionConfig::default()
        };
        let near = project_point(Vec3::new(1.0, 0.0, -50.0), &config);
        let far = project_point(Vec3::new(1.0, 0.0, 50.0), &config);

        assert!(near.visible && far.visible);
        assert_eq!(near.x, far.x);
        assert_eq!(near.depth_scale, 100.0);
    }

    #[test]
    fn sort_drops_invisible_and_orders_back_to_front() {
        let config = ProjectionConfig::default();
        let points = [
            Vec3::new(0.0, 0.0, 0.5),
            Vec3::new(0.0, 0.0, -10.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];

        let sorted = project_visible_sorted(&points, &config);
        let indices: Vec<usize> = sorted.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![2, 0, 3]);
    }

    #[test]
    fn depth_falloff_is_monotonic_and_clamped() {
        let a = depth_to_alpha(-1.0, -1.0, 1.0, 0.2, 1.0);
        let b = depth_to_alpha(0.0, -1.0, 1.0, 0.2, 1.0);
        let c = depth_to_alpha(1.0, -1.0, 1.0, 0.2, 1.0);
        assert!(approx(a, 1.0) && approx(b, 0.6) && approx(c, 0.2));
        assert!(approx(depth_to_alpha(5.0, -1.0, 1.0, 0.2, 1.0), 0.2));

        assert!(depth_to_size(0.0, -1.0, 1.0, 1.0, 3.0) > depth_to_size(0.5, -1.0, 1.0, 1.0, 3.0));
    }

    #[test]
    fn flat_depth_range_returns_max() {
        assert_eq!(depth_to_alpha(0.3, 0.3, 0.3, 0.1, 0.9), 0.9);
        assert_eq!(depth_to_size(0.3, 0.3, 0.3, 1.0, 4.0), 4.0);
    }

    #[test]
    fn sigil_points_fit_the_canvas() {
        let points = [
            Vec3::new(-2.0, 0.0, -1.0),
            Vec3::new(2.0, 1.0, 1.0),
            Vec3::new(0.0, -1.0, 0.0),
        ];
        let options = SigilOptions {
            size: 100.0,
            padding: 0.0,
            ..SigilOptions::default()
        };

        let out = to_sigil_points(&points, &options);
        assert!(approx(out[0].x, 0.0));
        assert!(approx(out[1].x, 100.0));
        assert!(approx(out[1].y, 25.0));
        assert!(approx(out[0].z, 0.0) && approx(out[1].z, 1.0) && approx(out[2].z, 0.5));
        assert!(approx(out[0].alpha, options.max_alpha));
        assert!(approx(out[1].alpha, options.min_alpha));
    }

    #[test]
    fn depth_bounds_of_empty_is_zero() {
        assert_eq!(depth_bounds(&[]), (0.0, 0.0));
    }
}
