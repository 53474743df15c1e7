//! Image → sampler → TFPC → decode, and generator → projection.

use glam::Vec3;
use thoughtform::{
    project_point, project_visible_sorted, sample_layers, ProjectionConfig, SamplerOptions,
    ShapeRegistry, SourceImage,
};
use tfpc::{decode_tfpc, encode_tfpc, estimate_tfpc_size, LayerKind};

fn radial_image(size: u32) -> SourceImage {
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    let c = size as f32 / 2.0;
    for y in 0..size {
        for x in 0..size {
            let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt() / c;
            let v = (255.0 * (1.0 - d).clamp(0.0, 1.0)) as u8;
            rgba.extend_from_slice(&[v, v / 2, 255 - v, 255]);
        }
    }
    SourceImage::new(size, size, rgba).unwrap()
}

#[test]
fn sampled_cloud_survives_the_codec() {
    let options = SamplerOptions {
        particle_budget: 500,
        seed: 3,
        ..SamplerOptions::default()
    };
    let data = sample_layers(&radial_image(48), &options).unwrap();
    assert!(data.total_count() > 0);

    let bytes = encode_tfpc(&data).unwrap();
    assert_eq!(bytes.len() as u64, estimate_tfpc_size(data.total_count() as u64));

    let decoded = decode_tfpc(&bytes).unwrap();
    assert_eq!(decoded.image_width, 48);
    assert_eq!(decoded.art_direction, data.art_direction);
    for kind in LayerKind::ALL {
        assert_eq!(decoded.counts[kind] as usize, data.layers[kind].count());
        assert_eq!(decoded.layer_configs[kind], data.layers[kind].config);
    }

    let back = decoded.into_layered();
    for kind in LayerKind::ALL {
        assert_eq!(back.layers[kind].positions, data.layers[kind].positions);
        assert_eq!(back.layers[kind].colors, data.layers[kind].colors);
    }
}

#[test]
fn perspective_depth_scale_matches_formula() {
    let config = ProjectionConfig {
        focal_length: 300.0,
        camera_distance: 3.0,
        scale: 1.5,
        ..ProjectionConfig::default()
    };

    for z in [-2.9f32, -1.0, 0.0, 0.5, 4.0] {
        let p = project_point(Vec3::new(0.2, -0.4, z), &config);
        let cam_z = z + config.camera_distance;
        assert!(p.visible);
        let expected = config.focal_length / cam_z * config.scale;
        assert!((p.depth_scale - expected).abs() < 1e-3, "z = {z}");
    }

    let behind = project_point(Vec3::new(0.0, 0.0, -3.5), &config);
    assert!(!behind.visible);
    assert_eq!(behind.depth_scale, 0.0);
}

#[test]
fn projected_shape_is_painter_sorted() {
    let points = ShapeRegistry::builtin().generate("tf_torusKnot", 12, 400, 1.0);
    let sorted = project_visible_sorted(&points, &ProjectionConfig::default());

    assert_eq!(sorted.len(), points.len());
    assert!(sorted.windows(2).all(|w| w[0].z >= w[1].z));
    assert!(sorted.iter().all(|p| p.visible));
}
