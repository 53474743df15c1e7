use std::fs;
use tfpc_bake::bake::{bake_directory, collect_images, BakeSummary};
use thoughtform::SamplerOptions;

fn write_png(path: &std::path::Path, w: u32, h: u32) {
    let img = image::RgbaImage::from_fn(w, h, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([255, 0, 0, 255])
        } else {
            image::Rgba([0, 255, 0, 255])
        }
    });
    img.save(path).unwrap();
}

#[test]
fn bakes_images_and_skips_existing() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    fs::create_dir(input.path().join("nested")).unwrap();
    write_png(&input.path().join("a.png"), 16, 16);
    write_png(&input.path().join("nested/b.png"), 8, 12);
    fs::write(input.path().join("notes.txt"), "not an image").unwrap();
    fs::write(input.path().join("broken.png"), b"definitely not png").unwrap();

    assert_eq!(collect_images(input.path()).len(), 3);

    let options = SamplerOptions {
        particle_budget: 64,
        ..SamplerOptions::default()
    };

    let summary = bake_directory(input.path(), output.path(), &options, false).unwrap();
    assert_eq!(
        summary,
        BakeSummary {
            written: 2,
            skipped: 0,
            failed: 1
        }
    );

    let bytes = fs::read(output.path().join("b.tfpc")).unwrap();
    let decoded = tfpc::decode_tfpc(&bytes).unwrap();
    assert_eq!((decoded.image_width, decoded.image_height), (8, 12));

    let again = bake_directory(input.path(), output.path(), &options, false).unwrap();
    assert_eq!(again.skipped, 2);
    assert_eq!(again.written, 0);
}
