use std::fmt;
use tfpc::{DecodedTfpc, LayerKind};

/// Human-readable dump of a decoded file.
pub fn describe(decoded: &DecodedTfpc, file_size: usize) -> String {
    Report { decoded, file_size }.to_string()
}

pub struct Report<'a> {
    pub decoded: &'a DecodedTfpc,
    pub file_size: usize,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(out, self.decoded, self.file_size)
    }
}

fn write_report(out: &mut fmt::Formatter<'_>, d: &DecodedTfpc, file_size: usize) -> fmt::Result {
    writeln!(out, "version       {}", d.version)?;
    writeln!(out, "image         {} x {}", d.image_width, d.image_height)?;
    writeln!(
        out,
        "size          {} ({} particles)",
        tfpc::format_file_size(file_size as u64),
        d.total_count
    )?;

    let a = &d.art_direction;
    writeln!(
        out,
        "art direction contrast={} gamma={} depthScale={} depthGamma={} depthInvert={} lumaThreshold={} alphaThreshold={}",
        a.contrast, a.gamma, a.depth_scale, a.depth_gamma, a.depth_invert, a.luma_threshold, a.alpha_threshold
    )?;

    for kind in LayerKind::ALL {
        let c = &d.layer_configs[kind];
        writeln!(
            out,
            "{:<10} count={:<8} offset={:<8} enabled={} weight={} bias={} minAlpha={} minLuma={} minEdge={} opacity={} size={} color={:?}",
            kind.name(),
            d.counts[kind],
            d.offsets[kind],
            c.enabled,
            c.weight,
            c.importance_edge_bias,
            c.min_alpha,
            c.min_luma,
            c.min_edge,
            c.opacity_multiplier,
            c.size_multiplier,
            c.color_mode
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfpc::{ArtDirectionConfig, LayeredParticleData, Particle};

    #[test]
    fn report_lists_every_layer() {
        let mut data = LayeredParticleData::new(64, 32, ArtDirectionConfig::default());
        data.layers.fill.push(Particle::default(), 0.0);
        data.layers.highlight.push(Particle::default(), 0.0);

        let bytes = tfpc::encode_tfpc(&data).unwrap();
        let decoded = tfpc::decode_tfpc(&bytes).unwrap();
        let text = describe(&decoded, bytes.len());

        assert!(text.contains("64 x 32"));
        assert!(text.contains("2 particles"));
        for kind in LayerKind::ALL {
            assert!(text.contains(kind.name()));
        }
        assert!(text.contains("offset=1"));

        let shown = Report { decoded: &decoded, file_size: bytes.len() }.to_string();
        assert_eq!(shown, text);
    }
}
