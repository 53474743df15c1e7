use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// `tfpc_bake` - turns images and procedural shapes into `.tfpc` particle clouds.
#[derive(Parser, Debug)]
#[command(name = "tfpc_bake", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bake every image under a directory into layered clouds.
    BakeImage(BakeImageArgs),
    /// Bake a registered shape into the fill layer of a cloud.
    BakeShape(BakeShapeArgs),
    /// Print the header and configs of a `.tfpc` file.
    Inspect {
        path: PathBuf,
    },
    /// List registered shapes and legacy aliases.
    Shapes,
    /// Render a shape's sigil to a PNG.
    Preview(PreviewArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BakeImageArgs {
    #[arg(long, default_value = "images")]
    pub input_dir: PathBuf,

    #[arg(long, env = "TFPC_OUTPUT_DIR", default_value = "baked")]
    pub output_dir: PathBuf,

    /// JSON document with `artDirection`, `layerConfigs` and `tints`.
    /// Missing fields keep their defaults.
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Total particle budget; overrides the settings file.
    #[arg(long, env = "TFPC_PARTICLES")]
    pub particles: Option<usize>,

    /// Sampling seed; overrides the settings file.
    #[arg(long, env = "TFPC_SEED")]
    pub seed: Option<u32>,

    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BakeShapeArgs {
    #[arg(long, default_value = thoughtform::DEFAULT_SHAPE_ID)]
    pub shape: String,

    #[arg(long, env = "TFPC_PARTICLES", default_value_t = 20_000)]
    pub particles: usize,

    #[arg(long, default_value_t = 1.0)]
    pub size: f32,

    #[arg(long, env = "TFPC_SEED", default_value_t = 1)]
    pub seed: u32,

    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    #[arg(long, default_value = thoughtform::DEFAULT_SHAPE_ID)]
    pub shape: String,

    /// Canvas edge in pixels.
    #[arg(long, default_value_t = 512)]
    pub size: u32,

    #[arg(long, default_value_t = 4_000)]
    pub particles: usize,

    #[arg(long, default_value_t = 1)]
    pub seed: u32,

    /// Rotation about X and Y in degrees.
    #[arg(long, default_value_t = 20.0)]
    pub tilt: f32,

    #[arg(long, default_value_t = 30.0)]
    pub turn: f32,

    #[arg(long)]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bake_shape() {
        let cli = Cli::try_parse_from([
            "tfpc_bake",
            "bake-shape",
            "--shape",
            "torus",
            "--particles",
            "100",
            "--seed",
            "9",
            "--output",
            "out.tfpc",
        ])
        .unwrap();

        match cli.command {
            Command::BakeShape(args) => {
                assert_eq!(args.shape, "torus");
                assert_eq!(args.particles, 100);
                assert_eq!(args.seed, 9);
                assert_eq!(args.size, 1.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn inspect_takes_positional_path() {
        let cli = Cli::try_parse_from(["tfpc_bake", "inspect", "hero.tfpc"]).unwrap();
        assert!(matches!(cli.command, Command::Inspect { path } if path == PathBuf::from("hero.tfpc")));
    }

    #[test]
    fn bake_shape_requires_output() {
        assert!(Cli::try_parse_from(["tfpc_bake", "bake-shape"]).is_err());
    }
}
