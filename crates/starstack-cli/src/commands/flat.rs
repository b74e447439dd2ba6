use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use starstack_core::flat::normalize_frame;
use starstack_core::io::{load_image, save_image};
use starstack_core::pipeline::config::FlatConfig;

#[derive(Args)]
pub struct FlatArgs {
    /// Input image
    pub file: PathBuf,

    /// Border excluded from background sampling
    #[arg(long, default_value_t = FlatConfig::default().margin)]
    pub margin: usize,

    /// Background sampling stride in pixels
    #[arg(long, default_value_t = FlatConfig::default().grid_step)]
    pub grid_step: usize,

    /// Output file path
    #[arg(short, long, default_value = "flat.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &FlatArgs) -> Result<()> {
    let mut frame = load_image(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    let config = FlatConfig {
        margin: args.margin,
        grid_step: args.grid_step,
    };
    anyhow::ensure!(config.grid_step > 0, "--grid-step must be positive");

    println!("Normalizing {} ({}x{})", args.file.display(), frame.width(), frame.height());
    normalize_frame(&mut frame, &config)?;

    save_image(&frame, &args.output)?;
    println!("Saved to {}", args.output.display());
    Ok(())
}
