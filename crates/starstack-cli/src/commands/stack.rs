use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use starstack_core::io::save_image;
use starstack_core::pipeline::config::StackingConfig;
use starstack_core::stack::{robust_stack_with_progress, SnapshotSource, StackPass};

#[derive(Args)]
pub struct StackArgs {
    /// Registered frame snapshots (`.stsnap`)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Rejection band in standard deviations
    #[arg(long, default_value_t = StackingConfig::default().tolerance)]
    pub tolerance: f64,

    /// Output file path
    #[arg(short, long, default_value = "stacked.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &StackArgs) -> Result<()> {
    let source = SnapshotSource::new(args.files.clone());
    let config = StackingConfig {
        tolerance: args.tolerance,
    };
    let total = args.files.len() as u64;

    println!(
        "Stacking {} frames (tolerance {:.2} sigma)",
        total, config.tolerance
    );

    let pb = ProgressBar::new(total * 2);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:22} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let output = robust_stack_with_progress(&source, &config, |pass, done| {
        pb.set_message(pass.to_string());
        let offset = match pass {
            StackPass::Statistics => 0,
            StackPass::Combination => total,
        };
        pb.set_position(offset + done as u64);
    })?;
    pb.finish_with_message("Done");

    let samples = output.accepted.len() as f64 * total as f64;
    let accepted: f64 = output.accepted.sum();
    println!(
        "Accepted {:.1}% of samples",
        100.0 * accepted / samples.max(1.0)
    );

    save_image(&output.frame, &args.output)?;
    println!("Saved to {}", args.output.display());
    Ok(())
}
