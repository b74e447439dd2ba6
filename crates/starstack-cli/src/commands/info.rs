use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use starstack_core::consts::SNAPSHOT_EXTENSION;
use starstack_core::frame::Frame;
use starstack_core::io::{load_image, read_snapshot};

#[derive(Args)]
pub struct InfoArgs {
    /// Input image or `.stsnap` snapshot
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let is_snapshot = args
        .file
        .extension()
        .is_some_and(|e| e == SNAPSHOT_EXTENSION);
    let frame = if is_snapshot {
        read_snapshot(&args.file)
    } else {
        load_image(&args.file)
    }
    .with_context(|| format!("Failed to open {}", args.file.display()))?;

    print_frame(&args.file, &frame, is_snapshot);
    Ok(())
}

fn print_frame(path: &std::path::Path, frame: &Frame, is_snapshot: bool) {
    let (h, w, c) = frame.shape();
    println!("File:        {}", path.display());
    println!("Kind:        {}", if is_snapshot { "snapshot" } else { "image" });
    println!("Dimensions:  {w}x{h} ({c} channels)");
    println!("Loaded:      {}", frame.status.loaded);
    println!("Normalized:  {}", frame.status.normalized);
    println!("Registered:  {}", frame.status.registered);
    println!("Solved:      {}", frame.status.solved);
    println!("Stars:       {}", frame.stars.len());

    for (i, star) in frame.stars.iter().take(5).enumerate() {
        println!(
            "  #{i:<2} row {:>9.2}  col {:>9.2}  brightness {:.0}",
            star.row, star.col, star.brightness
        );
    }

    let data_mb = (frame.data.len() * 2) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {data_mb:.1} MB");
}
