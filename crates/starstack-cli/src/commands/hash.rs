use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use starstack_core::asterism::hash_stars;
use starstack_core::consts::MAX_STARS;
use starstack_core::frame::StarList;
use starstack_core::io::load_star_sidecar;

#[derive(Args)]
pub struct HashArgs {
    /// Star sidecar (`.stars.toml`)
    pub stars: PathBuf,

    /// Stars kept before fingerprinting
    #[arg(long, default_value_t = MAX_STARS)]
    pub max_stars: usize,

    /// Number of fingerprints to print
    #[arg(long, default_value = "5")]
    pub show: usize,
}

pub fn run(args: &HashArgs) -> Result<()> {
    let sidecar = load_star_sidecar(&args.stars)
        .with_context(|| format!("Failed to read {}", args.stars.display()))?;
    let stars = StarList::new(sidecar.stars, args.max_stars);
    let table = hash_stars(&stars)?;

    println!("Stars:         {}", stars.len());
    println!("Fingerprints:  {}", table.len());
    for fp in table.iter().take(args.show) {
        let ratios: Vec<String> = fp.ratios.iter().map(|r| format!("{r:.4}")).collect();
        println!("  {:?}  [{}]", fp.sequence, ratios.join(", "));
    }
    Ok(())
}
