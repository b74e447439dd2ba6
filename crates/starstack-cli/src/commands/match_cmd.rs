use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use starstack_core::consts::{DEFAULT_MATCH_EPSILON, MAX_STARS};
use starstack_core::frame::StarList;
use starstack_core::io::load_star_sidecar;
use starstack_core::register::{ReferenceContext, RegistrationTransform};

#[derive(Args)]
pub struct MatchArgs {
    /// Reference star sidecar
    pub reference: PathBuf,

    /// Target star sidecar
    pub target: PathBuf,

    /// Acceptance threshold on fingerprint distance
    #[arg(long, default_value_t = DEFAULT_MATCH_EPSILON)]
    pub epsilon: f64,

    #[arg(long, default_value_t = MAX_STARS)]
    pub max_stars: usize,
}

fn load(path: &Path, cap: usize) -> Result<StarList> {
    let sidecar =
        load_star_sidecar(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(StarList::new(sidecar.stars, cap))
}

pub fn run(args: &MatchArgs) -> Result<()> {
    let reference = ReferenceContext::new(load(&args.reference, args.max_stars)?)?;
    let target = load(&args.target, args.max_stars)?;

    let (matched, correspondence) = reference.correspond(&target, args.epsilon)?;

    println!("Reference sequence:  {:?}", matched.reference_sequence);
    println!("Target sequence:     {:?}", matched.target_sequence);
    println!("Distance:            {:.3e}", matched.distance);

    // Geometry only; the frame size does not affect angle or translation.
    let transform = RegistrationTransform::plan(&correspondence, 1, 1)?;
    let (dr, dc) = transform.net_translation();
    println!("Rotation:            {:.3} deg", transform.angle.to_degrees());
    println!("Translation:         ({dr:.2}, {dc:.2}) px");
    Ok(())
}
