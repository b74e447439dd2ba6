use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use starstack_core::pipeline::config::{BatchConfig, DetectConfig, SolverMethod};
use starstack_core::pipeline::{BatchEvent, BatchTask, Collaborators, Session};

use crate::summary::{print_batch_report, print_batch_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Input exposures, in processing order
    pub files: Vec<PathBuf>,

    /// Batch config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Detect stars instead of reading `.stars.toml` sidecars
    #[arg(long)]
    pub detect: bool,

    /// Detection threshold in noise units (with --detect)
    #[arg(long, default_value_t = DetectConfig::default().sigma)]
    pub sigma: f64,

    /// Expected pixel scale in arcsec/px
    #[arg(long)]
    pub scale: Option<f64>,

    /// Fingerprint match threshold
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Stacking rejection band in standard deviations
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Directory for per-frame snapshots
    #[arg(long, default_value = "snapshots")]
    pub workdir: PathBuf,

    /// Output file path
    #[arg(short, long, default_value = "stacked.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        BatchConfig::from_toml(&contents).context("Invalid batch config")?
    } else {
        build_config_from_args(args)
    };
    anyhow::ensure!(!config.inputs.is_empty(), "no input files given");
    tracing::debug!(frames = config.inputs.len(), workdir = %config.workdir.display(), "Batch config ready");

    print_batch_summary(&config);

    let collaborators = Collaborators::from_config(&config);
    let task = BatchTask::start(config.clone(), Session::new(&config), collaborators)?;

    let pb = ProgressBar::new(config.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:22} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    for event in task.events() {
        match event {
            BatchEvent::StageStarted { stage, total } => {
                pb.set_message(stage.to_string());
                pb.set_length(total.unwrap_or(1) as u64);
                pb.set_position(0);
            }
            BatchEvent::Progress { done } => pb.set_position(done as u64),
            BatchEvent::FrameDone(outcome) => {
                if let Err(ref e) = outcome.result {
                    pb.println(format!("  skipped {}: {e}", outcome.source.display()));
                }
            }
            BatchEvent::StageFinished => {}
            BatchEvent::Finished { .. } => break,
        }
    }

    let (report, _session) = task.join()?;
    pb.finish_with_message("Done");

    print_batch_report(&report);
    if let Some(error) = report.stack_error {
        anyhow::bail!("stacking failed: {error}");
    }
    Ok(())
}

fn build_config_from_args(args: &RunArgs) -> BatchConfig {
    let mut config = BatchConfig {
        inputs: args.files.clone(),
        output: args.output.clone(),
        workdir: args.workdir.clone(),
        ..Default::default()
    };
    if args.detect {
        config.solver.method = SolverMethod::Detect(DetectConfig {
            sigma: args.sigma,
            ..Default::default()
        });
    }
    config.solver.scale_arcsec = args.scale;
    if let Some(epsilon) = args.epsilon {
        config.matching.epsilon = epsilon;
    }
    if let Some(tolerance) = args.tolerance {
        config.stacking.tolerance = tolerance;
    }
    config
}
