//! Blend the checkpoints of a render directory.
//!
//! Usage:
//! ```text
//! sureblend [OPTIONS] <DIR>
//! ```
//!
//! `DIR` holds `<scene>_<NNNNNN>spp.hdr.exr` renders with their `.var.exr`
//! variances (and optionally `.alb.exr` / `.nrm.exr`). Every artifact is
//! written next to them; the MSE table goes to stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use common::log_setup::setup_logging;
use sureblend::{
    AuxChannels, CheckpointSet, Denoiser, ExrStore, GaussianDenoiser, Pipeline, PipelineConfig,
    Smoothing,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// CPU Gaussian blur
    Gauss,
    /// Intel Open Image Denoise
    #[cfg(feature = "oidn")]
    Oidn,
}

impl Backend {
    fn create(self) -> Result<Box<dyn Denoiser>> {
        match self {
            Backend::Gauss => Ok(Box::new(GaussianDenoiser::default())),
            #[cfg(feature = "oidn")]
            Backend::Oidn => Ok(Box::new(
                sureblend::OidnDenoiser::new().context("Failed to open an OIDN device")?,
            )),
        }
    }
}

#[cfg(feature = "oidn")]
const DEFAULT_BACKEND: &str = "oidn";
#[cfg(not(feature = "oidn"))]
const DEFAULT_BACKEND: &str = "gauss";

#[derive(Parser, Debug)]
#[command(author, version, about = "SURE-driven blending of noisy and denoised renders")]
struct Args {
    /// Directory with the checkpoint renders
    dir: PathBuf,

    /// YAML config; command-line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Denoiser back-end
    #[arg(short = 'b', long, value_enum, default_value = DEFAULT_BACKEND)]
    backend: Backend,

    /// Smooth variance and risk with the denoiser instead of a Gaussian
    #[arg(short = 'o', long)]
    denoiser_smoothing: bool,

    /// Do not pass albedo or normals to the denoiser
    #[arg(short = 'a', long)]
    no_aux: bool,

    /// Do not pass normals to the denoiser
    #[arg(short = 'n', long)]
    no_normal: bool,

    /// Stop denoising after this sample count and reuse its result
    #[arg(short = 'u', long)]
    until: Option<u32>,

    /// Recompute every artifact
    #[arg(short = 'c', long)]
    recompute: bool,

    /// SURE probes per estimate
    #[arg(long)]
    trials: Option<usize>,

    /// Seed of the SURE probes
    #[arg(long)]
    seed: Option<u64>,

    /// Denoiser timeout in seconds, 0 disables it
    #[arg(long)]
    timeout: Option<u64>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_yaml_file(path)?,
            None => PipelineConfig::default(),
        };

        if self.denoiser_smoothing {
            config.smoothing = Smoothing::Denoiser;
        }
        if self.no_aux {
            config.aux = AuxChannels::None;
        } else if self.no_normal && config.aux.uses_normal() {
            config.aux = AuxChannels::Albedo;
        }
        if self.until.is_some() {
            config.denoise_until = self.until;
        }
        config.force_recompute |= self.recompute;
        if let Some(trials) = self.trials {
            config.risk.trials = trials;
        }
        if self.seed.is_some() {
            config.risk.seed = self.seed;
        }
        if let Some(secs) = self.timeout {
            config.denoise_timeout_secs = (secs > 0).then_some(secs);
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level, Path::new("logs"), "sureblend");

    let config = args.pipeline_config()?;
    tracing::debug!(?config, "Resolved configuration");

    let set = CheckpointSet::discover(&args.dir)?;
    let store = ExrStore::new(args.dir.clone());
    let denoiser = args.backend.create()?;

    let mut pipeline = Pipeline::new(store, denoiser, config)?;
    let report = pipeline
        .run(&set)
        .with_context(|| format!("Failed to process '{}'", args.dir.display()))?;

    print!("{report}");
    Ok(())
}
