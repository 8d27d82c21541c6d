//! Pipeline configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::Error;
use crate::curve::CurveFitConfig;
use crate::denoise::AuxChannels;
use crate::risk::RiskConfig;
use crate::smoothing::DEFAULT_KERNEL_SIZE;

/// Default bound on a single denoiser call.
const DEFAULT_DENOISE_TIMEOUT_SECS: u64 = 600;

/// How the variance buffer is smoothed before it enters the curve series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Smoothing {
    /// Spatial Gaussian blur with a variance-derived bandwidth.
    #[default]
    Gaussian,
    /// The denoiser itself, run on the variance buffer.
    Denoiser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub smoothing: Smoothing,
    /// Window of the Gaussian smoother. Must be odd.
    pub kernel_size: usize,
    /// Auxiliary buffers handed to the denoiser when available.
    pub aux: AuxChannels,
    /// Back-end tag used in artifact names. `None` uses the denoiser's name.
    pub backend: Option<String>,
    /// Last sample count the denoiser runs on. Later checkpoints reuse its
    /// denoised image and risk.
    pub denoise_until: Option<u32>,
    /// Ignore memoized artifacts and recompute everything.
    pub force_recompute: bool,
    pub risk: RiskConfig,
    pub curve: CurveFitConfig,
    /// Bound on a single denoiser call. `None` waits forever.
    pub denoise_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            smoothing: Smoothing::Gaussian,
            kernel_size: DEFAULT_KERNEL_SIZE,
            aux: AuxChannels::AlbedoNormal,
            backend: None,
            denoise_until: None,
            force_recompute: false,
            risk: RiskConfig::default(),
            curve: CurveFitConfig::default(),
            denoise_timeout_secs: Some(DEFAULT_DENOISE_TIMEOUT_SECS),
        }
    }
}

impl PipelineConfig {
    /// Reads a YAML config. Missing fields take their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yml::from_str(&text).map_err(|source| Error::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "kernel_size must be odd, got {}",
                self.kernel_size
            )));
        }
        if self.risk.trials == 0 {
            return Err(Error::InvalidConfig("risk.trials must be at least 1".into()));
        }
        if !(self.risk.perturbation > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "risk.perturbation must be positive, got {}",
                self.risk.perturbation
            )));
        }
        if self.backend.as_deref().is_some_and(str::is_empty) {
            return Err(Error::InvalidConfig("backend tag must not be empty".into()));
        }
        Ok(())
    }

    pub fn denoise_timeout(&self) -> Option<Duration> {
        self.denoise_timeout_secs.map(Duration::from_secs)
    }
}
