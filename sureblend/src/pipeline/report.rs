//! Per-run quality report.

use std::fmt;

/// What happened to one checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Blended; mean squared errors against the reference render.
    Blended {
        mse_blended: f32,
        mse_denoised: f32,
        mse_noisy: f32,
    },
    /// Not blended. The run continued with the next checkpoint.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointReport {
    pub spp: u32,
    pub outcome: Outcome,
}

impl CheckpointReport {
    pub fn is_blended(&self) -> bool {
        matches!(self.outcome, Outcome::Blended { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunReport {
    pub scene: String,
    pub checkpoints: Vec<CheckpointReport>,
}

impl RunReport {
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            checkpoints: Vec::new(),
        }
    }

    pub fn push(&mut self, spp: u32, outcome: Outcome) {
        self.checkpoints.push(CheckpointReport { spp, outcome });
    }

    pub fn get(&self, spp: u32) -> Option<&CheckpointReport> {
        self.checkpoints.iter().find(|c| c.spp == spp)
    }

    pub fn blended_count(&self) -> usize {
        self.checkpoints.iter().filter(|c| c.is_blended()).count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &CheckpointReport> {
        self.checkpoints.iter().filter(|c| !c.is_blended())
    }
}

/// Tab-separated MSE table: blended (`ours`), denoiser only and Monte Carlo.
impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "spp\tours\tdenoiser\tmc")?;
        for checkpoint in &self.checkpoints {
            match &checkpoint.outcome {
                Outcome::Blended {
                    mse_blended,
                    mse_denoised,
                    mse_noisy,
                } => writeln!(
                    f,
                    "{}\t{:.6e}\t{:.6e}\t{:.6e}",
                    checkpoint.spp, mse_blended, mse_denoised, mse_noisy
                )?,
                Outcome::Skipped { reason } => {
                    writeln!(f, "{}\tskipped: {}", checkpoint.spp, reason)?
                }
            }
        }
        Ok(())
    }
}
