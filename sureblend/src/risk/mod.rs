//! Stein's unbiased risk estimate (SURE) of a denoiser.
//!
//! The divergence of the denoiser is estimated with a randomized finite
//! difference: the noisy input is perturbed along a Gaussian probe scaled by the
//! per-sample noise deviation, denoised again, and the change of the output is
//! projected back onto the probe. One denoiser call per trial.


use common::float_ext::FloatExt;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::denoise::{self, DenoiseRequest, Denoiser};

/// Samples drawn from one random stream. Each chunk gets its own stream so the
/// probe does not depend on how rayon schedules the chunks.
const PROBE_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Independent probes averaged per estimate.
    pub trials: usize,
    /// Finite-difference step `e`.
    pub perturbation: f32,
    /// Seed of the probe generator. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            trials: 1,
            perturbation: 1.0,
            seed: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RiskError {
    #[error(transparent)]
    Denoiser(#[from] denoise::Error),

    #[error("Buffer lengths differ: denoised {denoised}, noisy {noisy}, variance {variance}")]
    LengthMismatch {
        denoised: usize,
        noisy: usize,
        variance: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RiskEstimator {
    config: RiskConfig,
}

impl RiskEstimator {
    pub fn new(config: RiskConfig) -> Self {
        assert!(config.trials > 0, "Trial count must be at least 1");
        assert!(
            config.perturbation.is_finite() && config.perturbation > 0.0,
            "Perturbation must be positive"
        );
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Per-sample SURE of `denoised`, the output of `denoiser` for `input`.
    ///
    /// `risk = (y - f(y))^2 - var + 2 * div`, where `div` is the probe average of
    /// `b / e * (f(y + e*b) - f(y))`. Invalid samples count as zero and negative
    /// variances as zero. Fails if any denoiser call fails; nothing partial is
    /// returned.
    pub fn estimate<D, R>(
        &self,
        denoised: &[f32],
        input: &DenoiseRequest,
        variance: &[f32],
        denoiser: &mut D,
        rng: &mut R,
    ) -> Result<Vec<f32>, RiskError>
    where
        D: Denoiser + ?Sized,
        R: Rng + ?Sized,
    {
        let len = denoised.len();
        if input.color.len() != len || variance.len() != len {
            return Err(RiskError::LengthMismatch {
                denoised: len,
                noisy: input.color.len(),
                variance: variance.len(),
            });
        }

        let e = self.config.perturbation;
        let mut divergence = vec![0.0f32; len];

        for trial in 0..self.config.trials {
            let probe = gaussian_probe(variance, rng.random());
            let perturbed: Vec<f32> = input
                .color
                .par_iter()
                .zip(probe.par_iter())
                .map(|(&y, &b)| y.sanitized() + e * b)
                .collect();

            let response = denoiser.denoise(&input.with_color(perturbed))?;
            if response.len() != len {
                return Err(denoise::Error::OutputLength {
                    len: response.len(),
                    expected: len,
                }
                .into());
            }

            divergence
                .par_iter_mut()
                .zip(probe.par_iter())
                .zip(response.par_iter().zip(denoised.par_iter()))
                .for_each(|((div, &b), (&fz, &fy))| {
                    *div += b / e * (fz.sanitized() - fy.sanitized());
                });

            tracing::debug!(trial, samples = len, "SURE probe finished");
        }

        let trials = self.config.trials as f32;
        let risk = (0..len)
            .into_par_iter()
            .map(|i| {
                let y = input.color[i].sanitized();
                let fy = denoised[i].sanitized();
                let v = variance[i].sanitized().max(0.0);
                let r = (y - fy) * (y - fy) - v + 2.0 * divergence[i] / trials;
                if r.is_finite() { r } else { 0.0 }
            })
            .collect();

        Ok(risk)
    }
}

/// Standard-normal probe scaled by `sqrt(variance)` per sample.
pub fn gaussian_probe(variance: &[f32], seed: u64) -> Vec<f32> {
    let mut probe = vec![0.0f32; variance.len()];
    probe
        .par_chunks_mut(PROBE_CHUNK)
        .zip(variance.par_chunks(PROBE_CHUNK))
        .enumerate()
        .for_each(|(chunk_idx, (out, var))| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(chunk_idx as u64);
            for (b, &v) in out.iter_mut().zip(var) {
                let n: f32 = StandardNormal.sample(&mut rng);
                *b = n * v.sanitized().max(0.0).sqrt();
            }
        });
    probe
}
