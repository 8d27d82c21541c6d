//! Orchestrator over the checkpoints of one scene.
//!
//! Checkpoints run strictly in ascending sample-count order. Each one loads its
//! noisy render and variance, smooths the variance into the curve series,
//! obtains the denoised image and its risk, refits the curves over every
//! checkpoint seen so far, derives weights and blends. Every intermediate
//! artifact is memoized in the [`ImageStore`] and loaded instead of recomputed
//! unless `force_recompute` is set.
//!
//! A checkpoint whose inputs are missing or whose denoiser call fails is
//! reported as skipped; only store failures abort the run.

mod checkpoint;
mod config;
mod error;
mod naming;
mod report;


pub use checkpoint::{CheckpointSet, parse_file_name};
pub use config::{PipelineConfig, Smoothing};
pub use error::Error;
pub use naming::{ArtifactNames, checkpoint_stem};
pub use report::{CheckpointReport, Outcome, RunReport};

use std::borrow::Cow;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::blend::blend;
use crate::curve::{CurveParam, fit_curves};
use crate::denoise::{self, AuxChannels, DenoiseRequest, Denoiser, TimedDenoiser};
use crate::hdr::{HdrImage, ImageDimensions};
use crate::math;
use crate::risk::{RiskError, RiskEstimator};
use crate::smoothing::gaussian_blur;
use crate::store::{self, ImageStore, load_curves, load_weights, load_with_dimensions, save_curves, save_weights};
use crate::weight::{RiskSign, compute_weights};

/// Why a single checkpoint was not blended.
#[derive(Debug, thiserror::Error)]
enum CheckpointError {
    #[error("{0}")]
    Missing(String),

    #[error("denoiser failed: {0}")]
    Denoise(#[from] denoise::Error),

    #[error("risk estimation failed: {0}")]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Store(#[from] store::Error),
}

/// Auxiliary buffers of the denoising checkpoint.
#[derive(Debug, Default)]
struct AuxBuffers {
    albedo: Option<Vec<f32>>,
    normal: Option<Vec<f32>>,
}

impl AuxBuffers {
    fn request(&self, color: &HdrImage) -> DenoiseRequest {
        let mut request = DenoiseRequest::new(color);
        request.albedo = self.albedo.clone();
        request.normal = self.normal.clone();
        request
    }
}

/// State carried from one checkpoint to the next.
struct RunState {
    reference: HdrImage,
    aux: AuxChannels,
    denoise_until: Option<u32>,
    /// Smoothed variance per checkpoint, ascending sample count.
    series: Vec<(u32, Vec<f32>)>,
}

impl RunState {
    fn denoise_spp(&self, spp: u32) -> u32 {
        self.denoise_until.map_or(spp, |until| spp.min(until))
    }
}

pub struct Pipeline<S: ImageStore> {
    store: S,
    denoiser: TimedDenoiser,
    config: PipelineConfig,
    estimator: RiskEstimator,
    rng: ChaCha8Rng,
    backend: String,
}

impl<S: ImageStore> Pipeline<S> {
    pub fn new(store: S, denoiser: Box<dyn Denoiser>, config: PipelineConfig) -> Result<Self, Error> {
        config.validate()?;

        let denoiser = TimedDenoiser::new(denoiser, config.denoise_timeout());
        let backend = config
            .backend
            .clone()
            .unwrap_or_else(|| denoiser.name().to_string());
        let rng = match config.risk.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        Ok(Self {
            store,
            denoiser,
            estimator: RiskEstimator::new(config.risk),
            config,
            rng,
            backend,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Tag of the denoiser back-end in artifact names.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Processes every checkpoint of `set` in ascending order.
    pub fn run(&mut self, set: &CheckpointSet) -> Result<RunReport, Error> {
        let Some(reference_spp) = set.reference_spp() else {
            return Err(Error::EmptyCheckpointSet(set.scene.clone()));
        };
        let reference_name = format!("{}.hdr", checkpoint_stem(&set.scene, reference_spp));
        let reference = self
            .store
            .load(&reference_name)?
            .ok_or_else(|| Error::MissingReference(reference_name.clone()))?;

        let denoise_until = match self.config.denoise_until {
            Some(until) if !set.contains(until) => {
                tracing::warn!(until, "denoise_until is not a checkpoint sample count, ignoring it");
                None
            }
            other => other,
        };

        tracing::info!(
            scene = %set.scene,
            checkpoints = set.len(),
            reference_spp,
            dimensions = %reference.dimensions,
            backend = %self.backend,
            smoothing = %self.config.smoothing,
            "Starting run"
        );

        let mut state = RunState {
            reference,
            aux: self.config.aux,
            denoise_until,
            series: Vec::with_capacity(set.len()),
        };
        let mut report = RunReport::new(&set.scene);

        for &spp in &set.sample_counts {
            let outcome = match self.process(&set.scene, spp, &mut state) {
                Ok(outcome) => outcome,
                Err(CheckpointError::Store(err)) => return Err(err.into()),
                Err(err) => {
                    tracing::warn!(spp, reason = %err, "Skipping checkpoint");
                    Outcome::Skipped {
                        reason: err.to_string(),
                    }
                }
            };
            report.push(spp, outcome);
        }

        tracing::info!(
            scene = %set.scene,
            blended = report.blended_count(),
            skipped = set.len() - report.blended_count(),
            "Run finished"
        );
        Ok(report)
    }

    fn process(
        &mut self,
        scene: &str,
        spp: u32,
        state: &mut RunState,
    ) -> Result<Outcome, CheckpointError> {
        let dims = state.reference.dimensions;
        let force = self.config.force_recompute;
        let denoise_spp = state.denoise_spp(spp);
        let denoising_here = denoise_spp == spp;
        let force_denoise = force && denoising_here;

        let names = ArtifactNames::new(
            scene,
            spp,
            denoise_spp,
            &self.backend,
            state.aux,
            self.config.smoothing,
        )
        .with_curve_fit(&self.config.curve);
        let noisy = self.require(&names.noisy(), dims)?;
        let variance = self.require(&names.variance(), dims)?;
        let aux = self.load_aux(&names, dims, state)?;
        let names = names.with_aux(state.aux);

        tracing::info!(spp, denoise_spp, aux = ?state.aux, "Processing checkpoint");

        let smoothed_variance = self.memoized(&names.smoothed_variance(), dims, force, |p| {
            p.smooth(&variance, &variance.pixels, &aux)
        })?;
        state.series.push((spp, smoothed_variance.pixels.clone()));

        let (noisy_d, variance_d) = if denoising_here {
            (Cow::Borrowed(&noisy), Cow::Borrowed(&variance))
        } else {
            (
                Cow::Owned(self.require(&names.denoise_noisy(), dims)?),
                Cow::Owned(self.require(&names.denoise_variance(), dims)?),
            )
        };

        let denoised = self.memoized(&names.denoised(), dims, force_denoise, |p| {
            let pixels = p.denoiser.run(&aux.request(&noisy_d))?;
            Ok(HdrImage::new(dims, pixels))
        })?;
        let risk = self.memoized(&names.risk(), dims, force_denoise, |p| {
            p.estimate_risk(&denoised, &noisy_d, &variance_d, &aux)
        })?;
        let smoothed_risk = self.memoized(&names.smoothed_risk(), dims, force_denoise, |p| {
            p.smooth(&risk, &variance_d.pixels, &aux)
        })?;

        let mean_variance = math::mean(&variance.pixels);
        let sign = RiskSign::from_means(math::mean(&risk.pixels), mean_variance);
        let bypass_smoothing = self.config.smoothing == Smoothing::Denoiser
            && math::mean(&smoothed_risk.pixels) > mean_variance;
        let (weight_risk, weight_variance) = if bypass_smoothing {
            tracing::info!(spp, "Smoothed risk exceeds variance, using raw risk and variance");
            (&risk, &variance)
        } else {
            (&smoothed_risk, &smoothed_variance)
        };

        let curves = self.curves(&names, dims, force, &state.series)?;

        let weights = match self.cached_weights(&names, dims, force)? {
            Some(weights) => weights,
            None => {
                let weights = compute_weights(
                    &weight_risk.pixels,
                    &weight_variance.pixels,
                    &noisy.pixels,
                    &curves,
                    spp,
                    sign,
                );
                save_weights(&self.store, &weights, dims, &names.weights())?;
                weights
            }
        };

        let blended = self.memoized(&names.blended(), dims, force, |_| {
            Ok(HdrImage::new(dims, blend(&noisy.pixels, &denoised.pixels, &weights, spp)))
        })?;

        let reference = &state.reference;
        self.memoized(&names.blended_diff(), dims, force, |_| {
            Ok(HdrImage::new(dims, math::diff_map(&blended.pixels, &reference.pixels)))
        })?;
        self.memoized(&names.denoised_diff(), dims, force, |_| {
            Ok(HdrImage::new(dims, math::diff_map(&denoised.pixels, &reference.pixels)))
        })?;

        let mse_blended = math::mse(&blended.pixels, &reference.pixels);
        let mse_denoised = math::mse(&denoised.pixels, &reference.pixels);
        let mse_noisy = math::mse(&noisy.pixels, &reference.pixels);
        tracing::info!(spp, mse_blended, mse_denoised, mse_noisy, "Checkpoint blended");

        Ok(Outcome::Blended {
            mse_blended,
            mse_denoised,
            mse_noisy,
        })
    }

    /// Loads a checkpoint input; a missing one skips the checkpoint.
    fn require(&self, name: &str, dims: ImageDimensions) -> Result<HdrImage, CheckpointError> {
        load_with_dimensions(&self.store, name, dims)?
            .ok_or_else(|| CheckpointError::Missing(format!("missing input '{name}'")))
    }

    /// Loads the auxiliary buffers the run still uses, downgrading the run's
    /// channel set when one is missing.
    fn load_aux(
        &self,
        names: &ArtifactNames,
        dims: ImageDimensions,
        state: &mut RunState,
    ) -> Result<AuxBuffers, store::Error> {
        let mut buffers = AuxBuffers::default();
        if !state.aux.uses_albedo() {
            return Ok(buffers);
        }

        match load_with_dimensions(&self.store, &names.albedo(), dims)? {
            Some(albedo) => buffers.albedo = Some(albedo.into_pixels()),
            None => {
                tracing::warn!(artifact = %names.albedo(), "Albedo missing, disabling auxiliary channels");
                state.aux = AuxChannels::None;
                return Ok(buffers);
            }
        }

        if state.aux.uses_normal() {
            match load_with_dimensions(&self.store, &names.normal(), dims)? {
                Some(normal) => buffers.normal = Some(normal.into_pixels()),
                None => {
                    tracing::warn!(artifact = %names.normal(), "Normal missing, disabling normals");
                    state.aux = AuxChannels::Albedo;
                }
            }
        }
        Ok(buffers)
    }

    fn smooth(
        &self,
        src: &HdrImage,
        bandwidth_source: &[f32],
        aux: &AuxBuffers,
    ) -> Result<HdrImage, CheckpointError> {
        match self.config.smoothing {
            Smoothing::Gaussian => Ok(gaussian_blur(src, bandwidth_source, self.config.kernel_size)),
            Smoothing::Denoiser => {
                let request = aux.request(src).with_clean_aux(true);
                let pixels = self.denoiser.run(&request)?;
                Ok(HdrImage::new(src.dimensions, pixels))
            }
        }
    }

    fn estimate_risk(
        &mut self,
        denoised: &HdrImage,
        noisy: &HdrImage,
        variance: &HdrImage,
        aux: &AuxBuffers,
    ) -> Result<HdrImage, CheckpointError> {
        let request = aux.request(noisy);
        let risk = self.estimator.estimate(
            &denoised.pixels,
            &request,
            &variance.pixels,
            &mut self.denoiser,
            &mut self.rng,
        )?;
        Ok(HdrImage::new(noisy.dimensions, risk))
    }

    /// Curves over the series so far, memoized as slope and intercept images.
    fn curves(
        &self,
        names: &ArtifactNames,
        dims: ImageDimensions,
        force: bool,
        series: &[(u32, Vec<f32>)],
    ) -> Result<Vec<CurveParam>, store::Error> {
        if !force {
            if let Some(curves) = load_curves(&self.store, &names.slope(), &names.intercept(), dims)? {
                tracing::debug!(artifact = %names.slope(), "Using memoized curves");
                return Ok(curves);
            }
        }

        let sample_counts: Vec<u32> = series.iter().map(|(spp, _)| *spp).collect();
        let buffers: Vec<&[f32]> = series.iter().map(|(_, values)| values.as_slice()).collect();
        let curves = fit_curves(&buffers, &sample_counts, &self.config.curve);

        let degenerate = curves.iter().filter(|c| c.is_degenerate()).count();
        tracing::debug!(
            points = series.len(),
            degenerate,
            total = curves.len(),
            "Fitted curves"
        );

        save_curves(&self.store, &curves, dims, &names.slope(), &names.intercept())?;
        Ok(curves)
    }

    fn cached_weights(
        &self,
        names: &ArtifactNames,
        dims: ImageDimensions,
        force: bool,
    ) -> Result<Option<Vec<u32>>, store::Error> {
        if force {
            return Ok(None);
        }
        load_weights(&self.store, &names.weights(), dims)
    }

    /// Loads `name` unless `force` is set, otherwise computes and saves it.
    fn memoized<F>(
        &mut self,
        name: &str,
        dims: ImageDimensions,
        force: bool,
        compute: F,
    ) -> Result<HdrImage, CheckpointError>
    where
        F: FnOnce(&mut Self) -> Result<HdrImage, CheckpointError>,
    {
        if !force {
            if let Some(image) = load_with_dimensions(&self.store, name, dims)? {
                tracing::debug!(artifact = name, "Using memoized artifact");
                return Ok(image);
            }
        }

        let image = compute(self)?;
        self.store.save(&image, name)?;
        Ok(image)
    }
}
