//! Artifact names of one checkpoint.
//!
//! `S` is the checkpoint's sample count, `D` the sample count the denoiser ran
//! on (they differ only past `denoise_until`), both zero-padded to six digits.
//! `T` is the back-end tag plus the auxiliary-channel tag. The store adds the
//! file extension.
//!
//! Curves and weights depend on every setting upstream of them, so their
//! names carry `T`, the smoothing tag and the curve window tag.

use super::Smoothing;
use crate::curve::CurveFitConfig;
use crate::denoise::AuxChannels;

/// Tag of the spatial Gaussian smoother in artifact names.
const GAUSSIAN_TAG: &str = "gb";

/// Curve window tags: the two newest points, or the longest decreasing run.
const LAST_TWO_TAG: &str = "l2";
const DECREASING_RUN_TAG: &str = "dr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    scene: String,
    spp: u32,
    denoise_spp: u32,
    backend: String,
    aux: AuxChannels,
    smoothing: Smoothing,
    use_last_two_points: bool,
}

impl ArtifactNames {
    pub fn new(
        scene: &str,
        spp: u32,
        denoise_spp: u32,
        backend: &str,
        aux: AuxChannels,
        smoothing: Smoothing,
    ) -> Self {
        Self {
            scene: scene.to_string(),
            spp,
            denoise_spp,
            backend: backend.to_string(),
            aux,
            smoothing,
            use_last_two_points: CurveFitConfig::default().use_last_two_points,
        }
    }

    /// Same checkpoint with curves fitted under `config`.
    pub fn with_curve_fit(self, config: &CurveFitConfig) -> Self {
        Self {
            use_last_two_points: config.use_last_two_points,
            ..self
        }
    }

    /// Same checkpoint with a different auxiliary-channel set.
    pub fn with_aux(&self, aux: AuxChannels) -> Self {
        Self { aux, ..self.clone() }
    }

    pub fn spp(&self) -> u32 {
        self.spp
    }

    pub fn denoise_spp(&self) -> u32 {
        self.denoise_spp
    }

    pub fn aux(&self) -> AuxChannels {
        self.aux
    }

    pub fn noisy(&self) -> String {
        format!("{}.hdr", self.stem())
    }

    pub fn variance(&self) -> String {
        format!("{}.var", self.stem())
    }

    /// Noisy input of the denoising checkpoint.
    pub fn denoise_noisy(&self) -> String {
        format!("{}.hdr", self.denoise_stem())
    }

    /// Variance of the denoising checkpoint.
    pub fn denoise_variance(&self) -> String {
        format!("{}.var", self.denoise_stem())
    }

    pub fn albedo(&self) -> String {
        format!("{}.alb", self.denoise_stem())
    }

    pub fn normal(&self) -> String {
        format!("{}.nrm", self.denoise_stem())
    }

    pub fn smoothed_variance(&self) -> String {
        format!("{}.var.{}", self.stem(), self.smoothing_tag())
    }

    pub fn denoised(&self) -> String {
        format!("{}.{}", self.denoise_stem(), self.denoiser_tag())
    }

    pub fn risk(&self) -> String {
        format!("{}.sure", self.denoised())
    }

    pub fn smoothed_risk(&self) -> String {
        format!("{}.{}", self.risk(), self.smoothing_tag())
    }

    pub fn slope(&self) -> String {
        format!("{}.slope", self.fit_stem())
    }

    pub fn intercept(&self) -> String {
        format!("{}.intercept", self.fit_stem())
    }

    pub fn weights(&self) -> String {
        format!("{}.weights", self.fit_stem())
    }

    pub fn blended(&self) -> String {
        format!(
            "{}.ours.{}.{}",
            self.stem(),
            self.denoiser_tag(),
            self.smoothing_tag()
        )
    }

    pub fn blended_diff(&self) -> String {
        format!("{}.diff", self.blended())
    }

    pub fn denoised_diff(&self) -> String {
        format!("{}.{}.diff", self.stem(), self.denoiser_tag())
    }

    fn stem(&self) -> String {
        checkpoint_stem(&self.scene, self.spp)
    }

    fn denoise_stem(&self) -> String {
        checkpoint_stem(&self.scene, self.denoise_spp)
    }

    /// `{stem}.{T}.{smoothing}.{window}`.
    fn fit_stem(&self) -> String {
        let window = if self.use_last_two_points {
            LAST_TWO_TAG
        } else {
            DECREASING_RUN_TAG
        };
        format!(
            "{}.{}.{}.{}",
            self.stem(),
            self.denoiser_tag(),
            self.smoothing_tag(),
            window
        )
    }

    fn denoiser_tag(&self) -> String {
        format!("{}{}", self.backend, self.aux.tag())
    }

    fn smoothing_tag(&self) -> &str {
        match self.smoothing {
            Smoothing::Gaussian => GAUSSIAN_TAG,
            Smoothing::Denoiser => &self.backend,
        }
    }
}

/// `<scene>_<NNNNNN>spp`.
pub fn checkpoint_stem(scene: &str, spp: u32) -> String {
    format!("{scene}_{spp:06}spp")
}
