//! Per-sample weight of the denoised image in the blend.
//!
//! A weight is a pseudo sample count: the denoised value counts as `weight`
//! samples next to the `spp` samples of the noisy render.

use common::float_ext::FloatExt;
use rayon::prelude::*;

use crate::curve::CurveParam;

/// Upper bound of every weight.
pub const MAX_WEIGHT: u32 = 65536;

/// Below this, variance and intensity mean the pixel has converged.
const CONVERGED_EPSILON: f64 = 1e-7;

/// Sample count at which the variance model is assumed to vanish.
const EXTRAPOLATED_SPP: f64 = 1e20;

/// Risks at or below this are treated as zero.
const MIN_RISK: f32 = 1e-12;

/// How the sign of a raw risk estimate is handled before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskSign {
    /// Negative risks become zero.
    ClampNegative,
    /// Negative risks are replaced by their magnitude.
    Magnitude,
}

impl RiskSign {
    /// Policy for a checkpoint with the given image-wide means.
    ///
    /// A mean risk above the mean variance marks the estimate as unreliable and
    /// negative values are clamped; otherwise magnitudes are used.
    pub fn from_means(mean_risk: f32, mean_variance: f32) -> Self {
        if mean_risk > mean_variance {
            RiskSign::ClampNegative
        } else {
            RiskSign::Magnitude
        }
    }

    #[inline]
    pub fn apply(self, risk: f32) -> f32 {
        match self {
            RiskSign::ClampNegative => risk.max(0.0),
            RiskSign::Magnitude => risk.abs(),
        }
    }
}

/// Lower bound on the denoiser weight derived from the variance alone.
///
/// Fits a two-point power law between `(spp, variance)` and
/// `(1e20, variance extrapolated to almost nothing)`, then returns the sample
/// count at which that law reaches `risk`, rounded and clamped to
/// `[0, MAX_WEIGHT]`. A pixel with negligible variance and intensity gets
/// `MAX_WEIGHT`.
pub fn min_weight(variance: f32, risk: f32, intensity: f32, spp: u32) -> u32 {
    let e = CONVERGED_EPSILON;
    let v = f64::from(variance.sanitized().max(0.0));
    let s = f64::from(risk.sanitized().max(0.0));
    let i = f64::from(intensity.sanitized());

    if v < e && i < e {
        return MAX_WEIGHT;
    }

    let n = f64::from(spp.max(1));
    let log_v = (v + e).ln();
    let sqrt_far = (v + e).sqrt() / (EXTRAPOLATED_SPP / n - 1.0);
    let far_variance = sqrt_far * sqrt_far;

    let slope = (log_v - far_variance.ln()) / (n.ln() - EXTRAPOLATED_SPP.ln());
    let intercept = log_v - slope * n.ln();
    let weight = (n.ln() * ((s + e).ln() - intercept) / (log_v - intercept)).exp();

    clamp_weight(weight.round())
}

/// Weight at which the fitted curve reaches `risk`.
///
/// Falls back to `min(min_weight, MAX_WEIGHT)` when the risk is negligible,
/// the curve is degenerate or the inversion is undefined. Otherwise the
/// inverted sample count is clamped and truncated; `min_weight` is not applied
/// as a floor.
pub fn denoised_weight(risk: f32, curve: CurveParam, min_weight: u32) -> u32 {
    let fallback = min_weight.min(MAX_WEIGHT);
    if !(risk > MIN_RISK) || curve.is_degenerate() {
        return fallback;
    }

    let weight = curve.invert(risk);
    if weight.is_nan() {
        return fallback;
    }
    clamp_weight(weight)
}

/// Weights for a whole checkpoint.
///
/// `risk` and `variance` are the (possibly smoothed) estimates, `intensity` the
/// noisy render at `spp` samples, `curves` the fit for this checkpoint.
pub fn compute_weights(
    risk: &[f32],
    variance: &[f32],
    intensity: &[f32],
    curves: &[CurveParam],
    spp: u32,
    sign: RiskSign,
) -> Vec<u32> {
    let len = risk.len();
    assert!(
        variance.len() == len && intensity.len() == len && curves.len() == len,
        "weight inputs must have equal lengths"
    );

    (0..len)
        .into_par_iter()
        .map(|j| {
            let s = sign.apply(risk[j].sanitized());
            let v = variance[j].sanitized();
            let floor = min_weight(v, s, intensity[j], spp);
            denoised_weight(s, curves[j], floor)
        })
        .collect()
}

/// Clamps to `[0, MAX_WEIGHT]` and truncates; NaN maps to zero.
#[inline]
fn clamp_weight(weight: f64) -> u32 {
    weight.clamp(0.0, f64::from(MAX_WEIGHT)) as u32
}
