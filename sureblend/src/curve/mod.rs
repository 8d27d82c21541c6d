//! Per-sample power-law curves of a series against sample count.
//!
//! For each pixel-channel the series holds one value per checkpoint (smoothed
//! variance or risk, ascending sample count). A trailing window of decreasing
//! positive values is linearised with
//!
//! ```text
//! x = 1 / ln(n),    y = ln(ln(v) + c) / ln(n)
//! ```
//!
//! so that ordinary least squares gives `ln(ln(v) + c) = slope + intercept * ln(n)`.
//! The stored curve is `a = exp(slope)`, `b = intercept`, i.e. the law
//! `ln(v) + c = a * n^b`, which [`crate::weight::denoised_weight`] inverts.


use std::ops::Range;

use common::float_ext::FloatExt;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math::least_squares;

/// Additive constant keeping `ln(v) + c` positive for any normal f32 `v`.
pub const CURVE_OFFSET: f32 = 100.0;

/// Parameters below this (both of them) mean "no usable curve".
const MIN_PARAM: f32 = 1e-6;

/// Fitted law `ln(v) + CURVE_OFFSET = a * n^b` for one pixel-channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurveParam {
    pub a: f32,
    pub b: f32,
}

impl CurveParam {
    pub const DEGENERATE: Self = Self { a: 0.0, b: 0.0 };

    pub fn is_degenerate(&self) -> bool {
        self.a < MIN_PARAM && self.b < MIN_PARAM
    }

    /// Value of the series predicted at sample count `n`.
    pub fn predict(&self, n: f32) -> f32 {
        let log_v = f64::from(self.a) * f64::from(n).powf(f64::from(self.b)) - f64::from(CURVE_OFFSET);
        log_v.exp() as f32
    }

    /// Sample count at which the curve reaches `value`. May be NaN or infinite.
    pub fn invert(&self, value: f32) -> f64 {
        let y = (f64::from(value).ln() + f64::from(CURVE_OFFSET)) / f64::from(self.a);
        y.powf(1.0 / f64::from(self.b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveFitConfig {
    /// Stop the window at the two newest points instead of the longest
    /// decreasing run.
    pub use_last_two_points: bool,
}

impl Default for CurveFitConfig {
    fn default() -> Self {
        Self {
            use_last_two_points: true,
        }
    }
}

/// Trailing window of `values` used for the fit.
///
/// Scans from the newest value backwards: the newest is accepted if positive,
/// each older one while it is strictly greater than its successor (the series
/// must decrease with sample count). Stops at the first violation, or after two
/// points when `use_last_two_points` is set.
pub fn select_window(values: &[f32], use_last_two_points: bool) -> Range<usize> {
    let n = values.len();
    if n == 0 || values[n - 1] <= 0.0 {
        return n..n;
    }

    let max_len = if use_last_two_points { 2 } else { n };
    let mut start = n - 1;
    while start > 0 && n - start < max_len && values[start - 1] > values[start] {
        start -= 1;
    }
    start..n
}

/// Fits one pixel-channel. `values[j]` belongs to `sample_counts[j]`.
///
/// Returns [`CurveParam::DEGENERATE`] when fewer than two points survive the
/// window selection or the regression is ill-posed.
pub fn fit_curve(values: &[f32], sample_counts: &[u32], config: &CurveFitConfig) -> CurveParam {
    assert_eq!(
        values.len(),
        sample_counts.len(),
        "one sample count per series value"
    );

    let values: Vec<f32> = values.iter().map(|v| v.sanitized()).collect();
    let window = select_window(&values, config.use_last_two_points);
    if window.len() < 2 {
        return CurveParam::DEGENERATE;
    }

    let c = f64::from(CURVE_OFFSET);
    let mut x = Vec::with_capacity(window.len());
    let mut y = Vec::with_capacity(window.len());
    for k in window {
        if sample_counts[k] < 2 {
            return CurveParam::DEGENERATE;
        }
        let log_n = f64::from(sample_counts[k]).ln();
        let log_v = f64::from(values[k]).ln();
        x.push(1.0 / log_n);
        y.push((log_v + c).ln() / log_n);
    }

    let Some((slope, intercept)) = least_squares(&x, &y) else {
        return CurveParam::DEGENERATE;
    };

    let curve = CurveParam {
        a: slope.exp() as f32,
        b: intercept as f32,
    };
    if curve.a.is_finite() && curve.b.is_finite() {
        curve
    } else {
        CurveParam::DEGENERATE
    }
}

/// Fits every pixel-channel of a series of buffers.
///
/// `series[j]` is the buffer of checkpoint `j` (ascending sample count) and
/// all buffers have the same length. Fewer than two checkpoints give only
/// degenerate curves.
pub fn fit_curves<S>(series: &[S], sample_counts: &[u32], config: &CurveFitConfig) -> Vec<CurveParam>
where
    S: AsRef<[f32]> + Sync,
{
    assert_eq!(
        series.len(),
        sample_counts.len(),
        "one sample count per series buffer"
    );
    let Some(first) = series.first() else {
        return Vec::new();
    };
    let len = first.as_ref().len();
    assert!(
        series.iter().all(|s| s.as_ref().len() == len),
        "all series buffers must have the same length"
    );

    if series.len() < 2 {
        return vec![CurveParam::DEGENERATE; len];
    }

    (0..len)
        .into_par_iter()
        .map_init(
            || Vec::with_capacity(series.len()),
            |values: &mut Vec<f32>, i| {
                values.clear();
                values.extend(series.iter().map(|s| s.as_ref()[i]));
                fit_curve(values, sample_counts, config)
            },
        )
        .collect()
}
