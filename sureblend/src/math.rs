//! Sanitising statistics over flat sample buffers.
//!
//! Every function here treats NaN, infinite and subnormal samples as zero.

use common::float_ext::FloatExt;

use crate::hdr::CHANNELS;

/// Normaliser for per-pixel error maps.
const DIFF_SCALE: f32 = 0.05;

/// Mean of all samples, accumulated in f64. Empty input yields 0.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|&v| f64::from(v.sanitized())).sum();
    (sum / values.len() as f64) as f32
}

/// Per-sample squared difference over the common prefix of both buffers.
pub fn squared_errors(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x.sanitized() - y.sanitized();
            d * d
        })
        .collect()
}

/// Mean squared error over the common prefix of both buffers.
pub fn mse(a: &[f32], b: &[f32]) -> f32 {
    mean(&squared_errors(a, b))
}

/// Per-pixel summed squared RGB error, scaled and written to all three channels.
pub fn diff_map(image: &[f32], reference: &[f32]) -> Vec<f32> {
    let len = image.len().min(reference.len()) / CHANNELS * CHANNELS;
    let mut out = vec![0.0f32; len];
    for ((dst, img), r) in out
        .chunks_exact_mut(CHANNELS)
        .zip(image.chunks_exact(CHANNELS))
        .zip(reference.chunks_exact(CHANNELS))
    {
        let d: f32 = img
            .iter()
            .zip(r)
            .map(|(&a, &b)| {
                let d = a.sanitized() - b.sanitized();
                d * d
            })
            .sum();
        dst.fill(d / DIFF_SCALE);
    }
    out
}

/// Ordinary least squares fit of `y = slope * x + intercept`.
///
/// Returns `None` for fewer than two points, a vertical point cloud, or any
/// non-finite result.
pub fn least_squares(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len();
    if n < 2 {
        return None;
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        sum_x += xi;
        sum_y += yi;
        sum_xy += xi * yi;
        sum_xx += xi * xi;
    }

    let n = n as f64;
    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < f64::EPSILON * n * sum_xx.abs().max(1.0) {
        return None;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = sum_y / n - slope * sum_x / n;

    (slope.is_finite() && intercept.is_finite()).then_some((slope, intercept))
}
