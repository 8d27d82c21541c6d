//! Weighted average of noisy and denoised renders.

use common::float_ext::FloatExt;
use rayon::prelude::*;

/// Blends per sample:
///
/// ```text
/// out = (noisy * spp + denoised * weight) / (spp + weight)
/// ```
///
/// The output covers the shortest of the three inputs. A zero weight (or a zero
/// denominator) yields the noisy value; invalid samples count as zero.
pub fn blend(noisy: &[f32], denoised: &[f32], weights: &[u32], spp: u32) -> Vec<f32> {
    let len = noisy.len().min(denoised.len()).min(weights.len());
    let n = f64::from(spp);

    noisy[..len]
        .par_iter()
        .zip(denoised[..len].par_iter())
        .zip(weights[..len].par_iter())
        .map(|((&x, &d), &w)| {
            let x = x.sanitized();
            let total = n + f64::from(w);
            if w == 0 || total == 0.0 {
                return x;
            }
            let mixed = (f64::from(x) * n + f64::from(d.sanitized()) * f64::from(w)) / total;
            mixed as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weight::MAX_WEIGHT;

    #[test]
    fn test_zero_weight_keeps_noisy() {
        let noisy = [0.1, 0.7, 123.456];
        let out = blend(&noisy, &[9.0, 9.0, 9.0], &[0, 0, 0], 64);
        assert_eq!(out, noisy);
    }

    #[test]
    fn test_equal_weight_is_average() {
        let out = blend(&[1.0], &[3.0], &[16], 16);
        assert!((out[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_max_weight_approaches_denoised() {
        let out = blend(&[10.0], &[2.0], &[MAX_WEIGHT], 1);
        assert!((out[0] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_spp_takes_denoised() {
        let out = blend(&[10.0, 10.0], &[2.0, 2.0], &[5, 0], 0);
        assert_eq!(out, vec![2.0, 10.0]);
    }

    #[test]
    fn test_output_truncates_to_shortest() {
        let out = blend(&[1.0, 2.0, 3.0], &[1.0, 2.0], &[1, 1, 1], 4);
        assert_eq!(out.len(), 2);
        assert!(blend(&[1.0], &[1.0], &[], 4).is_empty());
    }

    #[test]
    fn test_invalid_samples_are_zero() {
        let out = blend(&[f32::NAN, 4.0], &[4.0, f32::INFINITY], &[4, 4], 4);
        assert_eq!(out, vec![2.0, 2.0]);
    }
}
