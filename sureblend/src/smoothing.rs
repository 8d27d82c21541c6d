//! Spatial Gaussian smoothing of variance and risk buffers.

use common::float_ext::FloatExt;
use rayon::prelude::*;

use crate::hdr::{CHANNELS, HdrImage, ImageDimensions};
use crate::math;

/// Window size of the smoothing kernel.
pub const DEFAULT_KERNEL_SIZE: usize = 11;

/// Gaussian sigma for a buffer whose mean is `mean`.
///
/// Noisier buffers get wider kernels: `sigma = max(sqrt(mean), 1e-3) * 100`.
pub fn bandwidth_from_mean(mean: f32) -> f32 {
    mean.max(0.0).sqrt().max(1e-3) * 100.0
}

/// Normalised `size x size` Gaussian kernel, row-major.
pub fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    assert!(size % 2 == 1, "Kernel size must be odd");
    let half = (size / 2) as i64;
    let two_sigma_sq = 2.0 * f64::from(sigma) * f64::from(sigma);

    let mut kernel: Vec<f64> = Vec::with_capacity(size * size);
    for ky in -half..=half {
        for kx in -half..=half {
            kernel.push((-((kx * kx + ky * ky) as f64) / two_sigma_sq).exp());
        }
    }
    let sum: f64 = kernel.iter().sum();
    kernel.iter().map(|&w| (w / sum) as f32).collect()
}

/// Smooths `src` with a kernel whose bandwidth comes from the mean of
/// `bandwidth_source` (typically the variance buffer itself).
pub fn gaussian_blur(src: &HdrImage, bandwidth_source: &[f32], kernel_size: usize) -> HdrImage {
    let sigma = bandwidth_from_mean(math::mean(bandwidth_source));
    let pixels = gaussian_blur_sigma(&src.pixels, src.dimensions, sigma, kernel_size);
    HdrImage::new(src.dimensions, pixels)
}

/// Smooths an RGB buffer with a fixed sigma. Borders clamp to the edge pixel,
/// invalid samples count as zero.
pub fn gaussian_blur_sigma(
    src: &[f32],
    dimensions: ImageDimensions,
    sigma: f32,
    kernel_size: usize,
) -> Vec<f32> {
    let ImageDimensions { width, height } = dimensions;
    debug_assert_eq!(src.len(), dimensions.sample_count());
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let kernel = gaussian_kernel(kernel_size, sigma);
    let half = (kernel_size / 2) as isize;
    let row_len = width * CHANNELS;
    let mut dst = vec![0.0f32; src.len()];

    dst.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let mut acc = [0.0f32; CHANNELS];
                let mut k = kernel.iter();
                for ky in -half..=half {
                    let sy = (y as isize + ky).clamp(0, height as isize - 1) as usize;
                    for kx in -half..=half {
                        let sx = (x as isize + kx).clamp(0, width as isize - 1) as usize;
                        let weight = k.next().copied().unwrap_or(0.0);
                        let idx = (sy * width + sx) * CHANNELS;
                        for (c, a) in acc.iter_mut().enumerate() {
                            *a += weight * src[idx + c].sanitized();
                        }
                    }
                }
                row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&acc);
            }
        });

    dst
}
