//! CPU fallback back-end.

use super::{DenoiseRequest, Denoiser, Error};
use crate::smoothing::{DEFAULT_KERNEL_SIZE, gaussian_blur_sigma};

/// Fixed-bandwidth Gaussian blur of the colour channels.
///
/// Auxiliary buffers are ignored. Not an edge-aware filter; it exists so the
/// pipeline runs end to end without a GPU denoiser.
#[derive(Debug, Clone, Copy)]
pub struct GaussianDenoiser {
    pub kernel_size: usize,
    pub sigma: f32,
}

impl Default for GaussianDenoiser {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_KERNEL_SIZE,
            sigma: 1.5,
        }
    }
}

impl GaussianDenoiser {
    pub fn new(kernel_size: usize, sigma: f32) -> Self {
        assert!(kernel_size % 2 == 1, "Kernel size must be odd");
        assert!(sigma > 0.0, "Sigma must be positive");
        Self { kernel_size, sigma }
    }
}

impl Denoiser for GaussianDenoiser {
    fn name(&self) -> &str {
        "gauss"
    }

    fn denoise(&mut self, request: &DenoiseRequest) -> Result<Vec<f32>, Error> {
        Ok(gaussian_blur_sigma(
            &request.color,
            request.dimensions,
            self.sigma,
            self.kernel_size,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdr::{HdrImage, ImageDimensions};

    #[test]
    fn test_constant_image_unchanged() {
        let request = DenoiseRequest::new(&HdrImage::filled(ImageDimensions::new(5, 4), 0.75));
        let out = GaussianDenoiser::default().denoise(&request).unwrap();
        assert!(out.iter().all(|&v| (v - 0.75).abs() < 1e-5));
    }

    #[test]
    fn test_is_deterministic() {
        let dims = ImageDimensions::new(6, 6);
        let pixels: Vec<f32> = (0..dims.sample_count()).map(|i| (i % 7) as f32).collect();
        let request = DenoiseRequest::new(&HdrImage::new(dims, pixels));
        let mut denoiser = GaussianDenoiser::new(5, 1.0);
        assert_eq!(
            denoiser.denoise(&request).unwrap(),
            denoiser.denoise(&request).unwrap()
        );
    }

    #[test]
    #[should_panic(expected = "Kernel size must be odd")]
    fn test_even_kernel_panics() {
        GaussianDenoiser::new(4, 1.0);
    }
}
