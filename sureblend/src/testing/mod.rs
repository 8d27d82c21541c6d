//! Testing utilities for sureblend.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::denoise::{DenoiseRequest, Denoiser, Error};
use crate::hdr::{CHANNELS, HdrImage, ImageDimensions};
use crate::pipeline::checkpoint_stem;
use crate::store::MemoryStore;

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Returns its input unchanged.
pub struct IdentityDenoiser;

impl Denoiser for IdentityDenoiser {
    fn name(&self) -> &str {
        "identity"
    }

    fn denoise(&mut self, request: &DenoiseRequest) -> Result<Vec<f32>, Error> {
        Ok(request.color.clone())
    }
}

/// Linear denoiser `f(x) = gain * x`; its divergence per sample is `gain`.
pub struct GainDenoiser(pub f32);

impl Denoiser for GainDenoiser {
    fn name(&self) -> &str {
        "gain"
    }

    fn denoise(&mut self, request: &DenoiseRequest) -> Result<Vec<f32>, Error> {
        Ok(request.color.iter().map(|v| v * self.0).collect())
    }
}

/// Always fails.
pub struct FailingDenoiser;

impl Denoiser for FailingDenoiser {
    fn name(&self) -> &str {
        "failing"
    }

    fn denoise(&mut self, _request: &DenoiseRequest) -> Result<Vec<f32>, Error> {
        Err(Error::Backend("simulated failure".to_string()))
    }
}

/// Single-pixel image with all three channels set to `value`.
pub fn pixel(value: f32) -> HdrImage {
    HdrImage::filled(ImageDimensions::new(1, 1), value)
}

/// Counts calls made to the wrapped denoiser.
pub struct CountingDenoiser<D> {
    inner: D,
    calls: Arc<AtomicUsize>,
}

impl<D: Denoiser> CountingDenoiser<D> {
    pub fn new(inner: D) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let denoiser = Self {
            inner,
            calls: Arc::clone(&calls),
        };
        (denoiser, calls)
    }
}

impl<D: Denoiser> Denoiser for CountingDenoiser<D> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn denoise(&mut self, request: &DenoiseRequest) -> Result<Vec<f32>, Error> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.denoise(request)
    }
}

/// Succeeds for the first `remaining` calls, then fails.
pub struct FlakyDenoiser<D> {
    pub inner: D,
    pub remaining: usize,
}

impl<D: Denoiser> Denoiser for FlakyDenoiser<D> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn denoise(&mut self, request: &DenoiseRequest) -> Result<Vec<f32>, Error> {
        if self.remaining == 0 {
            return Err(Error::Backend("device lost".to_string()));
        }
        self.remaining -= 1;
        self.inner.denoise(request)
    }
}

/// Per-sample variance of a render with `spp` samples.
pub fn render_variance(spp: u32) -> f32 {
    0.5 / spp as f32
}

/// Fills `store` with noisy renders, variances, albedo and normals of `scene`
/// at every sample count. The noise is Gaussian with `render_variance(spp)`.
pub fn render_checkpoints(
    store: &MemoryStore,
    scene: &str,
    dims: ImageDimensions,
    sample_counts: &[u32],
    seed: u64,
) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let clean: Vec<f32> = (0..dims.height)
        .flat_map(|y| (0..dims.width).map(move |x| (x, y)))
        .flat_map(|(x, y)| {
            let base = 0.2 + 0.6 * x as f32 / dims.width as f32;
            [base, base * 0.8, 0.3 + 0.1 * y as f32 / dims.height as f32]
        })
        .collect();
    debug_assert_eq!(clean.len(), dims.pixel_count() * CHANNELS);

    for &spp in sample_counts {
        let variance = render_variance(spp);
        let sigma = variance.sqrt();
        let noisy = clean
            .iter()
            .map(|&c| {
                let n: f32 = StandardNormal.sample(&mut rng);
                c + sigma * n
            })
            .collect();

        let stem = checkpoint_stem(scene, spp);
        store.insert(format!("{stem}.hdr"), HdrImage::new(dims, noisy));
        store.insert(format!("{stem}.var"), HdrImage::filled(dims, variance));
        store.insert(format!("{stem}.alb"), HdrImage::filled(dims, 0.5));
        store.insert(format!("{stem}.nrm"), HdrImage::filled(dims, 0.577));
    }
}
