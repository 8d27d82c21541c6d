#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use sureblend::{DenoiseError, DenoiseRequest, Denoiser, HdrImage, ImageDimensions, ImageStore, StoreError};

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Returns the same image for every input; its divergence is zero.
pub struct ConstantDenoiser(pub Vec<f32>);

impl Denoiser for ConstantDenoiser {
    fn name(&self) -> &str {
        "constant"
    }

    fn denoise(&mut self, _request: &DenoiseRequest) -> Result<Vec<f32>, DenoiseError> {
        Ok(self.0.clone())
    }
}

/// Forwards to an inner store and counts writes.
pub struct CountingStore<S> {
    pub inner: S,
    saves: AtomicUsize,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            saves: AtomicUsize::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl<S: ImageStore> ImageStore for CountingStore<S> {
    fn load(&self, name: &str) -> Result<Option<HdrImage>, StoreError> {
        self.inner.load(name)
    }

    fn save(&self, image: &HdrImage, name: &str) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::Relaxed);
        self.inner.save(image, name)
    }
}

/// Writes noisy renders (Gaussian noise of variance `0.5 / spp`), variances
/// and albedo for every sample count.
pub fn write_renders<S: ImageStore>(
    store: &S,
    scene: &str,
    dims: ImageDimensions,
    sample_counts: &[u32],
    seed: u64,
) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let clean: Vec<f32> = (0..dims.sample_count())
        .map(|i| 0.25 + 0.5 * (i % 7) as f32 / 7.0)
        .collect();

    for &spp in sample_counts {
        let variance = 0.5 / spp as f32;
        let noisy = clean
            .iter()
            .map(|&c| {
                let n: f32 = StandardNormal.sample(&mut rng);
                c + variance.sqrt() * n
            })
            .collect();
        let stem = format!("{scene}_{spp:06}spp");
        store
            .save(&HdrImage::new(dims, noisy), &format!("{stem}.hdr"))
            .unwrap();
        store
            .save(&HdrImage::filled(dims, variance), &format!("{stem}.var"))
            .unwrap();
        store
            .save(&HdrImage::filled(dims, 0.6), &format!("{stem}.alb"))
            .unwrap();
    }
}
