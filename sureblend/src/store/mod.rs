//! Named image artifacts.
//!
//! The pipeline reads its inputs and memoizes every intermediate result through
//! an [`ImageStore`]. A missing artifact is not an error: `load` returns
//! `Ok(None)` and the caller recomputes.

mod error;
mod exr;
mod memory;

pub use error::Error;
pub use exr::ExrStore;
pub use memory::MemoryStore;

use crate::curve::CurveParam;
use crate::hdr::{HdrImage, ImageDimensions};

/// Scale used to persist integer weights as floats.
const WEIGHT_SCALE: f32 = 100_000.0;

/// Backing store for named RGB float images.
pub trait ImageStore: Send + Sync {
    /// Loads the artifact called `name`, or `Ok(None)` if it does not exist.
    fn load(&self, name: &str) -> Result<Option<HdrImage>, Error>;

    /// Persists `image` under `name`, replacing any previous artifact.
    fn save(&self, image: &HdrImage, name: &str) -> Result<(), Error>;
}

impl<S: ImageStore + ?Sized> ImageStore for &S {
    fn load(&self, name: &str) -> Result<Option<HdrImage>, Error> {
        (**self).load(name)
    }

    fn save(&self, image: &HdrImage, name: &str) -> Result<(), Error> {
        (**self).save(image, name)
    }
}

/// Loads `name` and checks it against `dimensions`.
pub fn load_with_dimensions<S: ImageStore + ?Sized>(
    store: &S,
    name: &str,
    dimensions: ImageDimensions,
) -> Result<Option<HdrImage>, Error> {
    match store.load(name)? {
        Some(image) if image.dimensions != dimensions => Err(Error::DimensionMismatch {
            name: name.to_string(),
            expected: dimensions,
            actual: image.dimensions,
        }),
        other => Ok(other),
    }
}

pub fn save_weights<S: ImageStore + ?Sized>(
    store: &S,
    weights: &[u32],
    dimensions: ImageDimensions,
    name: &str,
) -> Result<(), Error> {
    let pixels = weights.iter().map(|&w| w as f32 / WEIGHT_SCALE).collect();
    store.save(&HdrImage::new(dimensions, pixels), name)
}

pub fn load_weights<S: ImageStore + ?Sized>(
    store: &S,
    name: &str,
    dimensions: ImageDimensions,
) -> Result<Option<Vec<u32>>, Error> {
    let Some(image) = load_with_dimensions(store, name, dimensions)? else {
        return Ok(None);
    };
    let weights = image
        .pixels
        .iter()
        .map(|&v| (v * WEIGHT_SCALE).round().max(0.0) as u32)
        .collect();
    Ok(Some(weights))
}

/// Persists curve parameters as two images: `a` under `slope_name`, `b` under
/// `intercept_name`.
pub fn save_curves<S: ImageStore + ?Sized>(
    store: &S,
    curves: &[CurveParam],
    dimensions: ImageDimensions,
    slope_name: &str,
    intercept_name: &str,
) -> Result<(), Error> {
    let a = curves.iter().map(|c| c.a).collect();
    let b = curves.iter().map(|c| c.b).collect();
    store.save(&HdrImage::new(dimensions, a), slope_name)?;
    store.save(&HdrImage::new(dimensions, b), intercept_name)
}

pub fn load_curves<S: ImageStore + ?Sized>(
    store: &S,
    slope_name: &str,
    intercept_name: &str,
    dimensions: ImageDimensions,
) -> Result<Option<Vec<CurveParam>>, Error> {
    let Some(a) = load_with_dimensions(store, slope_name, dimensions)? else {
        return Ok(None);
    };
    let Some(b) = load_with_dimensions(store, intercept_name, dimensions)? else {
        return Ok(None);
    };
    let curves = a
        .pixels
        .iter()
        .zip(&b.pixels)
        .map(|(&a, &b)| CurveParam { a, b })
        .collect();
    Ok(Some(curves))
}
