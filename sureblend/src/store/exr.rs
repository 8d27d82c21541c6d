//! Directory of OpenEXR files.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb32FImage};

use super::{Error, ImageStore};
use crate::hdr::{HdrImage, ImageDimensions};

const EXTENSION: &str = "exr";

/// Stores artifacts as `{dir}/{name}.exr`, RGB 32-bit float.
#[derive(Debug, Clone)]
pub struct ExrStore {
    dir: PathBuf,
}

impl ExrStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }
}

impl ImageStore for ExrStore {
    fn load(&self, name: &str) -> Result<Option<HdrImage>, Error> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Ok(None);
        }

        // An unreadable artifact is recomputed rather than failing the run.
        let decoded = match image::open(&path) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable artifact, ignoring");
                return Ok(None);
            }
        };

        let rgb = decoded.into_rgb32f();
        let dimensions = ImageDimensions::new(rgb.width() as usize, rgb.height() as usize);
        Ok(Some(HdrImage::new(dimensions, rgb.into_raw())))
    }

    fn save(&self, image: &HdrImage, name: &str) -> Result<(), Error> {
        std::fs::create_dir_all(&self.dir).map_err(|source| Error::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(name);
        let buffer = Rgb32FImage::from_raw(
            image.width() as u32,
            image.height() as u32,
            image.pixels.clone(),
        )
        .ok_or_else(|| Error::BufferLength {
            name: name.to_string(),
            len: image.len(),
            expected: image.dimensions.sample_count(),
        })?;

        DynamicImage::ImageRgb32F(buffer)
            .save_with_format(&path, ImageFormat::OpenExr)
            .map_err(|source| Error::Write { path, source })?;

        tracing::debug!(artifact = name, "Saved artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExrStore::new(dir.path());
        assert!(store.load("scene_000016spp.var").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_preserves_samples() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExrStore::new(dir.path().join("nested"));
        let dims = ImageDimensions::new(3, 2);
        let pixels: Vec<f32> = (0..18).map(|i| i as f32 * 0.125 - 1.0).collect();
        let image = HdrImage::new(dims, pixels);

        store.save(&image, "scene_000016spp.hdr").unwrap();
        assert!(store.path_for("scene_000016spp.hdr").is_file());

        let loaded = store.load("scene_000016spp.hdr").unwrap().unwrap();
        assert_eq!(loaded.dimensions, dims);
        for (a, b) in loaded.pixels.iter().zip(&image.pixels) {
            assert!((a - b).abs() < 1e-6, "{a} != {b}");
        }
    }

    #[test]
    fn test_corrupt_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExrStore::new(dir.path());
        std::fs::write(store.path_for("broken"), b"not an exr").unwrap();
        assert!(store.load("broken").unwrap().is_none());
    }
}
