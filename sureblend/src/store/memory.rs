//! In-memory store, mainly for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::{Error, ImageStore};
use crate::hdr::HdrImage;

#[derive(Debug, Default)]
pub struct MemoryStore {
    images: Mutex<HashMap<String, HdrImage>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an artifact without counting it as a save.
    pub fn insert(&self, name: impl Into<String>, image: HdrImage) {
        self.images.lock().insert(name.into(), image);
    }

    pub fn get(&self, name: &str) -> Option<HdrImage> {
        self.images.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.images.lock().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<HdrImage> {
        self.images.lock().remove(name)
    }

    /// Sorted artifact names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.images.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of `save` calls since creation.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl ImageStore for MemoryStore {
    fn load(&self, name: &str) -> Result<Option<HdrImage>, Error> {
        Ok(self.get(name))
    }

    fn save(&self, image: &HdrImage, name: &str) -> Result<(), Error> {
        if image.len() != image.dimensions.sample_count() {
            return Err(Error::BufferLength {
                name: name.to_string(),
                len: image.len(),
                expected: image.dimensions.sample_count(),
            });
        }
        self.saves.fetch_add(1, Ordering::Relaxed);
        self.images.lock().insert(name.to_string(), image.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdr::ImageDimensions;

    #[test]
    fn test_insert_is_not_a_save() {
        let store = MemoryStore::new();
        store.insert("a", HdrImage::zeros(ImageDimensions::new(1, 1)));
        assert_eq!(store.save_count(), 0);
        assert!(store.contains("a"));

        store
            .save(&HdrImage::zeros(ImageDimensions::new(1, 1)), "b")
            .unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.names(), vec!["a".to_string(), "b".to_string()]);
    }
}
