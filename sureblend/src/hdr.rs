//! Flat RGB float images.

use std::fmt;

/// Samples per pixel in every buffer (RGB, channel-interleaved).
pub const CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageDimensions {
    pub width: usize,
    pub height: usize,
}

impl ImageDimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Number of floats in an RGB buffer of these dimensions.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * CHANNELS
    }
}

impl fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A row-major, channel-interleaved RGB float image.
///
/// Used for every artifact of the pipeline: noisy renders, variance estimates,
/// risk maps, weights and the blended output.
#[derive(Debug, Clone, PartialEq)]
pub struct HdrImage {
    pub dimensions: ImageDimensions,
    pub pixels: Vec<f32>,
}

impl HdrImage {
    pub fn new(dimensions: ImageDimensions, pixels: Vec<f32>) -> Self {
        assert_eq!(
            pixels.len(),
            dimensions.sample_count(),
            "pixels length must equal width * height * 3"
        );
        Self { dimensions, pixels }
    }

    pub fn zeros(dimensions: ImageDimensions) -> Self {
        Self::new(dimensions, vec![0.0; dimensions.sample_count()])
    }

    /// Image with every sample set to `value`.
    pub fn filled(dimensions: ImageDimensions, value: f32) -> Self {
        Self::new(dimensions, vec![value; dimensions.sample_count()])
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.dimensions.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.dimensions.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    #[inline]
    pub fn into_pixels(self) -> Vec<f32> {
        self.pixels
    }

    /// RGB triple of pixel `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [f32; CHANNELS] {
        debug_assert!(x < self.width() && y < self.height());
        let idx = (y * self.width() + x) * CHANNELS;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_counts() {
        let dims = ImageDimensions::new(4, 3);
        assert_eq!(dims.pixel_count(), 12);
        assert_eq!(dims.sample_count(), 36);
        assert_eq!(dims.to_string(), "4x3");
    }

    #[test]
    fn test_pixel_access() {
        let dims = ImageDimensions::new(2, 2);
        let pixels: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let image = HdrImage::new(dims, pixels);
        assert_eq!(image.pixel(0, 0), [0.0, 1.0, 2.0]);
        assert_eq!(image.pixel(1, 1), [9.0, 10.0, 11.0]);
    }

    #[test]
    #[should_panic(expected = "pixels length must equal")]
    fn test_new_rejects_wrong_length() {
        HdrImage::new(ImageDimensions::new(2, 2), vec![0.0; 5]);
    }
}
