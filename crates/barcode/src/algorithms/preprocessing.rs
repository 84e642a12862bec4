use image::{GrayImage, Luma};
use imageproc::contrast::ThresholdType;

use crate::{error::Result, traits::ImagePreprocessor};

/// Swaps dark and light so printed bars become foreground
#[derive(Debug, Clone, Default)]
pub struct InvertPreprocessor;

impl ImagePreprocessor for InvertPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let mut inverted = image.clone();
        image::imageops::invert(&mut inverted);
        Ok(inverted)
    }
}

/// Global binarisation at the level picked by Otsu's method
#[derive(Debug, Clone, Default)]
pub struct OtsuPreprocessor;

impl ImagePreprocessor for OtsuPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let level = imageproc::contrast::otsu_level(image);
        tracing::trace!(level, "otsu level");
        Ok(imageproc::contrast::threshold(image, level, ThresholdType::Binary))
    }
}

/// Binary edge map from the 3x3 Sobel gradient magnitude
#[derive(Debug, Clone)]
pub struct SobelMagnitudePreprocessor {
    pub threshold: f32,
}

impl Default for SobelMagnitudePreprocessor {
    fn default() -> Self {
        Self { threshold: 50.0 }
    }
}

impl ImagePreprocessor for SobelMagnitudePreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let gx = imageproc::gradients::horizontal_sobel(image);
        let gy = imageproc::gradients::vertical_sobel(image);

        let edges = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let dx = gx.get_pixel(x, y)[0] as f32;
            let dy = gy.get_pixel(x, y)[0] as f32;
            if (dx * dx + dy * dy).sqrt() > self.threshold {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });

        Ok(edges)
    }
}
