use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_close};

use crate::{config::KernelSize, error::Result, traits::ImagePreprocessor};

/// Grayscale closing (dilate, then erode) with a rectangular element.
///
/// Mask points that fall outside the image are ignored, so the border never
/// takes part in the min/max.
#[derive(Debug, Clone)]
pub struct RectClosePreprocessor {
    kernel: KernelSize,
    mask: Mask,
}

impl RectClosePreprocessor {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_kernel(KernelSize::new(width, height))
    }

    /// Builds the structuring element once; it is reused for every image
    pub fn with_kernel(kernel: KernelSize) -> Result<Self> {
        kernel.validate()?;
        let element = GrayImage::from_pixel(kernel.width, kernel.height, Luma([255u8]));
        // validate() bounds both sides to 511, so the centre fits in a u8
        let mask = Mask::from_image(&element, (kernel.width / 2) as u8, (kernel.height / 2) as u8);
        Ok(Self { kernel, mask })
    }

    pub fn kernel(&self) -> KernelSize {
        self.kernel
    }
}

impl ImagePreprocessor for RectClosePreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(grayscale_close(image, &self.mask))
    }
}
