use image::GrayImage;
use crate::{error::Result, types::CandidateRegion};

/// Trait for image preprocessing algorithms
pub trait ImagePreprocessor: Send + Sync {
    /// Preprocess the input image (e.g., invert, close, binarise)
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract contours from a binary image
    fn extract_contours(&self, image: &GrayImage) -> Result<Vec<Vec<[f32; 2]>>>;
}

/// Trait for accepting or rejecting candidate regions
pub trait RegionFilter: Send + Sync {
    /// Decide whether `region` still looks like a barcode.
    ///
    /// `source` is the grayscale image the pipeline started from, before any
    /// preprocessing.
    fn accept(&self, region: &CandidateRegion, source: &GrayImage) -> bool;
}
