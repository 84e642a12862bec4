use std::path::Path;

use image::GrayImage;
use tracing::{debug, warn};

use crate::{
    config::DetectorConfig,
    error::{BarcodeError, Result},
    pipeline::{Pipeline, builder::PipelineBuilder},
    types::{DetectionReport, DetectionStage},
};

/// Two-stage barcode presence detector.
///
/// The gradient stage only runs when the morphology stage found nothing.
/// Counts are presence evidence, not decoded symbols.
pub struct BarcodeDetector {
    config: DetectorConfig,
    pub(crate) morphology: Pipeline,
    pub(crate) gradient: Pipeline,
}

impl BarcodeDetector {
    /// Fails when either stage's structuring element is unusable
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let morphology = PipelineBuilder::morphology_stage(&config.morphology)?;
        let gradient = PipelineBuilder::gradient_stage(&config.gradient, &config.pattern)?;
        Ok(Self {
            config,
            morphology,
            gradient,
        })
    }

    /// Run both stages over a decoded grayscale image
    pub fn detect(&self, image: &GrayImage) -> Result<DetectionReport> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(BarcodeError::EmptyImage { width, height });
        }

        let found = self.morphology.process(image)?.len();
        if found > 0 {
            debug!(count = found, "morphology stage found candidates");
            return Ok(DetectionReport::found(DetectionStage::Morphology, found));
        }

        let found = self.gradient.process(image)?.len();
        debug!(count = found, "gradient stage finished");
        Ok(DetectionReport::found(DetectionStage::Gradient, found))
    }

    /// Decode `path` and run [`Self::detect`]; decode failures stay distinct
    pub fn detect_file(&self, path: impl AsRef<Path>) -> Result<DetectionReport> {
        let image = image::open(path.as_ref())?.to_luma8();
        self.detect(&image)
    }

    /// Number of barcode-like regions; any failure counts as none found
    pub fn count_barcodes(&self, image: &GrayImage) -> usize {
        match self.detect(image) {
            Ok(report) => report.count,
            Err(e) => {
                warn!("Barcode detection failed: {}", e);
                0
            }
        }
    }

    /// Like [`Self::count_barcodes`] for a file. An unreadable file is
    /// indistinguishable from an image without a barcode here; call
    /// [`Self::detect_file`] to tell them apart.
    pub fn count_in_file(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        match self.detect_file(path) {
            Ok(report) => report.count,
            Err(e) => {
                warn!("Barcode detection failed for {:?}: {}", path, e);
                0
            }
        }
    }
}

impl std::fmt::Debug for BarcodeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BarcodeDetector")
            .field("config", &self.config)
            .field("morphology", &self.morphology.info())
            .field("gradient", &self.gradient.info())
            .finish()
    }
}
