pub mod builder;

use image::GrayImage;
use tracing::trace;

use crate::{
    error::Result,
    traits::{ContourExtractor, ImagePreprocessor, RegionFilter},
    types::CandidateRegion,
};

/// One candidate-generation pass: preprocess, trace, filter
pub struct Pipeline {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    extractor: Box<dyn ContourExtractor>,
    filters: Vec<Box<dyn RegionFilter>>,
}

impl Pipeline {
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        extractor: Box<dyn ContourExtractor>,
        filters: Vec<Box<dyn RegionFilter>>,
    ) -> Self {
        Self {
            preprocessors,
            extractor,
            filters,
        }
    }

    /// Image after every preprocessor, in insertion order
    pub fn prepare(&self, image: &GrayImage) -> Result<GrayImage> {
        self.preprocessors
            .iter()
            .try_fold(image.clone(), |current, step| step.preprocess(&current))
    }

    /// Regions traced from the prepared image that every filter accepts.
    ///
    /// Filters judge regions against `image` as given, not the prepared one.
    pub fn process(&self, image: &GrayImage) -> Result<Vec<CandidateRegion>> {
        let prepared = self.prepare(image)?;
        let contours = self.extractor.extract_contours(&prepared)?;
        let traced = contours.len();

        let regions: Vec<CandidateRegion> = contours
            .into_iter()
            .filter_map(CandidateRegion::from_contour)
            .filter(|region| self.filters.iter().all(|f| f.accept(region, image)))
            .collect();

        trace!(traced, accepted = regions.len(), "pipeline pass");
        Ok(regions)
    }

    /// Short description for debug output
    pub fn info(&self) -> String {
        format!(
            "{} preprocessor(s), {} region filter(s)",
            self.preprocessors.len(),
            self.filters.len()
        )
    }
}
