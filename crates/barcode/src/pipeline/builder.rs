use crate::{
    algorithms::{
        BarPatternFilter, ExternalContourExtractor, GeometryFilter, InvertPreprocessor, OtsuPreprocessor,
        RectClosePreprocessor, SobelMagnitudePreprocessor,
    },
    config::{GradientStageConfig, MorphologyStageConfig, PatternConfig},
    error::Result,
    pipeline::Pipeline,
    traits::{ContourExtractor, ImagePreprocessor, RegionFilter},
};

/// Fluent assembly of a [`Pipeline`]
#[derive(Default)]
pub struct PipelineBuilder {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    extractor: Option<Box<dyn ContourExtractor>>,
    filters: Vec<Box<dyn RegionFilter>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Replaces the default outer-border tracer
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Filters run in insertion order and stop at the first rejection
    pub fn add_region_filter<F>(mut self, filter: F) -> Self
    where
        F: RegionFilter + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn build(self) -> Pipeline {
        let extractor = self
            .extractor
            .unwrap_or_else(|| Box::new(ExternalContourExtractor));
        Pipeline::new(self.preprocessors, extractor, self.filters)
    }

    /// Stage 1: fuse dark bars into blobs, binarise, keep wide shallow blobs
    pub fn morphology_stage(config: &MorphologyStageConfig) -> Result<Pipeline> {
        Ok(Self::new()
            .add_preprocessor(InvertPreprocessor)
            .add_preprocessor(RectClosePreprocessor::with_kernel(config.kernel)?)
            .add_preprocessor(OtsuPreprocessor)
            .add_region_filter(GeometryFilter::new(config.limits))
            .build())
    }

    /// Stage 2: strong edges joined into regions that must show alternating bars
    pub fn gradient_stage(config: &GradientStageConfig, pattern: &PatternConfig) -> Result<Pipeline> {
        Ok(Self::new()
            .add_preprocessor(SobelMagnitudePreprocessor { threshold: config.edge_threshold })
            .add_preprocessor(RectClosePreprocessor::with_kernel(config.kernel)?)
            .add_region_filter(GeometryFilter::new(config.limits))
            .add_region_filter(BarPatternFilter { config: *pattern })
            .build())
    }
}
