use image::GrayImage;
use crate::{
    config::{PatternConfig, RegionLimits},
    traits::RegionFilter,
    types::CandidateRegion,
};

/// Accepts wide, shallow regions of meaningful size
#[derive(Debug, Clone)]
pub struct GeometryFilter {
    pub limits: RegionLimits,
}

impl GeometryFilter {
    pub fn new(limits: RegionLimits) -> Self {
        Self { limits }
    }

    pub fn matches(&self, region: &CandidateRegion) -> bool {
        let limits = &self.limits;
        let aspect = region.aspect_ratio();

        region.area > limits.min_area
            && aspect > limits.min_aspect
            && aspect < limits.max_aspect
            && region.bounds.width > limits.min_width
            && (limits.min_height == 0 || region.bounds.height > limits.min_height)
    }
}

impl RegionFilter for GeometryFilter {
    fn accept(&self, region: &CandidateRegion, _source: &GrayImage) -> bool {
        self.matches(region)
    }
}

/// Verifies a region in the source image shows alternating bars
#[derive(Debug, Clone, Default)]
pub struct BarPatternFilter {
    pub config: PatternConfig,
}

impl RegionFilter for BarPatternFilter {
    fn accept(&self, region: &CandidateRegion, source: &GrayImage) -> bool {
        let b = region.bounds;
        let patch = image::imageops::crop_imm(source, b.x, b.y, b.width, b.height).to_image();
        is_bar_pattern(&patch, &self.config)
    }
}

/// Mean brightness of every column, left to right
pub fn column_profile(patch: &GrayImage) -> Vec<f64> {
    let (width, height) = patch.dimensions();
    if height == 0 {
        return vec![0.0; width as usize];
    }

    (0..width)
        .map(|x| {
            let sum: u64 = (0..height).map(|y| patch.get_pixel(x, y)[0] as u64).sum();
            sum as f64 / height as f64
        })
        .collect()
}

/// Number of positions where the profile crosses its own mean
pub fn count_transitions(profile: &[f64]) -> usize {
    if profile.is_empty() {
        return 0;
    }

    let mean = profile.iter().sum::<f64>() / profile.len() as f64;
    let bits: Vec<bool> = profile.iter().map(|&v| v > mean).collect();
    bits.windows(2).filter(|pair| pair[0] != pair[1]).count()
}

/// Barcode-pattern test: many light/dark alternations across the width
pub fn is_bar_pattern(patch: &GrayImage, config: &PatternConfig) -> bool {
    if patch.width() < config.min_width {
        return false;
    }
    count_transitions(&column_profile(patch)) > config.min_transitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GradientStageConfig, MorphologyStageConfig};
    use crate::types::BoundingBox;
    use image::Luma;

    /// `stripes` vertical stripes of `stripe_width`, starting dark
    fn stripes(count: u32, stripe_width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(count * stripe_width, height, |x, _| {
            if (x / stripe_width) % 2 == 0 { Luma([10u8]) } else { Luma([240u8]) }
        })
    }

    fn region(width: u32, height: u32, area: f64) -> CandidateRegion {
        CandidateRegion::from_measurements(BoundingBox { x: 0, y: 0, width, height }, area)
    }

    #[test]
    fn test_transition_counting() {
        assert_eq!(count_transitions(&[0.0, 10.0, 0.0, 10.0]), 3);
        assert_eq!(count_transitions(&[5.0, 5.0, 5.0]), 0);
        assert_eq!(count_transitions(&[]), 0);
    }

    #[test]
    fn test_seven_transitions_pass() {
        let patch = stripes(8, 5, 12);
        assert_eq!(count_transitions(&column_profile(&patch)), 7);
        assert!(is_bar_pattern(&patch, &PatternConfig::default()));
    }

    #[test]
    fn test_six_transitions_fail() {
        let patch = stripes(7, 5, 12);
        assert_eq!(count_transitions(&column_profile(&patch)), 6);
        assert!(!is_bar_pattern(&patch, &PatternConfig::default()));
    }

    #[test]
    fn test_narrow_patch_rejected() {
        let patch = stripes(9, 1, 12);
        assert_eq!(patch.width(), 9);
        assert!(!is_bar_pattern(&patch, &PatternConfig::default()));
    }

    #[test]
    fn test_morphology_limits_boundary() {
        let filter = GeometryFilter::new(MorphologyStageConfig::default().limits);

        assert!(filter.matches(&region(41, 9, 501.0)));
        assert!(!filter.matches(&region(39, 9, 501.0)));
        assert!(!filter.matches(&region(40, 9, 501.0)));
        assert!(!filter.matches(&region(41, 8, 501.0)));
        assert!(!filter.matches(&region(41, 9, 500.0)));
        // 300 / 20 = 15 sits on the aspect ceiling
        assert!(!filter.matches(&region(300, 20, 6000.0)));
        // 50 / 20 = 2.5 sits on the aspect floor
        assert!(!filter.matches(&region(50, 20, 1000.0)));
    }

    #[test]
    fn test_gradient_limits_ignore_height() {
        let filter = GeometryFilter::new(GradientStageConfig::default().limits);

        assert!(filter.matches(&region(31, 2, 201.0)));
        assert!(!filter.matches(&region(30, 2, 201.0)));
        assert!(!filter.matches(&region(40, 2, 200.0)));
        assert!(!filter.matches(&region(40, 40, 1600.0)));
    }

    #[test]
    fn test_bar_pattern_filter_crops_the_region() {
        let mut source = GrayImage::from_pixel(100, 40, Luma([240u8]));
        let bars = stripes(10, 4, 10);
        image::imageops::replace(&mut source, &bars, 20, 15);

        let filter = BarPatternFilter::default();
        let on_bars = region_at(20, 15, 40, 10);
        let on_blank = region_at(60, 15, 40, 10);

        assert!(filter.accept(&on_bars, &source));
        assert!(!filter.accept(&on_blank, &source));
    }

    fn region_at(x: u32, y: u32, width: u32, height: u32) -> CandidateRegion {
        CandidateRegion::from_measurements(BoundingBox { x, y, width, height }, (width * height) as f64)
    }
}
