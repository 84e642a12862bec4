use image::GrayImage;
use imageproc::contours::BorderType;
use crate::{error::Result, traits::ContourExtractor};

/// Imageproc-based extractor keeping only outermost borders.
///
/// Hole borders and borders nested inside a hole are dropped, so every
/// foreground blob yields exactly one contour.
#[derive(Debug, Clone, Default)]
pub struct ExternalContourExtractor;

impl ContourExtractor for ExternalContourExtractor {
    fn extract_contours(&self, binary_image: &GrayImage) -> Result<Vec<Vec<[f32; 2]>>> {
        let contours = imageproc::contours::find_contours::<i32>(binary_image);

        let result = contours
            .into_iter()
            .filter(|contour| matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none())
            .map(|contour| {
                contour.points
                    .iter()
                    .map(|p| [p.x as f32, p.y as f32])
                    .collect()
            })
            .collect();

        Ok(result)
    }
}
