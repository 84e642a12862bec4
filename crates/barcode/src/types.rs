use serde::{Deserialize, Serialize};
use geo_types::{Coord, LineString, Polygon};
use strum::Display;

/// Axis-aligned bounds of a region, inclusive of its border pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Bounds of a traced border; `None` for an empty point list
    pub fn from_points(points: &[[f32; 2]]) -> Option<Self> {
        let mut iter = points.iter();
        let &[first_x, first_y] = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first_x, first_y, first_x, first_y);

        for &[x, y] in iter {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let (min_x, min_y) = (min_x.max(0.0), min_y.max(0.0));
        Some(Self {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x) as u32 + 1,
            height: (max_y - min_y) as u32 + 1,
        })
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

/// A region traced from an external contour, suspected to hold a barcode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRegion {
    /// The traced border, one point per border pixel
    pub contour: Vec<[f32; 2]>,
    pub bounds: BoundingBox,
    /// Number of pixels enclosed by the border, border included
    pub area: f64,
}

impl CandidateRegion {
    pub fn from_contour(contour: Vec<[f32; 2]>) -> Option<Self> {
        let bounds = BoundingBox::from_points(&contour)?;
        let area = enclosed_pixel_count(&contour);
        Some(Self { contour, bounds, area })
    }

    /// Build a region from known measurements, without a traced border
    pub fn from_measurements(bounds: BoundingBox, area: f64) -> Self {
        Self {
            contour: Vec::new(),
            bounds,
            area,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.bounds.aspect_ratio()
    }

    /// The traced border as a geo-types polygon
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        border_polygon(&self.contour)
    }
}

fn border_polygon(contour: &[[f32; 2]]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = contour
        .iter()
        .map(|&[x, y]| Coord { x: x as f64, y: y as f64 })
        .collect();
    Polygon::new(LineString::new(coords), vec![])
}

/// Pixel count of a traced border on the pixel lattice.
///
/// Pick's theorem: interior + boundary = area + boundary / 2 + 1, where every
/// step of a traced border moves to an 8-neighbour so each point is exactly
/// one lattice point on the boundary.
fn enclosed_pixel_count(contour: &[[f32; 2]]) -> f64 {
    use geo::Area;

    match contour.len() {
        0 => 0.0,
        1 => 1.0,
        boundary => border_polygon(contour).unsigned_area() + boundary as f64 / 2.0 + 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetectionStage {
    /// Morphological closing + Otsu binarisation
    Morphology,
    /// Sobel edges + bar-pattern verification
    Gradient,
}

/// Outcome of running the detector over one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DetectionReport {
    /// Stage that produced the count, `None` when nothing was found
    pub stage: Option<DetectionStage>,
    pub count: usize,
}

impl DetectionReport {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn found(stage: DetectionStage, count: usize) -> Self {
        if count == 0 {
            return Self::none();
        }
        Self { stage: Some(stage), count }
    }

    pub fn has_barcode(&self) -> bool {
        self.count > 0
    }
}
