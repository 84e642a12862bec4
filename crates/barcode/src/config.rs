use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{BarcodeError, Result};

/// Tunable thresholds for both detection stages.
///
/// Every comparison against these values is strict: a region whose width
/// equals `min_width` is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct DetectorConfig {
    pub morphology: MorphologyStageConfig,
    pub gradient: GradientStageConfig,
    pub pattern: PatternConfig,
}

/// Rectangular structuring element, `width x height` pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KernelSize {
    pub width: u32,
    pub height: u32,
}

impl KernelSize {
    /// Largest side `imageproc` accepts for a mask image
    pub const MAX_SIDE: u32 = 511;

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<()> {
        let fits = |side: u32| (1..=Self::MAX_SIDE).contains(&side);
        if fits(self.width) && fits(self.height) {
            Ok(())
        } else {
            Err(BarcodeError::InvalidKernel {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Geometric bounds a region must fall strictly inside
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegionLimits {
    /// Enclosed pixel count floor
    pub min_area: f64,
    /// Width/height floor; barcodes are wide
    pub min_aspect: f64,
    /// Width/height ceiling; rejects thin horizontal lines
    pub max_aspect: f64,
    pub min_width: u32,
    /// Zero disables the height check
    pub min_height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MorphologyStageConfig {
    /// Wide and shallow, so neighbouring bars fuse into one blob
    pub kernel: KernelSize,
    pub limits: RegionLimits,
}

impl Default for MorphologyStageConfig {
    fn default() -> Self {
        Self {
            kernel: KernelSize::new(21, 7),
            limits: RegionLimits {
                min_area: 500.0,
                min_aspect: 2.5,
                max_aspect: 15.0,
                min_width: 40,
                min_height: 8,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GradientStageConfig {
    /// Sobel magnitude a pixel must exceed to count as an edge
    pub edge_threshold: f32,
    pub kernel: KernelSize,
    pub limits: RegionLimits,
}

impl Default for GradientStageConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 50.0,
            kernel: KernelSize::new(9, 3),
            limits: RegionLimits {
                min_area: 200.0,
                min_aspect: 1.5,
                max_aspect: 20.0,
                min_width: 30,
                min_height: 0,
            },
        }
    }
}

/// Bar-alternation test applied to gradient-stage regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PatternConfig {
    /// Narrower regions are rejected outright
    pub min_width: u32,
    /// A region passes with strictly more light/dark transitions than this
    pub min_transitions: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_width: 10,
            min_transitions: 6,
        }
    }
}
