//! # Barcode Presence Detection
//!
//! Decides whether a grayscale photo contains something shaped like a
//! barcode. Nothing is decoded; the detector only counts candidate regions.
//!
//! ## Stages
//!
//! - **Morphology**: invert, close with a wide rectangle so neighbouring bars
//!   fuse, binarise with Otsu, keep wide and shallow blobs.
//! - **Gradient** (only when the first stage found nothing): Sobel edge map,
//!   close with a small rectangle, pre-filter by geometry, then require many
//!   light/dark alternations across the region.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use barcode::{BarcodeDetector, DetectorConfig};
//!
//! let detector = BarcodeDetector::new(DetectorConfig::default())?;
//! let report = detector.detect_file("parcel_side_1.jpg")?;
//! println!("{} candidate(s), stage {:?}", report.count, report.stage);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use barcode::{Pipeline, algorithms::*, config::RegionLimits};
//!
//! let pipeline = Pipeline::builder()
//!     .add_preprocessor(InvertPreprocessor)
//!     .add_preprocessor(RectClosePreprocessor::new(31, 5)?)
//!     .add_preprocessor(OtsuPreprocessor)
//!     .add_region_filter(GeometryFilter::new(RegionLimits {
//!         min_area: 800.0,
//!         min_aspect: 3.0,
//!         max_aspect: 12.0,
//!         min_width: 60,
//!         min_height: 10,
//!     }))
//!     .build();
//!
//! let image = image::open("label.png")?.to_luma8();
//! let regions = pipeline.process(&image)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod detector;

// Re-exports for convenience
pub use error::{BarcodeError, Result};
pub use types::{BoundingBox, CandidateRegion, DetectionReport, DetectionStage};
pub use config::DetectorConfig;
pub use traits::*;
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use detector::BarcodeDetector;
