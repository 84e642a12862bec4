//! # Parcel Labeling
//!
//! Bookkeeping for labeling photos of parcels. Each parcel is photographed
//! from several sides; the operator (or the barcode detector) labels single
//! images, and each parcel's label is derived from its images' labels.
//!
//! ## Concepts
//!
//! - **Parcel key**: first and last underscore-separated parts of the file
//!   stem, so `PKG7_cam1_0900.jpg` belongs to parcel `PKG7_0900`.
//! - **Parcel label**: `no_code` only when every classified view says so,
//!   otherwise the strongest other label by [`Label::PARCEL_PRIORITY`].
//! - **Parcel index**: permanent number handed out the first time any view
//!   of a parcel is classified.
//! - **Revision**: one CSV file per session, `revision_YYYYMMDD_HHMMSS.csv`,
//!   next to the images. Opening a folder loads the newest one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parcel::{Label, LabelSession};
//!
//! let mut session = LabelSession::open("/data/scans")?;
//! if let Some(image) = session.resolve("PKG7_cam1_0900.jpg").cloned() {
//!     let index = session.set_label(&image, Label::Damaged)?;
//!     println!("parcel index: {:?}", index);
//! }
//! println!("{}", session.statistics(Some(250)));
//! session.save()?;
//! # Ok::<(), parcel::ParcelError>(())
//! ```

pub mod aggregate;
pub mod autoclassify;
pub mod error;
pub mod export;
pub mod index;
pub mod key;
pub mod label;
pub mod persist;
pub mod scan;
pub mod session;
pub mod stats;
pub mod store;

pub use aggregate::{compute_parcel_labels, derive_parcel_label, group_by_parcel};
pub use autoclassify::{label_for_count, AutoClassifier, AutoClassifySummary, BarcodeCounter, CancelFlag};
pub use error::{ParcelError, Result};
pub use export::{export_by_label, ExportSummary};
pub use index::ParcelIndexer;
pub use key::{parcel_key, ParcelKey};
pub use label::{ImageId, Label};
pub use persist::{latest_revision, read_revision, write_revision, LabelRecord, Revision};
pub use scan::scan_images;
pub use session::{LabelFilter, LabelSession, ParcelSummary, SharedSession};
pub use stats::{parse_expected_total, ReadRates, Statistics};
pub use store::LabelStore;
