//! Parcel identity derived from image file names.
//!
//! Capture stations name files `<parcel id>_<camera or angle...>_<timestamp>`.
//! The first and last underscore-separated parts identify one physical
//! parcel; everything between them varies per view.

use std::path::Path;

use crate::label::ImageId;

/// Grouping key shared by every view of one parcel
pub type ParcelKey = String;

pub fn parcel_key(image: &ImageId) -> ParcelKey {
    parcel_key_from_name(image.as_str())
}

/// Key for a file name or path: `first_last` of the underscore-separated
/// stem, or the whole stem when it has no underscore.
pub fn parcel_key_from_name(name: &str) -> ParcelKey {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);

    let mut parts = stem.split('_');
    let first = parts.next().unwrap_or_default();
    match parts.last() {
        Some(last) => format!("{first}_{last}"),
        None => first.to_string(),
    }
}
