//! Revision files: one CSV per labeling session, named
//! `revision_YYYYMMDD_HHMMSS.csv`, one row per labelled image.
//!
//! Columns: `image_path, image_label, parcel_key, parcel_label, parcel_index`.
//! Older revisions carry only the first two columns and still load.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::{ParcelError, Result},
    key::{parcel_key, ParcelKey},
    label::{ImageId, Label},
};

pub const REVISION_PREFIX: &str = "revision_";
pub const REVISION_EXTENSION: &str = "csv";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One persisted row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRecord {
    pub image_path: String,
    pub image_label: Label,
    pub parcel_key: ParcelKey,
    /// Recomputed at save time; `unclassified` while the parcel has none
    pub parcel_label: Label,
    pub parcel_index: Option<u32>,
}

/// Everything recovered from a revision file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Revision {
    pub labels: Vec<(ImageId, Label)>,
    pub indices: Vec<(ParcelKey, u32)>,
    pub skipped_rows: usize,
}

pub fn revision_file_name(timestamp: NaiveDateTime) -> String {
    format!("{REVISION_PREFIX}{}.{REVISION_EXTENSION}", timestamp.format(TIMESTAMP_FORMAT))
}

/// Timestamp embedded in a revision file name
pub fn revision_timestamp(file_name: &str) -> Option<NaiveDateTime> {
    let stamp = file_name
        .strip_prefix(REVISION_PREFIX)?
        .strip_suffix(REVISION_EXTENSION)?
        .strip_suffix('.')?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// Most recent revision in `dir` by embedded timestamp.
///
/// Names that look like revisions but carry no valid timestamp are ignored.
pub fn latest_revision(dir: &Path) -> Result<Option<PathBuf>> {
    let mut latest: Option<(NaiveDateTime, PathBuf)> = None;

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(REVISION_PREFIX) {
            continue;
        }
        let Some(timestamp) = revision_timestamp(name) else {
            debug!("Ignoring {:?}: no revision timestamp", path);
            continue;
        };
        if latest.as_ref().is_none_or(|(best, _)| timestamp > *best) {
            latest = Some((timestamp, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

/// Load a revision, skipping rows that cannot be understood
pub fn read_revision(path: &Path) -> Result<Revision> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut revision = Revision::default();
    let mut scheme_mismatches = 0usize;

    for (row, result) in reader.records().enumerate() {
        // 1-based, after the header line
        let line = row + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping row {} of {:?}: {}", line, path, e);
                revision.skipped_rows += 1;
                continue;
            }
        };

        let (Some(image_path), Some(label_text)) = (record.get(0), record.get(1)) else {
            warn!("Skipping row {} of {:?}: fewer than 2 columns", line, path);
            revision.skipped_rows += 1;
            continue;
        };
        let label = match Label::from_str(label_text.trim()) {
            Ok(label) => label,
            Err(_) => {
                warn!("Skipping row {} of {:?}: unknown label '{}'", line, path, label_text);
                revision.skipped_rows += 1;
                continue;
            }
        };

        let image = ImageId::new(image_path);
        let key = parcel_key(&image);

        if let Some(stored_key) = record.get(2).map(str::trim).filter(|k| !k.is_empty()) {
            if stored_key != key {
                scheme_mismatches += 1;
            }
        }

        match record.get(4).map(str::trim).filter(|i| !i.is_empty()) {
            None => {}
            Some(text) => match text.parse::<u32>() {
                Ok(index) if index > 0 => revision.indices.push((key, index)),
                _ => warn!("Row {} of {:?}: ignoring parcel index '{}'", line, path, text),
            },
        }

        revision.labels.push((image, label));
    }

    if scheme_mismatches > 0 {
        warn!(
            "{} row(s) of {:?} were saved under a different parcel key scheme; keys recomputed from file names",
            scheme_mismatches, path
        );
    }
    info!("Loaded {} label(s) from {:?}", revision.labels.len(), path);
    Ok(revision)
}

/// Write `records` to `path`, replacing it only once fully written
pub fn write_revision(path: &Path, records: &[LabelRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    tmp.as_file_mut().flush()?;

    tmp.persist(path).map_err(|e| ParcelError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    debug!("Saved {} row(s) to {:?}", records.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .expect("valid timestamp")
    }

    #[test]
    fn test_revision_names() {
        let name = revision_file_name(at(9, 5, 30));
        assert_eq!(name, "revision_20240301_090530.csv");
        assert_eq!(revision_timestamp(&name), Some(at(9, 5, 30)));
        assert_eq!(revision_timestamp("revision_latest.csv"), None);
        assert_eq!(revision_timestamp("labels_20240301_090530.csv"), None);
    }

    #[test]
    fn test_latest_revision_by_timestamp() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in [
            "revision_20240301_090000.csv",
            "revision_20240301_170000.csv",
            "revision_20240301_120000.csv",
            "revision_broken.csv",
            "revision_20991231_235959.txt",
        ] {
            fs::write(dir.path().join(name), "image_path,image_label\n").expect("write");
        }

        let latest = latest_revision(dir.path()).expect("scan").expect("found");
        assert_eq!(latest.file_name().and_then(|n| n.to_str()), Some("revision_20240301_170000.csv"));
    }

    #[test]
    fn test_no_revision_in_empty_folder() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(latest_revision(dir.path()).expect("scan"), None);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(revision_file_name(at(10, 0, 0)));
        let records = vec![
            LabelRecord {
                image_path: "/scans/A_left_1.jpg".into(),
                image_label: Label::ReadFailure,
                parcel_key: "A_1".into(),
                parcel_label: Label::ReadFailure,
                parcel_index: Some(4),
            },
            LabelRecord {
                image_path: "/scans/B, with comma_2.jpg".into(),
                image_label: Label::NoCode,
                parcel_key: "B, with comma_2".into(),
                parcel_label: Label::NoCode,
                parcel_index: None,
            },
        ];

        write_revision(&path, &records).expect("write");
        let text = fs::read_to_string(&path).expect("read back");
        assert!(text.starts_with("image_path,image_label,parcel_key,parcel_label,parcel_index\n"));

        let revision = read_revision(&path).expect("read");
        assert_eq!(
            revision.labels,
            vec![
                (ImageId::from("/scans/A_left_1.jpg"), Label::ReadFailure),
                (ImageId::from("/scans/B, with comma_2.jpg"), Label::NoCode),
            ]
        );
        assert_eq!(revision.indices, vec![("A_1".to_string(), 4)]);
        assert_eq!(revision.skipped_rows, 0);
    }

    #[test]
    fn test_legacy_two_column_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("revision_20240101_000000.csv");
        fs::write(&path, "image_path,image_label\nA_x_1.jpg,no_code\nB_x_2.jpg,damaged\n").expect("write");

        let revision = read_revision(&path).expect("read");
        assert_eq!(revision.labels.len(), 2);
        assert!(revision.indices.is_empty());
    }

    #[test]
    fn test_malformed_rows_are_skipped_individually() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("revision_20240101_000000.csv");
        fs::write(
            &path,
            "image_path,image_label,parcel_key,parcel_label,parcel_index\n\
             A_x_1.jpg,no_code,A_1,no_code,seven\n\
             lonely\n\
             B_x_2.jpg,no read,B_2,no_code,2\n\
             C_x_3.jpg,occluded,C_3,occluded,3\n",
        )
        .expect("write");

        let revision = read_revision(&path).expect("read");
        assert_eq!(
            revision.labels,
            vec![
                (ImageId::from("A_x_1.jpg"), Label::NoCode),
                (ImageId::from("C_x_3.jpg"), Label::Occluded),
            ]
        );
        assert_eq!(revision.indices, vec![("C_3".to_string(), 3)]);
        assert_eq!(revision.skipped_rows, 2);
    }

    #[test]
    fn test_keys_recomputed_from_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("revision_20240101_000000.csv");
        fs::write(
            &path,
            "image_path,image_label,parcel_key,parcel_label,parcel_index\n\
             PKG7_cam1_0900.jpg,damaged,0900,damaged,5\n",
        )
        .expect("write");

        let revision = read_revision(&path).expect("read");
        assert_eq!(revision.indices, vec![("PKG7_0900".to_string(), 5)]);
    }
}
