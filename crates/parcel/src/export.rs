use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    autoclassify::CancelFlag,
    error::{ParcelError, Result},
    label::{ImageId, Label},
    session::LabelSession,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub copied: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Copy every classified image into `out_dir/<label>/<file name>`.
///
/// Each copy lands under a temporary name first, so an interrupted export
/// never leaves a partial file behind under its final name.
pub fn export_by_label(session: &LabelSession, out_dir: &Path, cancel: &CancelFlag) -> Result<ExportSummary> {
    let jobs: Vec<(&ImageId, Label)> = session
        .images()
        .iter()
        .map(|image| (image, session.effective_label(image)))
        .filter(|(_, label)| label.is_classified())
        .collect();

    fs::create_dir_all(out_dir)?;
    let mut summary = ExportSummary::default();

    for (image, label) in jobs {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }

        let target_dir = out_dir.join(label.to_string());
        match copy_into(image.as_path(), &target_dir) {
            Ok(target) => {
                debug!("Copied {} -> {:?}", image, target);
                summary.copied += 1;
            }
            Err(e) => {
                warn!("Failed to export {}: {}", image, e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Exported {} image(s) to {:?}, {} failed{}",
        summary.copied,
        out_dir,
        summary.failed,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    Ok(summary)
}

fn copy_into(source: &Path, target_dir: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| ParcelError::UnknownImage(source.display().to_string()))?;
    fs::create_dir_all(target_dir)?;
    let target = target_dir.join(file_name);

    let mut tmp = tempfile::NamedTempFile::new_in(target_dir)?;
    let mut input = fs::File::open(source)?;
    std::io::copy(&mut input, tmp.as_file_mut())?;

    tmp.persist(&target).map_err(|e| ParcelError::Persist {
        path: target.clone(),
        source: e.error,
    })?;
    Ok(target)
}
