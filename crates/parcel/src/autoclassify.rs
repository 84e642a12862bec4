use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use barcode::BarcodeDetector;
use tracing::{debug, info, warn};

use crate::{
    error::{ParcelError, Result},
    label::{ImageId, Label},
    session::LabelSession,
};

/// Anything that can say how many barcode-like regions an image holds.
///
/// Unreadable images count as 0.
pub trait BarcodeCounter: Send + Sync {
    fn count_barcodes(&self, path: &Path) -> usize;
}

impl BarcodeCounter for BarcodeDetector {
    fn count_barcodes(&self, path: &Path) -> usize {
        self.count_in_file(path)
    }
}

/// Coarse label for a detector count
pub fn label_for_count(count: usize) -> Label {
    let [no_code, read_failure] = Label::auto_labels();
    if count == 0 { no_code } else { read_failure }
}

/// Shared stop request for batch jobs, checked between items
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoClassifySummary {
    pub processed: usize,
    pub no_code: usize,
    pub read_failure: usize,
    /// Labelled by someone else while detection was running
    pub skipped: usize,
    /// Could not be committed, e.g. the image left the session
    pub failed: usize,
    pub cancelled: bool,
}

/// Labels never-touched images as `no_code` or `read_failure`
pub struct AutoClassifier<C> {
    counter: C,
    cancel: CancelFlag,
}

impl<C: BarcodeCounter> AutoClassifier<C> {
    pub fn new(counter: C) -> Self {
        Self {
            counter,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Classify every image the session has never labelled
    pub fn run_unlabelled(&self, session: &RwLock<LabelSession>) -> Result<AutoClassifySummary> {
        let targets = session
            .read()
            .map_err(|_| ParcelError::LockPoisoned)?
            .unlabelled();
        self.run(session, &targets)
    }

    /// Classify `targets` one at a time.
    ///
    /// Detection runs without holding the lock. Each label is committed under
    /// one write lock, and only if the image is still absent from the store,
    /// so a human decision made meanwhile is never overwritten. A label that
    /// cannot be committed is logged and counted; the batch carries on.
    pub fn run(&self, session: &RwLock<LabelSession>, targets: &[ImageId]) -> Result<AutoClassifySummary> {
        let mut summary = AutoClassifySummary::default();

        for image in targets {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let count = self.counter.count_barcodes(image.as_path());
            let label = label_for_count(count);

            {
                let mut guard = session.write().map_err(|_| ParcelError::LockPoisoned)?;
                if guard.store().contains(image) {
                    debug!("{} labelled meanwhile, skipping", image);
                    summary.skipped += 1;
                    continue;
                }
                if let Err(e) = guard.set_label(image, label) {
                    warn!("Failed to label {}: {}", image, e);
                    summary.failed += 1;
                    continue;
                }
            }

            debug!("{}: {} candidate(s) -> {}", image, count, label);
            summary.processed += 1;
            match label {
                Label::NoCode => summary.no_code += 1,
                _ => summary.read_failure += 1,
            }
        }

        info!(
            "Auto-classified {} image(s): {} no_code, {} read_failure, {} skipped, {} failed{}",
            summary.processed,
            summary.no_code,
            summary.read_failure,
            summary.skipped,
            summary.failed,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedCounts(HashMap<String, usize>);

    impl FixedCounts {
        fn new(counts: &[(&str, usize)]) -> Self {
            Self(counts.iter().map(|(name, n)| (name.to_string(), *n)).collect())
        }
    }

    impl BarcodeCounter for FixedCounts {
        fn count_barcodes(&self, path: &Path) -> usize {
            self.0.get(path.to_string_lossy().as_ref()).copied().unwrap_or(0)
        }
    }

    /// Cancels the shared flag after the first count
    struct CancelAfterFirst(CancelFlag);

    impl BarcodeCounter for CancelAfterFirst {
        fn count_barcodes(&self, _path: &Path) -> usize {
            self.0.cancel();
            1
        }
    }

    fn session(names: &[&str]) -> RwLock<LabelSession> {
        RwLock::new(LabelSession::new("/scans", names.iter().map(|n| ImageId::from(*n)).collect()))
    }

    #[test]
    fn test_label_for_count() {
        assert_eq!(label_for_count(0), Label::NoCode);
        assert_eq!(label_for_count(1), Label::ReadFailure);
        assert_eq!(label_for_count(3), Label::ReadFailure);
    }

    #[test]
    fn test_counts_become_coarse_labels() {
        let names = ["a_x_1.jpg", "b_x_2.jpg", "c_x_3.jpg"];
        let shared = session(&names);
        let classifier = AutoClassifier::new(FixedCounts::new(&[
            ("a_x_1.jpg", 0),
            ("b_x_2.jpg", 3),
            ("c_x_3.jpg", 0),
        ]));

        let summary = classifier.run_unlabelled(&shared).expect("run");
        assert_eq!(summary.processed, 3);
        assert_eq!((summary.no_code, summary.read_failure), (2, 1));

        let s = shared.read().expect("lock");
        let labels: Vec<Label> = names.iter().map(|n| s.effective_label(&ImageId::from(*n))).collect();
        assert_eq!(labels, vec![Label::NoCode, Label::ReadFailure, Label::NoCode]);
        assert!(names.iter().all(|n| s.store().contains(&ImageId::from(*n))));
        assert_eq!(s.indexer().len(), 3);
    }

    #[test]
    fn test_human_labels_are_not_overwritten() {
        let shared = session(&["a_x_1.jpg", "b_x_2.jpg"]);
        let targets = shared.read().expect("lock").unlabelled();
        shared
            .write()
            .expect("lock")
            .set_label(&ImageId::from("b_x_2.jpg"), Label::Damaged)
            .expect("set");

        let summary = AutoClassifier::new(FixedCounts::new(&[])).run(&shared, &targets).expect("run");
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(shared.read().expect("lock").effective_label(&"b_x_2.jpg".into()), Label::Damaged);
    }

    #[test]
    fn test_explicitly_unclassified_images_are_not_targets() {
        let shared = session(&["a_x_1.jpg", "b_x_2.jpg"]);
        shared
            .write()
            .expect("lock")
            .set_label(&ImageId::from("a_x_1.jpg"), Label::Unclassified)
            .expect("set");

        let summary = AutoClassifier::new(FixedCounts::new(&[])).run_unlabelled(&shared).expect("run");
        assert_eq!(summary.processed, 1);
        assert_eq!(shared.read().expect("lock").effective_label(&"a_x_1.jpg".into()), Label::Unclassified);
    }

    #[test]
    fn test_commit_failure_does_not_abort_batch() {
        let shared = session(&["a_x_1.jpg", "c_x_3.jpg"]);
        // Queued before the file left the session
        let targets: Vec<ImageId> = ["a_x_1.jpg", "gone_x_2.jpg", "c_x_3.jpg"]
            .iter()
            .map(|n| ImageId::from(*n))
            .collect();

        let summary = AutoClassifier::new(FixedCounts::new(&[("c_x_3.jpg", 2)]))
            .run(&shared, &targets)
            .expect("run");
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 2);
        assert_eq!((summary.no_code, summary.read_failure), (1, 1));

        let s = shared.read().expect("lock");
        assert_eq!(s.effective_label(&"c_x_3.jpg".into()), Label::ReadFailure);
        assert!(!s.store().contains(&"gone_x_2.jpg".into()));
    }

    #[test]
    fn test_cancel_stops_between_items() {
        let shared = session(&["a_x_1.jpg", "b_x_2.jpg", "c_x_3.jpg"]);
        let flag = CancelFlag::new();
        let classifier = AutoClassifier::new(CancelAfterFirst(flag.clone())).with_cancel_flag(flag);

        let summary = classifier.run_unlabelled(&shared).expect("run");
        assert!(summary.cancelled);
        // The item in flight completes, nothing after it starts
        assert_eq!(summary.processed, 1);
        assert_eq!(shared.read().expect("lock").store().len(), 1);
    }

    #[test]
    fn test_unreadable_file_counts_as_no_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken_x_1.jpg");
        std::fs::write(&path, b"not a jpeg").expect("write");

        let shared = RwLock::new(LabelSession::new(dir.path(), vec![ImageId::from(path.as_path())]));
        let detector = BarcodeDetector::new(Default::default()).expect("detector");
        let summary = AutoClassifier::new(detector).run_unlabelled(&shared).expect("run");

        assert_eq!(summary.no_code, 1);
        assert_eq!(
            shared.read().expect("lock").effective_label(&ImageId::from(path.as_path())),
            Label::NoCode
        );
    }
}
