use std::collections::BTreeMap;
use std::fmt;

use strum::IntoEnumIterator;

use crate::{
    aggregate::compute_parcel_labels,
    label::{ImageId, Label},
    store::LabelStore,
};

/// Number of images per effective label, every label present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCounts(BTreeMap<Label, usize>);

impl ImageCounts {
    pub fn compute(images: &[ImageId], store: &LabelStore) -> Self {
        let mut counts: BTreeMap<Label, usize> = Label::iter().map(|l| (l, 0)).collect();
        for image in images {
            *counts.entry(store.effective_label(image)).or_default() += 1;
        }
        Self(counts)
    }

    pub fn get(&self, label: Label) -> usize {
        self.0.get(&label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, usize)> + '_ {
        self.0.iter().map(|(label, count)| (*label, *count))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub total: usize,
    pub classified: usize,
    pub remaining: usize,
}

impl Progress {
    pub fn from_counts(counts: &ImageCounts) -> Self {
        let total = counts.total();
        let remaining = counts.get(Label::Unclassified);
        Self {
            total,
            classified: total - remaining,
            remaining,
        }
    }
}

/// Parcels with at least one classified view, by derived label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelCounts {
    pub started: usize,
    by_label: BTreeMap<Label, usize>,
}

impl ParcelCounts {
    pub fn from_parcel_labels<'a>(labels: impl IntoIterator<Item = &'a Label>) -> Self {
        let mut by_label: BTreeMap<Label, usize> = Label::iter()
            .filter(|l| l.is_classified())
            .map(|l| (l, 0))
            .collect();
        let mut started = 0;
        for label in labels {
            started += 1;
            *by_label.entry(*label).or_default() += 1;
        }
        Self { started, by_label }
    }

    pub fn get(&self, label: Label) -> usize {
        self.by_label.get(&label).copied().unwrap_or(0)
    }

    pub fn no_code(&self) -> usize {
        self.get(Label::NoCode)
    }

    pub fn read_failure(&self) -> usize {
        self.get(Label::ReadFailure)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, usize)> + '_ {
        self.by_label.iter().map(|(label, count)| (*label, *count))
    }
}

/// Read rates against an operator-supplied expected parcel total.
///
/// Every ratio is `None` when its denominator is not positive.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRates {
    pub expected_total: u32,
    /// Share of expected parcels that never needed a classification
    pub gross: Option<f64>,
    /// Share of readable parcels that were not read failures
    pub net: Option<f64>,
    /// Each parcel label's count as a share of the expected total
    pub shares: BTreeMap<Label, f64>,
}

impl ReadRates {
    pub fn compute(expected_total: u32, parcels: &ParcelCounts) -> Self {
        let expected = expected_total as f64;
        let started = parcels.started as f64;
        let failures = parcels.read_failure() as f64;

        let gross = (expected_total > 0).then(|| (expected - started) / expected);

        let total_readable = expected - started + failures;
        let net = (expected_total > 0 && total_readable > 0.0)
            .then(|| (total_readable - failures) / total_readable);

        let shares = if expected_total > 0 {
            parcels.iter().map(|(label, count)| (label, count as f64 / expected)).collect()
        } else {
            BTreeMap::new()
        };

        Self {
            expected_total,
            gross,
            net,
            shares,
        }
    }
}

/// Expected parcel total typed by the operator; blank or non-numeric is `None`
pub fn parse_expected_total(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Snapshot of labeling progress
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub images: ImageCounts,
    pub progress: Progress,
    pub parcels: ParcelCounts,
    pub read_rates: Option<ReadRates>,
}

impl Statistics {
    pub fn compute(images: &[ImageId], store: &LabelStore, expected_total: Option<u32>) -> Self {
        let image_counts = ImageCounts::compute(images, store);
        let progress = Progress::from_counts(&image_counts);
        let parcel_labels = compute_parcel_labels(images, store);
        let parcels = ParcelCounts::from_parcel_labels(parcel_labels.values());
        let read_rates = expected_total.map(|total| ReadRates::compute(total, &parcels));

        Self {
            images: image_counts,
            progress,
            parcels,
            read_rates,
        }
    }
}

fn percent(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.1}%", r * 100.0)).unwrap_or_else(|| "n/a".to_string())
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let images: Vec<String> = self.images.iter().map(|(l, n)| format!("{l}: {n}")).collect();
        writeln!(f, "Images: {}", images.join(", "))?;
        writeln!(
            f,
            "Progress: {} / {} classified, {} remaining",
            self.progress.classified, self.progress.total, self.progress.remaining
        )?;

        let parcels: Vec<String> = self.parcels.iter().map(|(l, n)| format!("{l}: {n}")).collect();
        write!(f, "Parcels ({}): {}", self.parcels.started, parcels.join(", "))?;

        if let Some(rates) = &self.read_rates {
            writeln!(f)?;
            write!(
                f,
                "Total {}: gross read rate {}, net read rate {}",
                rates.expected_total,
                percent(rates.gross),
                percent(rates.net)
            )?;
            let shares: Vec<String> = self.parcels
                .iter()
                .filter_map(|(l, n)| rates.shares.get(&l).map(|s| format!("{l} {n} ({})", percent(Some(*s)))))
                .collect();
            if !shares.is_empty() {
                writeln!(f)?;
                write!(f, "Share of total: {}", shares.join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Vec<ImageId>, LabelStore) {
        let images: Vec<ImageId> = [
            "P1_a_1.jpg", "P1_b_1.jpg",
            "P2_a_2.jpg", "P2_b_2.jpg",
            "P3_a_3.jpg", "P3_b_3.jpg",
            "P4_a_4.jpg",
        ]
        .into_iter()
        .map(ImageId::from)
        .collect();

        let store: LabelStore = [
            (ImageId::from("P1_a_1.jpg"), Label::NoCode),
            (ImageId::from("P1_b_1.jpg"), Label::NoCode),
            (ImageId::from("P2_a_2.jpg"), Label::ReadFailure),
            (ImageId::from("P3_b_3.jpg"), Label::Damaged),
        ]
        .into_iter()
        .collect();

        (images, store)
    }

    #[test]
    fn test_image_counts_and_progress() {
        let (images, store) = fixture();
        let stats = Statistics::compute(&images, &store, None);

        assert_eq!(stats.images.get(Label::NoCode), 2);
        assert_eq!(stats.images.get(Label::Unclassified), 3);
        assert_eq!(stats.images.get(Label::Occluded), 0);
        assert_eq!(stats.progress, Progress { total: 7, classified: 4, remaining: 3 });
        assert!(stats.read_rates.is_none());
    }

    #[test]
    fn test_parcel_counts() {
        let (images, store) = fixture();
        let stats = Statistics::compute(&images, &store, None);

        assert_eq!(stats.parcels.started, 3);
        assert_eq!(stats.parcels.no_code(), 1);
        assert_eq!(stats.parcels.read_failure(), 1);
        assert_eq!(stats.parcels.get(Label::Damaged), 1);
    }

    #[test]
    fn test_read_rates() {
        let (images, store) = fixture();
        let stats = Statistics::compute(&images, &store, Some(100));
        let rates = stats.read_rates.expect("rates");

        // 100 expected, 3 started, 1 read failure
        assert!((rates.gross.expect("gross") - 0.97).abs() < 1e-12);
        assert!((rates.net.expect("net") - 97.0 / 98.0).abs() < 1e-12);
        assert!((rates.shares[&Label::ReadFailure] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_zero_expected_total_is_undefined() {
        let (images, store) = fixture();
        let rates = Statistics::compute(&images, &store, Some(0)).read_rates.expect("rates");

        assert_eq!(rates.gross, None);
        assert_eq!(rates.net, None);
        assert!(rates.shares.is_empty());
    }

    #[test]
    fn test_net_rate_guard_when_nothing_readable() {
        let parcels = ParcelCounts::from_parcel_labels(&[Label::NoCode, Label::NoCode]);
        let rates = ReadRates::compute(2, &parcels);

        assert_eq!(rates.gross, Some(0.0));
        assert_eq!(rates.net, None);
    }

    #[test]
    fn test_parse_expected_total() {
        assert_eq!(parse_expected_total(""), None);
        assert_eq!(parse_expected_total("   "), None);
        assert_eq!(parse_expected_total("abc"), None);
        assert_eq!(parse_expected_total("-4"), None);
        assert_eq!(parse_expected_total(" 250 "), Some(250));
        assert_eq!(parse_expected_total("0"), Some(0));
    }

    #[test]
    fn test_blank_expected_total_has_no_rates() {
        let (images, store) = fixture();
        let stats = Statistics::compute(&images, &store, parse_expected_total(""));
        assert!(stats.read_rates.is_none());
        assert!(!stats.to_string().contains("read rate"));
    }

    #[test]
    fn test_summary_text() {
        let (images, store) = fixture();
        let summary = Statistics::compute(&images, &store, Some(100)).to_string();

        assert!(summary.contains("Progress: 4 / 7 classified, 3 remaining"));
        assert!(summary.contains("Parcels (3): no_code: 1, read_failure: 1"));
        assert!(summary.contains("gross read rate 97.0%"));
        assert!(summary.contains("read_failure 1 (1.0%)"));
    }
}
