use std::collections::BTreeMap;

use crate::{
    key::{parcel_key, ParcelKey},
    label::{ImageId, Label},
    store::LabelStore,
};

/// Images grouped by parcel, in key order
pub fn group_by_parcel(images: &[ImageId]) -> BTreeMap<ParcelKey, Vec<&ImageId>> {
    let mut groups: BTreeMap<ParcelKey, Vec<&ImageId>> = BTreeMap::new();
    for image in images {
        groups.entry(parcel_key(image)).or_default().push(image);
    }
    groups
}

/// Parcel label for the labels of its views.
///
/// `None` while every view is unclassified. Otherwise the strongest label in
/// [`Label::PARCEL_PRIORITY`] wins no matter how many views show it, and
/// `NoCode` only when every classified view agrees on it.
pub fn derive_parcel_label(labels: &[Label]) -> Option<Label> {
    let classified: Vec<Label> = labels.iter().copied().filter(|l| l.is_classified()).collect();
    if classified.is_empty() {
        return None;
    }

    if let Some(label) = Label::PARCEL_PRIORITY.iter().find(|p| classified.contains(*p)) {
        return Some(*label);
    }

    if classified.iter().all(|&l| l == Label::NoCode) {
        Some(Label::NoCode)
    } else {
        Some(Label::Other)
    }
}

/// Derived label of every parcel with at least one classified view
pub fn compute_parcel_labels(images: &[ImageId], store: &LabelStore) -> BTreeMap<ParcelKey, Label> {
    group_by_parcel(images)
        .into_iter()
        .filter_map(|(key, members)| {
            let labels: Vec<Label> = members.iter().map(|id| store.effective_label(id)).collect();
            derive_parcel_label(&labels).map(|label| (key, label))
        })
        .collect()
}
