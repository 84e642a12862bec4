use std::collections::HashMap;

use crate::label::{ImageId, Label};

/// Image labels recorded so far.
///
/// An image absent from the store is `Unclassified`. Entries are never
/// removed; writes go through [`crate::session::LabelSession`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelStore {
    labels: HashMap<ImageId, Label>,
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label of `image`, `Unclassified` when nothing was recorded
    pub fn effective_label(&self, image: &ImageId) -> Label {
        self.labels.get(image).copied().unwrap_or_default()
    }

    /// Whether any label, even an explicit `Unclassified`, was recorded
    pub fn contains(&self, image: &ImageId) -> bool {
        self.labels.contains_key(image)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ImageId, Label)> {
        self.labels.iter().map(|(id, label)| (id, *label))
    }

    pub(crate) fn set(&mut self, image: ImageId, label: Label) -> Option<Label> {
        self.labels.insert(image, label)
    }
}

impl FromIterator<(ImageId, Label)> for LabelStore {
    fn from_iter<I: IntoIterator<Item = (ImageId, Label)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}
