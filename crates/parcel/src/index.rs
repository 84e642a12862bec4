use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    key::{parcel_key, ParcelKey},
    label::ImageId,
    store::LabelStore,
};

/// Hands out permanent parcel numbers in the order parcels are first
/// classified.
///
/// Assignment is the first half of a label write: call
/// [`ParcelIndexer::prepare_index_for`] while the store still holds the old
/// state, then commit the label. The "is this the first classified view"
/// check reads the store, so committing first would hide the first
/// classification from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelIndexer {
    index_by_parcel: HashMap<ParcelKey, u32>,
    next_index: u32,
}

impl Default for ParcelIndexer {
    fn default() -> Self {
        Self {
            index_by_parcel: HashMap::new(),
            next_index: 1,
        }
    }
}

impl ParcelIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted `(parcel, index)` pairs.
    ///
    /// New indices continue after the largest one seen. A parcel listed with
    /// two different indices keeps the first.
    pub fn restore(entries: impl IntoIterator<Item = (ParcelKey, u32)>) -> Self {
        let mut indexer = Self::new();
        let mut max_seen = 0;

        for (key, index) in entries {
            max_seen = max_seen.max(index);
            match indexer.index_by_parcel.get(&key) {
                Some(&existing) if existing != index => {
                    warn!("Parcel {} stored with indices {} and {}; keeping {}", key, existing, index, existing);
                }
                Some(_) => {}
                None => {
                    indexer.index_by_parcel.insert(key, index);
                }
            }
        }

        indexer.next_index = max_seen + 1;
        indexer
    }

    /// First phase of classifying `image`.
    ///
    /// Assigns the next index if the image's parcel has none and none of
    /// `siblings` (the other views of the same parcel; `image` itself may be
    /// among them) holds a classified label yet. Returns the index assigned
    /// by this call, if any.
    pub fn prepare_index_for<'a>(
        &mut self,
        image: &ImageId,
        siblings: impl IntoIterator<Item = &'a ImageId>,
        store: &LabelStore,
    ) -> Option<u32> {
        let key = parcel_key(image);
        if self.index_by_parcel.contains_key(&key) {
            return None;
        }

        let sibling_classified = siblings
            .into_iter()
            .any(|other| other != image && store.effective_label(other).is_classified());
        if sibling_classified {
            debug!("Parcel {} already started without an index", key);
            return None;
        }

        let index = self.next_index;
        self.next_index += 1;
        debug!("Parcel {} assigned index {}", key, index);
        self.index_by_parcel.insert(key, index);
        Some(index)
    }

    pub fn get_index(&self, image: &ImageId) -> Option<u32> {
        self.index_of(&parcel_key(image))
    }

    pub fn index_of(&self, key: &str) -> Option<u32> {
        self.index_by_parcel.get(key).copied()
    }

    /// Index the next newly classified parcel will receive
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    pub fn len(&self) -> usize {
        self.index_by_parcel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_by_parcel.is_empty()
    }
}
