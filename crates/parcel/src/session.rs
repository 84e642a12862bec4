use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::Local;
use tracing::{debug, info};

use crate::{
    aggregate::{compute_parcel_labels, group_by_parcel},
    error::{ParcelError, Result},
    index::ParcelIndexer,
    key::{parcel_key, ParcelKey},
    label::{ImageId, Label},
    persist::{latest_revision, read_revision, revision_file_name, write_revision, LabelRecord, Revision},
    scan::scan_images,
    stats::Statistics,
    store::LabelStore,
};

/// The session behind a lock: writers take it exclusively, readers see a
/// consistent snapshot.
pub type SharedSession = Arc<RwLock<LabelSession>>;

/// Which images a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelFilter {
    #[default]
    All,
    Only(Label),
}

impl LabelFilter {
    pub fn matches(self, label: Label) -> bool {
        match self {
            LabelFilter::All => true,
            LabelFilter::Only(wanted) => wanted == label,
        }
    }
}

/// One started parcel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelSummary {
    pub key: ParcelKey,
    pub index: Option<u32>,
    pub label: Label,
    pub images: usize,
}

/// State of labeling one folder: image list, labels and parcel indices.
///
/// All label writes go through [`LabelSession::set_label`], which assigns
/// the parcel index before the label lands in the store.
#[derive(Debug)]
pub struct LabelSession {
    folder: PathBuf,
    images: Vec<ImageId>,
    /// Images of each parcel, kept in step with `images`
    members: HashMap<ParcelKey, Vec<ImageId>>,
    store: LabelStore,
    indexer: ParcelIndexer,
    revision_path: PathBuf,
}

impl LabelSession {
    /// Fresh session over `images`, saving to a new timestamped revision
    pub fn new(folder: impl Into<PathBuf>, mut images: Vec<ImageId>) -> Self {
        let folder = folder.into();
        images.sort();
        images.dedup();
        let revision_path = folder.join(revision_file_name(Local::now().naive_local()));
        let mut members = HashMap::new();
        add_members(&mut members, &images);

        Self {
            folder,
            images,
            members,
            store: LabelStore::new(),
            indexer: ParcelIndexer::new(),
            revision_path,
        }
    }

    /// Scan `folder` and pick up the most recent revision, if any
    pub fn open(folder: impl AsRef<Path>) -> Result<Self> {
        let folder = folder.as_ref();
        let images = scan_images(folder)?;
        let mut session = Self::new(folder, images);

        if let Some(latest) = latest_revision(folder)? {
            session.load(&latest)?;
        }

        info!(
            "Opened {:?}: {} image(s), {} labelled, next parcel index {}",
            folder,
            session.images.len(),
            session.store.len(),
            session.indexer.next_index()
        );
        Ok(session)
    }

    /// Replace labels and indices with the content of a revision file
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let revision = read_revision(path)?;
        self.restore(revision);
        Ok(())
    }

    fn restore(&mut self, revision: Revision) {
        self.store = revision.labels.into_iter().collect();
        self.indexer = ParcelIndexer::restore(revision.indices);
    }

    /// Record `label` for `image`; returns the parcel index this write
    /// assigned, if it was the parcel's first classification.
    pub fn set_label(&mut self, image: &ImageId, label: Label) -> Result<Option<u32>> {
        if !self.contains_image(image) {
            return Err(ParcelError::UnknownImage(image.to_string()));
        }

        let assigned = if label.is_classified() {
            let siblings = self.members.get(&parcel_key(image)).into_iter().flatten();
            self.indexer.prepare_index_for(image, siblings, &self.store)
        } else {
            None
        };
        let previous = self.store.set(image.clone(), label);

        debug!("{}: {:?} -> {}", image, previous, label);
        Ok(assigned)
    }

    fn contains_image(&self, image: &ImageId) -> bool {
        self.images.binary_search(image).is_ok()
    }

    /// Find an image by full id or by file name
    pub fn resolve(&self, name: &str) -> Option<&ImageId> {
        self.images
            .iter()
            .find(|id| id.as_str() == name)
            .or_else(|| self.images.iter().find(|id| id.file_name() == name))
    }

    pub fn effective_label(&self, image: &ImageId) -> Label {
        self.store.effective_label(image)
    }

    pub fn parcel_index(&self, image: &ImageId) -> Option<u32> {
        self.indexer.get_index(image)
    }

    pub fn parcel_labels(&self) -> BTreeMap<ParcelKey, Label> {
        compute_parcel_labels(&self.images, &self.store)
    }

    /// Started parcels ordered by index, unindexed ones last
    pub fn parcels(&self) -> Vec<ParcelSummary> {
        let labels = self.parcel_labels();
        let mut parcels: Vec<ParcelSummary> = group_by_parcel(&self.images)
            .into_iter()
            .filter_map(|(key, members)| {
                let label = *labels.get(&key)?;
                Some(ParcelSummary {
                    index: self.indexer.index_of(&key),
                    key,
                    label,
                    images: members.len(),
                })
            })
            .collect();

        parcels.sort_by(|a, b| match (a.index, b.index) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.key.cmp(&b.key),
        });
        parcels
    }

    pub fn statistics(&self, expected_total: Option<u32>) -> Statistics {
        Statistics::compute(&self.images, &self.store, expected_total)
    }

    /// Images never labelled in any way, in folder order
    pub fn unlabelled(&self) -> Vec<ImageId> {
        self.images
            .iter()
            .filter(|id| !self.store.contains(id))
            .cloned()
            .collect()
    }

    pub fn filter(&self, filter: LabelFilter) -> Vec<&ImageId> {
        self.images
            .iter()
            .filter(|id| filter.matches(self.store.effective_label(id)))
            .collect()
    }

    /// Rescan the folder and return images that were not known yet.
    ///
    /// Images whose files disappeared stay in the session.
    pub fn refresh(&mut self) -> Result<Vec<ImageId>> {
        let known: HashSet<&ImageId> = self.images.iter().collect();
        let added: Vec<ImageId> = scan_images(&self.folder)?
            .into_iter()
            .filter(|id| !known.contains(id))
            .collect();

        if !added.is_empty() {
            info!("Found {} new image(s) in {:?}", added.len(), self.folder);
            self.images.extend(added.iter().cloned());
            self.images.sort();
            add_members(&mut self.members, &added);
        }
        Ok(added)
    }

    /// Rows for every labelled image, parcel columns recomputed
    pub fn records(&self) -> Vec<LabelRecord> {
        let parcel_labels = self.parcel_labels();
        let mut records: Vec<LabelRecord> = self.store
            .iter()
            .map(|(image, label)| {
                let key = parcel_key(image);
                LabelRecord {
                    image_path: image.to_string(),
                    image_label: label,
                    parcel_label: parcel_labels.get(&key).copied().unwrap_or_default(),
                    parcel_index: self.indexer.index_of(&key),
                    parcel_key: key,
                }
            })
            .collect();
        records.sort_by(|a, b| a.image_path.cmp(&b.image_path));
        records
    }

    /// Write this session's revision file
    pub fn save(&self) -> Result<&Path> {
        write_revision(&self.revision_path, &self.records())?;
        Ok(&self.revision_path)
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn images(&self) -> &[ImageId] {
        &self.images
    }

    pub fn store(&self) -> &LabelStore {
        &self.store
    }

    pub fn indexer(&self) -> &ParcelIndexer {
        &self.indexer
    }

    pub fn revision_path(&self) -> &Path {
        &self.revision_path
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }
}

fn add_members(members: &mut HashMap<ParcelKey, Vec<ImageId>>, images: &[ImageId]) {
    for image in images {
        members.entry(parcel_key(image)).or_default().push(image.clone());
    }
}
