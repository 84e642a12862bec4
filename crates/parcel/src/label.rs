use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::error::{ParcelError, Result};

/// Classification of one image, or the derived classification of a parcel
#[derive(
    Debug, Clone, Copy, Default,
    PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Label {
    /// No decision recorded yet
    #[default]
    Unclassified,
    /// No barcode on this view
    NoCode,
    /// A barcode is present but could not be read
    ReadFailure,
    Occluded,
    ImageQuality,
    Damaged,
    Other,
}

impl Label {
    /// Parcel-level precedence, strongest first
    pub const PARCEL_PRIORITY: [Label; 5] = [
        Label::ReadFailure,
        Label::Damaged,
        Label::ImageQuality,
        Label::Occluded,
        Label::Other,
    ];

    pub fn is_classified(self) -> bool {
        self != Label::Unclassified
    }

    /// The only labels automatic classification may produce
    pub fn auto_labels() -> [Label; 2] {
        [Label::NoCode, Label::ReadFailure]
    }

    /// Parse operator input, accepting dashes for underscores
    pub fn parse(text: &str) -> Result<Label> {
        let normalized = text.trim().to_ascii_lowercase().replace('-', "_");
        Label::from_str(&normalized).map_err(|_| ParcelError::UnknownLabel(text.to_string()))
    }
}

/// Path or name of one image file; unique within a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Final path component, or the whole id when it has none
    pub fn file_name(&self) -> &str {
        self.as_path()
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ImageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&Path> for ImageId {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_label_text_round_trips() {
        for label in Label::iter() {
            assert_eq!(Label::from_str(&label.to_string()).expect("parse"), label);
        }
        assert_eq!(Label::ReadFailure.to_string(), "read_failure");
        assert_eq!(Label::from_str("image_quality").expect("parse"), Label::ImageQuality);
        assert!(Label::from_str("no read").is_err());
    }

    #[test]
    fn test_parse_operator_input() {
        assert_eq!(Label::parse(" Read-Failure ").expect("parse"), Label::ReadFailure);
        assert_eq!(Label::parse("no_code").expect("parse"), Label::NoCode);
        assert!(matches!(Label::parse("smudged"), Err(ParcelError::UnknownLabel(t)) if t == "smudged"));
    }

    #[test]
    fn test_unclassified_is_first_and_default() {
        assert_eq!(Label::iter().next(), Some(Label::Unclassified));
        assert_eq!(Label::default(), Label::Unclassified);
        assert!(!Label::Unclassified.is_classified());
        assert!(Label::Other.is_classified());
    }

    #[test]
    fn test_image_id_file_name() {
        assert_eq!(ImageId::from("/scans/day1/PKG_cam2_0815.jpg").file_name(), "PKG_cam2_0815.jpg");
        assert_eq!(ImageId::from("loose.png").file_name(), "loose.png");
    }
}
