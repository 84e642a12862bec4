use barcode::{BarcodeDetector, BarcodeError, DetectorConfig};
use parcel::parse_expected_total;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelerError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Invalid detector settings: {0}")]
    DetectorError(#[from] BarcodeError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Settings for a labeling station
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct LabelerConfig {
    pub detector: DetectorConfig,
    /// Seconds between checks for new images in `watch`
    pub poll_interval_secs: u64,
    /// Auto-classify images that show up while watching
    pub auto_classify_new: bool,
    /// Expected parcel total as typed by the operator; blank or
    /// non-numeric disables read rates
    pub expected_total: Option<String>,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            poll_interval_secs: 5,
            auto_classify_new: false,
            expected_total: None,
        }
    }
}

impl LabelerConfig {
    pub fn detector(&self) -> Result<BarcodeDetector, LabelerError> {
        Ok(BarcodeDetector::new(self.detector.clone())?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn expected_total(&self) -> Option<u32> {
        self.expected_total.as_deref().and_then(parse_expected_total)
    }

    /// Load LabelerConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, LabelerError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, LabelerError> {
        Ok(toml::from_str(content)?)
    }

    /// Load LabelerConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, LabelerError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, LabelerError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LabelerError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(LabelerError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LabelerError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, LabelerError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LabelerError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, LabelerError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// JSON schema of the config file
    pub fn schema() -> Result<String, LabelerError> {
        let schema = schemars::schema_for!(LabelerConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}
