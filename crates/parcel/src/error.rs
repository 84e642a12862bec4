use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParcelError {
    #[error("Folder not found: {0:?}")]
    FolderNotFound(PathBuf),

    #[error("Unknown image: {0}")]
    UnknownImage(String),

    #[error("Unknown label '{0}'")]
    UnknownLabel(String),

    #[error("Label session lock poisoned")]
    LockPoisoned,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to persist {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ParcelError>;
