use std::path::PathBuf;

use h5obj_format::FormatError;

/// Errors raised by the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: file already exists")]
    FileExists { path: PathBuf },

    #[error("HDF5 format error: {0}")]
    Format(#[from] FormatError),

    #[error("file is open read-only")]
    ReadOnly,

    #[error("invalid file mode {0:?} (expected r, r+, w, a, x or w-)")]
    InvalidMode(String),

    #[error("invalid object name {0:?}")]
    InvalidName(String),

    #[error("no such object: {0}")]
    NotFound(String),

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("not a group: {0}")]
    NotAGroup(String),

    #[error("not a dataset: {0}")]
    NotADataset(String),

    #[error("cannot store {name} natively: {reason}")]
    UnsupportedShape { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
