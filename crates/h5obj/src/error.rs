//! Error types for object persistence.

use h5obj_store::StoreError;

/// Errors raised while encoding or decoding values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested name is absent.
    #[error("{path}: no such object")]
    NotFound { path: String },

    /// The name exists and overwriting was not allowed.
    #[error("{path}: object already exists")]
    AlreadyExists { path: String },

    /// The store cannot hold the value natively and pickling is disabled.
    #[error("{path}: cannot store natively: {reason}")]
    UnsupportedShape { path: String, reason: String },

    /// A pickled payload could not be turned back into a value.
    #[error("{path}: cannot unpickle: {reason}")]
    Deserialization { path: String, reason: String },

    /// A node carries a known type tag but its layout does not match it.
    #[error("{path}: malformed node: {reason}")]
    StructuralMismatch { path: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("pickle error: {0}")]
    Pickle(#[from] serde_pickle::Error),
}

impl Error {
    pub(crate) fn mismatch(path: &str, reason: impl Into<String>) -> Error {
        Error::StructuralMismatch {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
