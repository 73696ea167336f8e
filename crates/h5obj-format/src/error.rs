//! Error types for HDF5 format parsing and writing.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use core::fmt;

/// Errors that can occur when reading or writing HDF5 binary structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The HDF5 magic signature was not found at any valid offset.
    SignatureNotFound,
    /// The superblock version is not supported.
    UnsupportedVersion(u8),
    /// Unexpected end of data.
    UnexpectedEof {
        /// Number of bytes expected.
        expected: usize,
        /// Number of bytes actually available.
        available: usize,
    },
    /// Invalid offset size (must be 2, 4, or 8).
    InvalidOffsetSize(u8),
    /// Invalid length size (must be 2, 4, or 8).
    InvalidLengthSize(u8),
    /// Invalid object header version.
    InvalidObjectHeaderVersion(u8),
    /// Unknown message type that is marked as must-understand.
    UnsupportedMessage(u16),
    /// Jenkins lookup3 checksum mismatch.
    ChecksumMismatch {
        /// The checksum stored in the file.
        expected: u32,
        /// The checksum we computed.
        computed: u32,
    },
    /// Unknown datatype class id.
    InvalidDatatypeClass(u8),
    /// Datatype class with an unsupported encoding version.
    InvalidDatatypeVersion {
        /// Datatype class id.
        class: u8,
        /// Encoding version found.
        version: u8,
    },
    /// Invalid string padding value.
    InvalidStringPadding(u8),
    /// Invalid character set value.
    InvalidCharacterSet(u8),
    /// Invalid dataspace message version.
    InvalidDataspaceVersion(u8),
    /// Invalid data layout version.
    InvalidLayoutVersion(u8),
    /// Invalid data layout class.
    InvalidLayoutClass(u8),
    /// Invalid link message version.
    InvalidLinkVersion(u8),
    /// Invalid attribute message version.
    InvalidAttributeVersion(u8),
    /// A required header message is absent.
    MissingMessage(&'static str),
    /// Raw data was requested as a type it cannot be converted to.
    TypeMismatch {
        /// What the caller asked for.
        expected: &'static str,
        /// What the datatype actually is.
        actual: String,
    },
    /// Raw data size does not match the datatype and dataspace.
    DataSizeMismatch {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },
    /// Valid HDF5 that uses a feature outside the supported subset.
    Unsupported(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::SignatureNotFound => {
                write!(f, "HDF5 signature not found at any valid offset")
            }
            FormatError::UnsupportedVersion(v) => {
                write!(f, "unsupported superblock version: {v}")
            }
            FormatError::UnexpectedEof {
                expected,
                available,
            } => {
                write!(f, "unexpected EOF: need {expected} bytes, have {available}")
            }
            FormatError::InvalidOffsetSize(s) => {
                write!(f, "invalid offset size: {s} (must be 2, 4, or 8)")
            }
            FormatError::InvalidLengthSize(s) => {
                write!(f, "invalid length size: {s} (must be 2, 4, or 8)")
            }
            FormatError::InvalidObjectHeaderVersion(v) => {
                write!(f, "invalid object header version: {v}")
            }
            FormatError::UnsupportedMessage(id) => {
                write!(
                    f,
                    "unsupported message type {id:#06x} marked as must-understand"
                )
            }
            FormatError::ChecksumMismatch { expected, computed } => {
                write!(
                    f,
                    "checksum mismatch: expected {expected:#010x}, computed {computed:#010x}"
                )
            }
            FormatError::InvalidDatatypeClass(c) => write!(f, "invalid datatype class: {c}"),
            FormatError::InvalidDatatypeVersion { class, version } => {
                write!(f, "datatype class {class} has unsupported version {version}")
            }
            FormatError::InvalidStringPadding(v) => write!(f, "invalid string padding: {v}"),
            FormatError::InvalidCharacterSet(v) => write!(f, "invalid character set: {v}"),
            FormatError::InvalidDataspaceVersion(v) => {
                write!(f, "invalid dataspace version: {v}")
            }
            FormatError::InvalidLayoutVersion(v) => write!(f, "invalid data layout version: {v}"),
            FormatError::InvalidLayoutClass(c) => write!(f, "invalid data layout class: {c}"),
            FormatError::InvalidLinkVersion(v) => write!(f, "invalid link message version: {v}"),
            FormatError::InvalidAttributeVersion(v) => {
                write!(f, "invalid attribute message version: {v}")
            }
            FormatError::MissingMessage(what) => write!(f, "missing {what} message"),
            FormatError::TypeMismatch { expected, actual } => {
                write!(f, "cannot read {actual} as {expected}")
            }
            FormatError::DataSizeMismatch { expected, actual } => {
                write!(f, "data size mismatch: expected {expected} bytes, got {actual}")
            }
            FormatError::Unsupported(what) => write!(f, "unsupported HDF5 feature: {what}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FormatError {}
