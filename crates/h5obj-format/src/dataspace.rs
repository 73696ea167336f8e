//! HDF5 dataspace message (type 0x0001).

#[cfg(not(feature = "std"))]
use alloc::{format, vec::Vec};

use crate::bytes::{ensure_len, push_uint, read_uint};
use crate::error::FormatError;

/// Shape class of a dataspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataspaceType {
    /// Single element, rank 0.
    Scalar,
    /// N-dimensional array.
    Simple,
    /// No elements at all.
    Null,
}

/// Parsed HDF5 dataspace message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataspace {
    /// The type of this dataspace.
    pub space_type: DataspaceType,
    /// Current dimension sizes (empty for scalar and null).
    pub dimensions: Vec<u64>,
}

impl Dataspace {
    /// Rank-0 dataspace holding one element.
    pub fn scalar() -> Dataspace {
        Dataspace {
            space_type: DataspaceType::Scalar,
            dimensions: Vec::new(),
        }
    }

    /// Simple dataspace of the given shape.
    pub fn simple(dimensions: &[u64]) -> Dataspace {
        Dataspace {
            space_type: DataspaceType::Simple,
            dimensions: dimensions.to_vec(),
        }
    }

    /// Scalar for an empty shape, simple otherwise.
    pub fn from_shape(shape: &[u64]) -> Dataspace {
        if shape.is_empty() {
            Dataspace::scalar()
        } else {
            Dataspace::simple(shape)
        }
    }

    /// Number of elements: 0 for null, 1 for scalar, the product otherwise.
    pub fn num_elements(&self) -> u64 {
        match self.space_type {
            DataspaceType::Null => 0,
            DataspaceType::Scalar => 1,
            DataspaceType::Simple => self.dimensions.iter().product(),
        }
    }

    /// Parse a dataspace message (v1 or v2).
    pub fn parse(data: &[u8], length_size: u8) -> Result<Dataspace, FormatError> {
        ensure_len(data, 0, 4)?;
        let version = data[0];
        let rank = data[1] as usize;
        let (space_type, mut pos) = match version {
            // v1 has 5 reserved bytes after the flags; rank 0 means scalar.
            1 => {
                ensure_len(data, 0, 8)?;
                let st = if rank == 0 {
                    DataspaceType::Scalar
                } else {
                    DataspaceType::Simple
                };
                (st, 8)
            }
            2 => {
                let st = match data[3] {
                    0 => DataspaceType::Scalar,
                    1 => DataspaceType::Simple,
                    2 => DataspaceType::Null,
                    other => {
                        return Err(FormatError::Unsupported(format!("dataspace type {other}")));
                    }
                };
                (st, 4)
            }
            v => return Err(FormatError::InvalidDataspaceVersion(v)),
        };
        let mut dimensions = Vec::with_capacity(rank);
        for _ in 0..rank {
            dimensions.push(read_uint(data, pos, length_size)?);
            pos += length_size as usize;
        }
        // Maximum dimensions (flags bit 0) are not needed: datasets never grow.
        Ok(Dataspace {
            space_type,
            dimensions,
        })
    }

    /// Serialize as a v2 dataspace message without maximum dimensions.
    pub fn serialize(&self, length_size: u8) -> Vec<u8> {
        let type_byte = match self.space_type {
            DataspaceType::Scalar => 0,
            DataspaceType::Simple => 1,
            DataspaceType::Null => 2,
        };
        let mut buf = Vec::with_capacity(4 + self.dimensions.len() * length_size as usize);
        buf.extend_from_slice(&[2, self.dimensions.len() as u8, 0, type_byte]);
        for &dim in &self.dimensions {
            push_uint(&mut buf, dim, length_size);
        }
        buf
    }
}
