//! HDF5 data layout message (type 0x0008).

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::bytes::{ensure_len, push_uint, read_u16, read_uint, UNDEFINED_ADDRESS};
use crate::error::FormatError;

/// Where a dataset's raw data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLayout {
    /// Data stored inline in the message.
    Compact {
        /// The inline raw data bytes.
        data: Vec<u8>,
    },
    /// Data stored at a single address in the file.
    Contiguous {
        /// File address of the data, `None` when never allocated.
        address: Option<u64>,
        /// Size of the data in bytes.
        size: u64,
    },
    /// Chunked or virtual storage, which this crate does not read.
    Other {
        /// Layout class (2 = chunked, 3 = virtual).
        class: u8,
    },
}

impl DataLayout {
    /// Contiguous layout for `size` bytes at `address` (undefined when empty).
    pub fn contiguous(address: u64, size: u64) -> DataLayout {
        DataLayout::Contiguous {
            address: (size > 0).then_some(address),
            size,
        }
    }

    /// Parse a layout message (versions 3 and 4).
    pub fn parse(data: &[u8], offset_size: u8, length_size: u8) -> Result<DataLayout, FormatError> {
        ensure_len(data, 0, 2)?;
        let version = data[0];
        if !matches!(version, 3 | 4) {
            return Err(FormatError::InvalidLayoutVersion(version));
        }
        match data[1] {
            0 => {
                let size = read_u16(data, 2)? as usize;
                ensure_len(data, 4, size)?;
                Ok(DataLayout::Compact {
                    data: data[4..4 + size].to_vec(),
                })
            }
            1 => {
                let address = read_uint(data, 2, offset_size)?;
                let size = read_uint(data, 2 + offset_size as usize, length_size)?;
                let undefined = address == UNDEFINED_ADDRESS >> (64 - 8 * offset_size as u32);
                Ok(DataLayout::Contiguous {
                    address: (!undefined).then_some(address),
                    size,
                })
            }
            class @ (2 | 3) => Ok(DataLayout::Other { class }),
            class => Err(FormatError::InvalidLayoutClass(class)),
        }
    }

    /// Serialize as a version 3 message.
    pub fn serialize(&self, offset_size: u8, length_size: u8) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::with_capacity(2 + offset_size as usize + length_size as usize);
        buf.push(3);
        match self {
            DataLayout::Compact { data } => {
                let size = u16::try_from(data.len())
                    .map_err(|_| FormatError::Unsupported("compact data over 64 KiB".into()))?;
                buf.push(0);
                buf.extend_from_slice(&size.to_le_bytes());
                buf.extend_from_slice(data);
            }
            DataLayout::Contiguous { address, size } => {
                buf.push(1);
                push_uint(&mut buf, address.unwrap_or(UNDEFINED_ADDRESS), offset_size);
                push_uint(&mut buf, *size, length_size);
            }
            DataLayout::Other { .. } => {
                return Err(FormatError::Unsupported("writing chunked or virtual layout".into()));
            }
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_roundtrip() {
        let layout = DataLayout::contiguous(4096, 80);
        let bytes = layout.serialize(8, 8).unwrap();
        assert_eq!(DataLayout::parse(&bytes, 8, 8).unwrap(), layout);
    }

    #[test]
    fn empty_contiguous_is_unallocated() {
        let layout = DataLayout::contiguous(4096, 0);
        assert_eq!(layout, DataLayout::Contiguous { address: None, size: 0 });
        let bytes = layout.serialize(8, 8).unwrap();
        assert_eq!(DataLayout::parse(&bytes, 8, 8).unwrap(), layout);
    }

    #[test]
    fn compact_roundtrip() {
        let layout = DataLayout::Compact { data: vec![1, 2, 3] };
        let bytes = layout.serialize(8, 8).unwrap();
        assert_eq!(DataLayout::parse(&bytes, 8, 8).unwrap(), layout);
    }

    #[test]
    fn v4_chunked_is_reported() {
        let bytes = [4u8, 2, 0, 1, 8];
        assert_eq!(DataLayout::parse(&bytes, 8, 8).unwrap(), DataLayout::Other { class: 2 });
    }

    #[test]
    fn old_versions_rejected() {
        assert_eq!(
            DataLayout::parse(&[1, 1], 8, 8),
            Err(FormatError::InvalidLayoutVersion(1))
        );
    }
}
