//! HDF5 superblock: parsing for versions 0 to 3, writing for version 3.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::bytes::{ensure_len, push_uint, read_u32, read_uint, UNDEFINED_ADDRESS};
use crate::checksum::jenkins_lookup3;
use crate::error::FormatError;
use crate::signature::HDF5_SIGNATURE;

/// Size in bytes of a version 2/3 superblock with 8-byte offsets.
pub const SUPERBLOCK_V3_SIZE: usize = 48;

/// The superblock fields the store needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    /// Superblock version (0 to 3).
    pub version: u8,
    /// Size of offsets in bytes (2, 4, or 8).
    pub offset_size: u8,
    /// Size of lengths in bytes (2, 4, or 8).
    pub length_size: u8,
    /// File base address.
    pub base_address: u64,
    /// End-of-file address.
    pub eof_address: u64,
    /// Address of the root group's object header.
    pub root_group_address: u64,
    /// Superblock extension address (v2/v3 only).
    pub extension_address: Option<u64>,
}

fn validate_sizes(offset_size: u8, length_size: u8) -> Result<(), FormatError> {
    if !matches!(offset_size, 2 | 4 | 8) {
        return Err(FormatError::InvalidOffsetSize(offset_size));
    }
    if !matches!(length_size, 2 | 4 | 8) {
        return Err(FormatError::InvalidLengthSize(length_size));
    }
    Ok(())
}

impl Superblock {
    /// Superblock for a freshly written file (version 3, 8-byte fields).
    pub fn v3(eof_address: u64, root_group_address: u64) -> Superblock {
        Superblock {
            version: 3,
            offset_size: 8,
            length_size: 8,
            base_address: 0,
            eof_address,
            root_group_address,
            extension_address: None,
        }
    }

    /// Parse a superblock from `data` starting at `signature_offset`.
    pub fn parse(data: &[u8], signature_offset: usize) -> Result<Superblock, FormatError> {
        let d = data.get(signature_offset..).unwrap_or(&[]);
        ensure_len(d, 0, 9)?;
        if d[..8] != HDF5_SIGNATURE {
            return Err(FormatError::SignatureNotFound);
        }
        match d[8] {
            v @ (0 | 1) => Self::parse_v0v1(d, v),
            v @ (2 | 3) => Self::parse_v2v3(d, v),
            v => Err(FormatError::UnsupportedVersion(v)),
        }
    }

    fn parse_v0v1(d: &[u8], version: u8) -> Result<Superblock, FormatError> {
        // Fixed prefix is 24 bytes for v0; v1 adds indexed-storage K and
        // 2 reserved bytes.
        let fixed = if version == 0 { 24 } else { 28 };
        ensure_len(d, 0, fixed)?;
        let offset_size = d[13];
        let length_size = d[14];
        validate_sizes(offset_size, length_size)?;
        let os = offset_size as usize;

        // base, free-space, eof, driver-info addresses, then the root
        // symbol table entry (link name offset, object header address, ...).
        ensure_len(d, fixed, 6 * os + 24)?;
        let base_address = read_uint(d, fixed, offset_size)?;
        let eof_address = read_uint(d, fixed + 2 * os, offset_size)?;
        let root_group_address = read_uint(d, fixed + 5 * os, offset_size)?;

        Ok(Superblock {
            version,
            offset_size,
            length_size,
            base_address,
            eof_address,
            root_group_address,
            extension_address: None,
        })
    }

    fn parse_v2v3(d: &[u8], version: u8) -> Result<Superblock, FormatError> {
        ensure_len(d, 0, 12)?;
        let offset_size = d[9];
        let length_size = d[10];
        validate_sizes(offset_size, length_size)?;
        let os = offset_size as usize;
        let checksum_pos = 12 + 4 * os;
        ensure_len(d, checksum_pos, 4)?;

        let stored = read_u32(d, checksum_pos)?;
        let computed = jenkins_lookup3(&d[..checksum_pos]);
        if stored != computed {
            return Err(FormatError::ChecksumMismatch {
                expected: stored,
                computed,
            });
        }

        let extension = read_uint(d, 12 + os, offset_size)?;
        Ok(Superblock {
            version,
            offset_size,
            length_size,
            base_address: read_uint(d, 12, offset_size)?,
            eof_address: read_uint(d, 12 + 2 * os, offset_size)?,
            root_group_address: read_uint(d, 12 + 3 * os, offset_size)?,
            extension_address: (extension != UNDEFINED_ADDRESS).then_some(extension),
        })
    }

    /// Serialize as a version 2/3 superblock, checksum included.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(12 + 4 * self.offset_size as usize + 4);
        buf.extend_from_slice(&HDF5_SIGNATURE);
        buf.push(self.version.max(2));
        buf.push(self.offset_size);
        buf.push(self.length_size);
        buf.push(0); // file consistency flags
        push_uint(&mut buf, self.base_address, self.offset_size);
        push_uint(
            &mut buf,
            self.extension_address.unwrap_or(UNDEFINED_ADDRESS),
            self.offset_size,
        );
        push_uint(&mut buf, self.eof_address, self.offset_size);
        push_uint(&mut buf, self.root_group_address, self.offset_size);
        let checksum = jenkins_lookup3(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }
}
