//! Little-endian field helpers shared by the message parsers and writers.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

/// Undefined address (all bits set), used for absent heaps and empty data.
pub const UNDEFINED_ADDRESS: u64 = u64::MAX;

/// The undefined address as it reads back with `offset_size`-byte offsets.
pub(crate) fn undefined_address(offset_size: u8) -> u64 {
    UNDEFINED_ADDRESS >> (64 - 8 * offset_size as u32)
}

pub(crate) fn ensure_len(data: &[u8], offset: usize, needed: usize) -> Result<(), FormatError> {
    let end = offset.saturating_add(needed);
    if end > data.len() {
        Err(FormatError::UnexpectedEof {
            expected: end,
            available: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Read an unsigned little-endian integer of 1, 2, 4, or 8 bytes.
pub(crate) fn read_uint(data: &[u8], pos: usize, size: u8) -> Result<u64, FormatError> {
    ensure_len(data, pos, size as usize)?;
    let slice = &data[pos..pos + size as usize];
    Ok(match size {
        1 => slice[0] as u64,
        2 => LittleEndian::read_u16(slice) as u64,
        4 => LittleEndian::read_u32(slice) as u64,
        8 => LittleEndian::read_u64(slice),
        other => return Err(FormatError::InvalidOffsetSize(other)),
    })
}

pub(crate) fn read_u16(data: &[u8], pos: usize) -> Result<u16, FormatError> {
    ensure_len(data, pos, 2)?;
    Ok(LittleEndian::read_u16(&data[pos..pos + 2]))
}

pub(crate) fn read_u32(data: &[u8], pos: usize) -> Result<u32, FormatError> {
    ensure_len(data, pos, 4)?;
    Ok(LittleEndian::read_u32(&data[pos..pos + 4]))
}

/// Append `val` as a little-endian integer of `size` bytes.
pub(crate) fn push_uint(buf: &mut Vec<u8>, val: u64, size: u8) {
    buf.extend_from_slice(&val.to_le_bytes()[..size as usize]);
}

/// Read a null-terminated name starting at `pos`.
///
/// Returns the name and the number of bytes consumed, terminator included.
pub(crate) fn read_cstr(data: &[u8], pos: usize) -> Result<(String, usize), FormatError> {
    let rest = data.get(pos..).unwrap_or(&[]);
    let nul = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(FormatError::UnexpectedEof {
            expected: pos + rest.len() + 1,
            available: data.len(),
        })?;
    Ok((String::from_utf8_lossy(&rest[..nul]).into_owned(), nul + 1))
}

/// Round `n` up to the next multiple of 8.
pub(crate) fn pad8(n: usize) -> usize {
    (n + 7) & !7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_roundtrip_widths() {
        for size in [1u8, 2, 4, 8] {
            let mut buf = Vec::new();
            push_uint(&mut buf, 0x7f, size);
            assert_eq!(buf.len(), size as usize);
            assert_eq!(read_uint(&buf, 0, size).unwrap(), 0x7f);
        }
    }

    #[test]
    fn bad_width_rejected() {
        assert_eq!(read_uint(&[0; 8], 0, 3), Err(FormatError::InvalidOffsetSize(3)));
    }

    #[test]
    fn cstr_needs_terminator() {
        assert_eq!(read_cstr(b"abc\0def", 0).unwrap(), ("abc".into(), 4));
        assert!(read_cstr(b"abc", 0).is_err());
    }
}
