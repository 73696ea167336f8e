//! HDF5 file signature (magic bytes) detection.

use crate::error::FormatError;

/// The 8-byte HDF5 magic signature.
pub const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1A, b'\n'];

/// Search for the HDF5 signature at offset 0, 512, 1024, 2048, ...
///
/// Returns the byte offset where the signature was found.
pub fn find_signature(data: &[u8]) -> Result<usize, FormatError> {
    let candidates = core::iter::once(0).chain(core::iter::successors(Some(512usize), |o| {
        o.checked_mul(2)
    }));
    for offset in candidates {
        let Some(window) = data.get(offset..offset + 8) else {
            break;
        };
        if window == HDF5_SIGNATURE {
            return Ok(offset);
        }
    }
    Err(FormatError::SignatureNotFound)
}

/// Cheap check used before opening a file as HDF5.
pub fn is_hdf5(data: &[u8]) -> bool {
    find_signature(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_signature_at(len: usize, offset: usize) -> Vec<u8> {
        let mut data = vec![0u8; len];
        data[offset..offset + 8].copy_from_slice(&HDF5_SIGNATURE);
        data
    }

    #[test]
    fn found_at_power_of_two_offsets() {
        assert_eq!(find_signature(&with_signature_at(64, 0)), Ok(0));
        assert_eq!(find_signature(&with_signature_at(1024, 512)), Ok(512));
        assert_eq!(find_signature(&with_signature_at(4096, 2048)), Ok(2048));
    }

    #[test]
    fn not_found_at_odd_offset() {
        let data = with_signature_at(1024, 100);
        assert_eq!(find_signature(&data), Err(FormatError::SignatureNotFound));
        assert!(!is_hdf5(&data));
    }

    #[test]
    fn too_short() {
        assert_eq!(find_signature(&[0x89, b'H']), Err(FormatError::SignatureNotFound));
    }
}
