//! Raw data access and typed conversion.
//!
//! Converters take the raw element bytes plus the element datatype and widen
//! to a fixed Rust type; anything that would lose meaning is a
//! [`FormatError::TypeMismatch`].

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec, vec::Vec};

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

use crate::bytes::ensure_len;
use crate::data_layout::DataLayout;
use crate::dataspace::Dataspace;
use crate::datatype::{ByteOrder, Datatype, StringPadding};
use crate::error::FormatError;

/// Read the raw bytes of a dataset.
pub fn read_raw(
    file_data: &[u8],
    layout: &DataLayout,
    dataspace: &Dataspace,
    datatype: &Datatype,
) -> Result<Vec<u8>, FormatError> {
    let expected = dataspace.num_elements() as usize * datatype.type_size() as usize;
    let raw = match layout {
        DataLayout::Compact { data } => data.clone(),
        DataLayout::Contiguous { address: None, .. } => Vec::new(),
        DataLayout::Contiguous {
            address: Some(addr),
            size,
        } => {
            let (addr, size) = (*addr as usize, *size as usize);
            ensure_len(file_data, addr, size)?;
            file_data[addr..addr + size].to_vec()
        }
        DataLayout::Other { class } => {
            return Err(FormatError::Unsupported(format!("layout class {class}")))
        }
    };
    // An unallocated contiguous dataset reads as the zero fill value.
    if raw.is_empty() && expected > 0 {
        return Ok(vec![0u8; expected]);
    }
    if raw.len() < expected {
        return Err(FormatError::DataSizeMismatch {
            expected,
            actual: raw.len(),
        });
    }
    Ok(raw)
}

fn mismatch(expected: &'static str, dt: &Datatype) -> FormatError {
    FormatError::TypeMismatch {
        expected,
        actual: format!("{dt}"),
    }
}

fn int_at(bytes: &[u8], order: ByteOrder, signed: bool) -> i128 {
    let n = bytes.len();
    match (order, signed) {
        (ByteOrder::LittleEndian, true) => LittleEndian::read_int128(bytes, n),
        (ByteOrder::LittleEndian, false) => LittleEndian::read_uint128(bytes, n) as i128,
        (ByteOrder::BigEndian, true) => BigEndian::read_int128(bytes, n),
        (ByteOrder::BigEndian, false) => BigEndian::read_uint128(bytes, n) as i128,
    }
}

fn float_at(bytes: &[u8], order: ByteOrder) -> Option<f64> {
    Some(match (bytes.len(), order) {
        (8, ByteOrder::LittleEndian) => LittleEndian::read_f64(bytes),
        (8, ByteOrder::BigEndian) => BigEndian::read_f64(bytes),
        (4, ByteOrder::LittleEndian) => LittleEndian::read_f32(bytes) as f64,
        (4, ByteOrder::BigEndian) => BigEndian::read_f32(bytes) as f64,
        _ => return None,
    })
}

/// Integers of up to 16 bytes, widened to `i128`.
pub fn read_as_i128(raw: &[u8], datatype: &Datatype) -> Result<Vec<i128>, FormatError> {
    match datatype {
        Datatype::FixedPoint {
            size,
            byte_order,
            signed,
        } if (1..=16).contains(size) => Ok(raw
            .chunks_exact(*size as usize)
            .map(|c| int_at(c, *byte_order, *signed))
            .collect()),
        Datatype::Enumeration { base_type, .. } => read_as_i128(raw, base_type),
        _ => Err(mismatch("integer", datatype)),
    }
}

/// Integers that fit in `i64`. Wider values are a type mismatch.
pub fn read_as_i64(raw: &[u8], datatype: &Datatype) -> Result<Vec<i64>, FormatError> {
    read_as_i128(raw, datatype)?
        .into_iter()
        .map(|v| i64::try_from(v).map_err(|_| mismatch("int64", datatype)))
        .collect()
}

/// Floats, or integers converted to `f64`.
pub fn read_as_f64(raw: &[u8], datatype: &Datatype) -> Result<Vec<f64>, FormatError> {
    match datatype {
        Datatype::FloatingPoint { size, byte_order } if *size > 0 => raw
            .chunks_exact(*size as usize)
            .map(|c| float_at(c, *byte_order).ok_or_else(|| mismatch("float64", datatype)))
            .collect(),
        Datatype::FixedPoint { .. } => {
            Ok(read_as_i128(raw, datatype)?.into_iter().map(|v| v as f64).collect())
        }
        _ => Err(mismatch("float64", datatype)),
    }
}

/// A FALSE/TRUE enumeration, or any integer (non-zero is true).
pub fn read_as_bool(raw: &[u8], datatype: &Datatype) -> Result<Vec<bool>, FormatError> {
    match datatype {
        Datatype::Enumeration { members, base_type, .. } if datatype.is_bool() => {
            let size = base_type.type_size().max(1) as usize;
            let truthy = members
                .iter()
                .find(|m| m.name == "TRUE")
                .map(|m| m.value.clone())
                .unwrap_or_default();
            Ok(raw.chunks_exact(size).map(|c| c == truthy.as_slice()).collect())
        }
        Datatype::FixedPoint { .. } => {
            Ok(read_as_i128(raw, datatype)?.into_iter().map(|v| v != 0).collect())
        }
        _ => Err(mismatch("bool", datatype)),
    }
}

/// Complex numbers stored as an `{r, i}` compound of floats.
pub fn read_as_complex(raw: &[u8], datatype: &Datatype) -> Result<Vec<(f64, f64)>, FormatError> {
    let Datatype::Compound { size, members } = datatype else {
        return Err(mismatch("complex", datatype));
    };
    if *size == 0 || !datatype.is_complex() {
        return Err(mismatch("complex", datatype));
    }
    let part = |elem: &[u8], idx: usize| -> Result<f64, FormatError> {
        let m = &members[idx];
        let Datatype::FloatingPoint { size, byte_order } = m.datatype else {
            return Err(mismatch("complex", datatype));
        };
        let start = m.byte_offset as usize;
        let bytes = elem
            .get(start..start + size as usize)
            .ok_or_else(|| mismatch("complex", datatype))?;
        float_at(bytes, byte_order).ok_or_else(|| mismatch("complex", datatype))
    };
    raw.chunks_exact(*size as usize)
        .map(|elem| Ok((part(elem, 0)?, part(elem, 1)?)))
        .collect()
}

/// Fixed-length strings with their padding removed.
pub fn read_as_strings(raw: &[u8], datatype: &Datatype) -> Result<Vec<String>, FormatError> {
    let Datatype::String { size, padding, .. } = datatype else {
        return Err(mismatch("string", datatype));
    };
    if *size == 0 {
        return Err(mismatch("string", datatype));
    }
    Ok(raw
        .chunks_exact(*size as usize)
        .map(|c| {
            let end = match padding {
                StringPadding::SpacePad => c.iter().rposition(|&b| b != b' ').map_or(0, |p| p + 1),
                _ => c.iter().position(|&b| b == 0).unwrap_or(c.len()),
            };
            String::from_utf8_lossy(&c[..end]).into_owned()
        })
        .collect())
}

/// The bytes of each opaque element.
pub fn read_as_opaque(raw: &[u8], datatype: &Datatype) -> Result<Vec<Vec<u8>>, FormatError> {
    match datatype {
        Datatype::Opaque { size, .. } if *size > 0 => {
            Ok(raw.chunks_exact(*size as usize).map(<[u8]>::to_vec).collect())
        }
        _ => Err(mismatch("opaque", datatype)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_read() {
        let file: Vec<u8> = (0u8..32).collect();
        let layout = DataLayout::contiguous(8, 16);
        let raw = read_raw(&file, &layout, &Dataspace::simple(&[2]), &Datatype::int(8)).unwrap();
        assert_eq!(raw, (8u8..24).collect::<Vec<_>>());
    }

    #[test]
    fn contiguous_out_of_bounds() {
        let layout = DataLayout::contiguous(8, 16);
        let err = read_raw(&[0; 10], &layout, &Dataspace::simple(&[2]), &Datatype::int(8));
        assert!(matches!(err, Err(FormatError::UnexpectedEof { .. })));
    }

    #[test]
    fn compact_too_short() {
        let layout = DataLayout::Compact { data: vec![1, 2, 3] };
        let err = read_raw(&[], &layout, &Dataspace::simple(&[1]), &Datatype::int(8));
        assert_eq!(
            err,
            Err(FormatError::DataSizeMismatch {
                expected: 8,
                actual: 3
            })
        );
    }

    #[test]
    fn unallocated_reads_zero() {
        let layout = DataLayout::Contiguous {
            address: None,
            size: 0,
        };
        let raw = read_raw(&[], &layout, &Dataspace::simple(&[3]), &Datatype::float(8)).unwrap();
        assert_eq!(read_as_f64(&raw, &Datatype::float(8)).unwrap(), vec![0.0; 3]);
    }

    #[test]
    fn integers_of_every_width() {
        let dt = Datatype::FixedPoint {
            size: 2,
            byte_order: ByteOrder::BigEndian,
            signed: true,
        };
        assert_eq!(read_as_i64(&[0xff, 0xfe, 0x00, 0x05], &dt).unwrap(), vec![-2, 5]);

        let unsigned = Datatype::FixedPoint {
            size: 1,
            byte_order: ByteOrder::LittleEndian,
            signed: false,
        };
        assert_eq!(read_as_i64(&[255], &unsigned).unwrap(), vec![255]);
    }

    #[test]
    fn wide_integer_overflows_i64() {
        let big = (i64::MAX as i128 + 1).to_le_bytes();
        let dt = Datatype::int(16);
        assert_eq!(read_as_i128(&big, &dt).unwrap(), vec![i64::MAX as i128 + 1]);
        assert!(read_as_i64(&big, &dt).is_err());
    }

    #[test]
    fn f32_widens() {
        let dt = Datatype::float(4);
        assert_eq!(read_as_f64(&1.5f32.to_le_bytes(), &dt).unwrap(), vec![1.5]);
    }

    #[test]
    fn bool_enum() {
        let dt = Datatype::bool_enum();
        assert_eq!(read_as_bool(&[1, 0, 1], &dt).unwrap(), vec![true, false, true]);
        assert!(read_as_bool(&[0], &Datatype::float(8)).is_err());
    }

    #[test]
    fn complex_pairs() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1.0f64.to_le_bytes());
        raw.extend_from_slice(&(-2.0f64).to_le_bytes());
        assert_eq!(
            read_as_complex(&raw, &Datatype::complex128()).unwrap(),
            vec![(1.0, -2.0)]
        );
    }

    #[test]
    fn strings_trim_padding() {
        let dt = Datatype::fixed_string(5);
        assert_eq!(
            read_as_strings(b"ab\0\0\0hello", &dt).unwrap(),
            vec!["ab".to_string(), "hello".to_string()]
        );
    }

    #[test]
    fn opaque_elements() {
        let dt = Datatype::opaque(3, "pickle");
        assert_eq!(read_as_opaque(b"abc", &dt).unwrap(), vec![b"abc".to_vec()]);
    }
}
