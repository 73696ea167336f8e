//! HDF5 datatype message (type 0x0003): parsing and serialization.
//!
//! Covers the classes the store writes: fixed-point, floating-point,
//! fixed-length string, opaque, compound and enumeration. Other classes are
//! kept as [`Datatype::Other`] so a foreign file can still be listed.

#[cfg(not(feature = "std"))]
use alloc::{borrow::ToOwned, boxed::Box, format, string::String, vec, vec::Vec};

use core::fmt;

use crate::bytes::{ensure_len, pad8, push_uint, read_cstr, read_u32, read_uint};
use crate::error::FormatError;

/// Byte order of numeric data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// String padding type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringPadding {
    NullTerminate,
    NullPad,
    SpacePad,
}

/// Character set encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    Ascii,
    Utf8,
}

/// A member of a compound datatype.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundMember {
    /// Member name.
    pub name: String,
    /// Byte offset within the compound.
    pub byte_offset: u64,
    /// Member datatype.
    pub datatype: Datatype,
}

/// A member of an enumeration datatype.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// Member name.
    pub name: String,
    /// Raw value bytes (length = base type size).
    pub value: Vec<u8>,
}

/// Parsed HDF5 datatype.
#[derive(Debug, Clone, PartialEq)]
pub enum Datatype {
    /// Class 0: integers.
    FixedPoint {
        size: u32,
        byte_order: ByteOrder,
        signed: bool,
    },
    /// Class 1: IEEE floats.
    FloatingPoint { size: u32, byte_order: ByteOrder },
    /// Class 3: fixed-length string.
    String {
        size: u32,
        padding: StringPadding,
        charset: CharacterSet,
    },
    /// Class 5: opaque bytes with an ASCII tag.
    Opaque { size: u32, tag: String },
    /// Class 6: compound.
    Compound {
        size: u32,
        members: Vec<CompoundMember>,
    },
    /// Class 8: enumeration over an integer base type.
    Enumeration {
        size: u32,
        base_type: Box<Datatype>,
        members: Vec<EnumMember>,
    },
    /// Any other class; only its element size is known.
    Other { class: u8, size: u32 },
}

fn padding_from(val: u8) -> Result<StringPadding, FormatError> {
    match val {
        0 => Ok(StringPadding::NullTerminate),
        1 => Ok(StringPadding::NullPad),
        2 => Ok(StringPadding::SpacePad),
        _ => Err(FormatError::InvalidStringPadding(val)),
    }
}

fn charset_from(val: u8) -> Result<CharacterSet, FormatError> {
    match val {
        0 => Ok(CharacterSet::Ascii),
        1 => Ok(CharacterSet::Utf8),
        _ => Err(FormatError::InvalidCharacterSet(val)),
    }
}

/// Bytes used for member offsets in a version 3 compound of `size` bytes.
fn member_offset_width(size: u32) -> u8 {
    if size <= 0xFF {
        1
    } else if size <= 0xFFFF {
        2
    } else {
        4
    }
}

fn header(class: u8, version: u8, bf: [u8; 3], size: u32) -> Vec<u8> {
    let mut buf = vec![(class & 0x0F) | (version << 4), bf[0], bf[1], bf[2]];
    buf.extend_from_slice(&size.to_le_bytes());
    buf
}

impl Datatype {
    /// Signed little-endian integer of `size` bytes.
    pub fn int(size: u32) -> Datatype {
        Datatype::FixedPoint {
            size,
            byte_order: ByteOrder::LittleEndian,
            signed: true,
        }
    }

    /// Little-endian IEEE float of `size` bytes (4 or 8).
    pub fn float(size: u32) -> Datatype {
        Datatype::FloatingPoint {
            size,
            byte_order: ByteOrder::LittleEndian,
        }
    }

    /// Fixed-length, null-padded UTF-8 string of `size` bytes.
    pub fn fixed_string(size: u32) -> Datatype {
        Datatype::String {
            size: size.max(1),
            padding: StringPadding::NullPad,
            charset: CharacterSet::Utf8,
        }
    }

    /// Opaque blob of `size` bytes.
    pub fn opaque(size: u32, tag: &str) -> Datatype {
        Datatype::Opaque {
            size,
            tag: tag.to_owned(),
        }
    }

    /// Boolean as an int8 enumeration `{FALSE: 0, TRUE: 1}`.
    pub fn bool_enum() -> Datatype {
        Datatype::Enumeration {
            size: 1,
            base_type: Box::new(Datatype::int(1)),
            members: vec![
                EnumMember {
                    name: "FALSE".into(),
                    value: vec![0],
                },
                EnumMember {
                    name: "TRUE".into(),
                    value: vec![1],
                },
            ],
        }
    }

    /// Complex number as a compound `{r: f64, i: f64}`.
    pub fn complex128() -> Datatype {
        Datatype::Compound {
            size: 16,
            members: vec![
                CompoundMember {
                    name: "r".into(),
                    byte_offset: 0,
                    datatype: Datatype::float(8),
                },
                CompoundMember {
                    name: "i".into(),
                    byte_offset: 8,
                    datatype: Datatype::float(8),
                },
            ],
        }
    }

    /// Whether this is a two-member float compound named `r`/`i`.
    pub fn is_complex(&self) -> bool {
        match self {
            Datatype::Compound { members, .. } => {
                members.len() == 2
                    && members[0].name == "r"
                    && members[1].name == "i"
                    && members
                        .iter()
                        .all(|m| matches!(m.datatype, Datatype::FloatingPoint { .. }))
            }
            _ => false,
        }
    }

    /// Whether this is an enumeration with exactly the members FALSE and TRUE.
    pub fn is_bool(&self) -> bool {
        match self {
            Datatype::Enumeration { members, .. } => {
                members.len() == 2
                    && members.iter().any(|m| m.name == "FALSE")
                    && members.iter().any(|m| m.name == "TRUE")
            }
            _ => false,
        }
    }

    /// Size in bytes of one element.
    pub fn type_size(&self) -> u32 {
        match self {
            Datatype::FixedPoint { size, .. }
            | Datatype::FloatingPoint { size, .. }
            | Datatype::String { size, .. }
            | Datatype::Opaque { size, .. }
            | Datatype::Compound { size, .. }
            | Datatype::Enumeration { size, .. }
            | Datatype::Other { size, .. } => *size,
        }
    }

    /// Parse a datatype message.
    ///
    /// Returns the datatype and the number of bytes consumed, so compound and
    /// enumeration members can be parsed recursively.
    pub fn parse(data: &[u8]) -> Result<(Datatype, usize), FormatError> {
        ensure_len(data, 0, 8)?;
        let class = data[0] & 0x0F;
        let version = data[0] >> 4;
        let [bf0, bf1] = [data[1], data[2]];
        let size = read_u32(data, 4)?;
        let mut pos = 8;
        let order = |bit: u8| {
            if bit & 0x01 == 0 {
                ByteOrder::LittleEndian
            } else {
                ByteOrder::BigEndian
            }
        };

        let dt = match class {
            0 => {
                pos += 4; // bit offset, bit precision
                Datatype::FixedPoint {
                    size,
                    byte_order: order(bf0),
                    signed: bf0 & 0x08 != 0,
                }
            }
            1 => {
                pos += 12; // offset, precision, exponent and mantissa layout, bias
                if bf0 & 0x40 != 0 {
                    return Err(FormatError::Unsupported("VAX float byte order".into()));
                }
                Datatype::FloatingPoint {
                    size,
                    byte_order: order(bf0),
                }
            }
            3 => Datatype::String {
                size,
                padding: padding_from(bf0 & 0x0F)?,
                charset: charset_from(bf0 >> 4)?,
            },
            5 => {
                let tag_len = bf0 as usize;
                ensure_len(data, pos, tag_len)?;
                let raw = &data[pos..pos + tag_len];
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                pos += pad8(tag_len);
                Datatype::Opaque {
                    size,
                    tag: String::from_utf8_lossy(&raw[..end]).into_owned(),
                }
            }
            6 => {
                let count = u16::from_le_bytes([bf0, bf1]) as usize;
                let mut members = Vec::with_capacity(count);
                for _ in 0..count {
                    let (name, name_len) = read_cstr(data, pos)?;
                    let byte_offset = match version {
                        1 | 2 => {
                            // Names padded to 8 bytes, then offset(4),
                            // dimensionality(1), reserved(3), permutation(4),
                            // reserved(4), dimension sizes(16).
                            pos += pad8(name_len);
                            let off = read_u32(data, pos)? as u64;
                            pos += if version == 1 { 32 } else { 4 };
                            off
                        }
                        3 => {
                            pos += name_len;
                            let width = member_offset_width(size);
                            let off = read_uint(data, pos, width)?;
                            pos += width as usize;
                            off
                        }
                        _ => return Err(FormatError::InvalidDatatypeVersion { class, version }),
                    };
                    let (datatype, used) = Datatype::parse(data.get(pos..).unwrap_or(&[]))?;
                    pos += used;
                    members.push(CompoundMember {
                        name,
                        byte_offset,
                        datatype,
                    });
                }
                Datatype::Compound { size, members }
            }
            8 => {
                let count = u16::from_le_bytes([bf0, bf1]) as usize;
                let (base, used) = Datatype::parse(data.get(pos..).unwrap_or(&[]))?;
                pos += used;
                let mut names = Vec::with_capacity(count);
                for _ in 0..count {
                    let (name, name_len) = read_cstr(data, pos)?;
                    pos += if version >= 3 { name_len } else { pad8(name_len) };
                    names.push(name);
                }
                let width = base.type_size() as usize;
                ensure_len(data, pos, width * count)?;
                let members = names
                    .into_iter()
                    .enumerate()
                    .map(|(i, name)| EnumMember {
                        name,
                        value: data[pos + i * width..pos + (i + 1) * width].to_vec(),
                    })
                    .collect();
                pos += width * count;
                Datatype::Enumeration {
                    size,
                    base_type: Box::new(base),
                    members,
                }
            }
            2 | 4 | 7 | 9 | 10 | 11 => Datatype::Other { class, size },
            _ => return Err(FormatError::InvalidDatatypeClass(class)),
        };
        Ok((dt, pos))
    }

    /// Serialize to datatype message bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, FormatError> {
        let bo = |order: &ByteOrder| u8::from(*order == ByteOrder::BigEndian);
        let buf = match self {
            Datatype::FixedPoint {
                size,
                byte_order,
                signed,
            } => {
                let bf0 = bo(byte_order) | if *signed { 0x08 } else { 0 };
                let mut buf = header(0, 1, [bf0, 0, 0], *size);
                buf.extend_from_slice(&0u16.to_le_bytes());
                buf.extend_from_slice(&((*size * 8) as u16).to_le_bytes());
                buf
            }
            Datatype::FloatingPoint { size, byte_order } => {
                let (exp_loc, exp_size, mant_size, bias) = match size {
                    4 => (23u8, 8u8, 23u8, 127u32),
                    8 => (52, 11, 52, 1023),
                    other => {
                        return Err(FormatError::Unsupported(format!("{other}-byte float")));
                    }
                };
                // Mantissa normalization 2 (implied MSB), sign bit is the top bit.
                let bf0 = 0x20 | bo(byte_order);
                let mut buf = header(1, 1, [bf0, (*size * 8 - 1) as u8, 0], *size);
                buf.extend_from_slice(&0u16.to_le_bytes());
                buf.extend_from_slice(&((*size * 8) as u16).to_le_bytes());
                buf.extend_from_slice(&[exp_loc, exp_size, 0, mant_size]);
                buf.extend_from_slice(&bias.to_le_bytes());
                buf
            }
            Datatype::String {
                size,
                padding,
                charset,
            } => {
                let pad = match padding {
                    StringPadding::NullTerminate => 0,
                    StringPadding::NullPad => 1,
                    StringPadding::SpacePad => 2,
                };
                let cs = match charset {
                    CharacterSet::Ascii => 0,
                    CharacterSet::Utf8 => 1,
                };
                header(3, 1, [pad | (cs << 4), 0, 0], *size)
            }
            Datatype::Opaque { size, tag } => {
                let tag_len = pad8(tag.len() + 1);
                if tag_len > u8::MAX as usize {
                    return Err(FormatError::Unsupported(format!(
                        "opaque tag of {} bytes",
                        tag.len()
                    )));

                }
                let mut buf = header(5, 1, [tag_len as u8, 0, 0], *size);
                let start = buf.len();
                buf.extend_from_slice(tag.as_bytes());
                buf.resize(start + tag_len, 0);
                buf
            }
            Datatype::Compound { size, members } => {
                let count = members.len() as u16;
                let [lo, hi] = count.to_le_bytes();
                let mut buf = header(6, 3, [lo, hi, 0], *size);
                let width = member_offset_width(*size);
                for member in members {
                    buf.extend_from_slice(member.name.as_bytes());
                    buf.push(0);
                    push_uint(&mut buf, member.byte_offset, width);
                    buf.extend_from_slice(&member.datatype.serialize()?);
                }
                buf
            }
            Datatype::Enumeration {
                size,
                base_type,
                members,
            } => {
                let [lo, hi] = (members.len() as u16).to_le_bytes();
                let mut buf = header(8, 3, [lo, hi, 0], *size);
                buf.extend_from_slice(&base_type.serialize()?);
                for member in members {
                    buf.extend_from_slice(member.name.as_bytes());
                    buf.push(0);
                }
                for member in members {
                    buf.extend_from_slice(&member.value);
                }
                buf
            }
            Datatype::Other { class, .. } => {
                return Err(FormatError::Unsupported(format!("writing datatype class {class}")));
            }
        };
        Ok(buf)
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datatype::FixedPoint { size, signed, .. } => {
                write!(f, "{}int{}", if *signed { "" } else { "u" }, size * 8)
            }
            Datatype::FloatingPoint { size, .. } => write!(f, "float{}", size * 8),
            Datatype::String { size, .. } => write!(f, "string({size})"),
            Datatype::Opaque { size, tag } if tag.is_empty() => write!(f, "opaque({size})"),
            Datatype::Opaque { size, tag } => write!(f, "opaque({size}, {tag:?})"),
            dt @ Datatype::Compound { .. } if dt.is_complex() => write!(f, "complex128"),
            Datatype::Compound { members, .. } => write!(f, "compound({} members)", members.len()),
            dt @ Datatype::Enumeration { .. } if dt.is_bool() => write!(f, "bool"),
            Datatype::Enumeration { members, .. } => write!(f, "enum({} members)", members.len()),
            Datatype::Other { class, size } => write!(f, "class{class}({size})"),
        }
    }
}
