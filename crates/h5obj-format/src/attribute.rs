//! Attribute message (type 0x000C).

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::bytes::{ensure_len, pad8, read_u16, read_uint, undefined_address};
use crate::dataspace::Dataspace;
use crate::datatype::Datatype;
use crate::error::FormatError;
use crate::message_type::MessageType;
use crate::object_header::ObjectHeader;

/// A parsed attribute: name, type, shape and raw value bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub datatype: Datatype,
    pub dataspace: Dataspace,
    pub raw_data: Vec<u8>,
}

impl Attribute {
    /// Parse versions 1 to 3. Version 1 pads every field to 8 bytes.
    pub fn parse(data: &[u8], length_size: u8) -> Result<Attribute, FormatError> {
        ensure_len(data, 0, 8)?;
        let version = data[0];
        if !(1..=3).contains(&version) {
            return Err(FormatError::InvalidAttributeVersion(version));
        }
        let name_size = read_u16(data, 2)? as usize;
        let datatype_size = read_u16(data, 4)? as usize;
        let dataspace_size = read_u16(data, 6)? as usize;
        let padded = |n: usize| if version == 1 { pad8(n) } else { n };

        let mut pos = if version == 3 { 9 } else { 8 };

        ensure_len(data, pos, name_size)?;
        let name_bytes = &data[pos..pos + name_size];
        let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_size);
        let name = String::from_utf8_lossy(&name_bytes[..end]).into_owned();
        pos += padded(name_size);

        ensure_len(data, pos, datatype_size)?;
        let (datatype, _) = Datatype::parse(&data[pos..pos + datatype_size])?;
        pos += padded(datatype_size);

        ensure_len(data, pos, dataspace_size)?;
        let dataspace = Dataspace::parse(&data[pos..pos + dataspace_size], length_size)?;
        pos += padded(dataspace_size);

        let value_size = dataspace.num_elements() as usize * datatype.type_size() as usize;
        ensure_len(data, pos, value_size)?;
        let raw_data = data[pos..pos + value_size].to_vec();

        Ok(Attribute {
            name,
            datatype,
            dataspace,
            raw_data,
        })
    }

    /// Serialize as a version 3 message with a UTF-8 name.
    pub fn serialize(&self, length_size: u8) -> Result<Vec<u8>, FormatError> {
        let mut name = self.name.as_bytes().to_vec();
        name.push(0);
        let dt = self.datatype.serialize()?;
        let ds = self.dataspace.serialize(length_size);
        let field = |n: usize| {
            u16::try_from(n)
                .map_err(|_| FormatError::Unsupported("attribute field over 64 KiB".into()))
        };

        let mut buf =
            Vec::with_capacity(9 + name.len() + dt.len() + ds.len() + self.raw_data.len());

        buf.push(3);
        buf.push(0);
        buf.extend_from_slice(&field(name.len())?.to_le_bytes());
        buf.extend_from_slice(&field(dt.len())?.to_le_bytes());
        buf.extend_from_slice(&field(ds.len())?.to_le_bytes());
        buf.push(1);
        buf.extend_from_slice(&name);
        buf.extend_from_slice(&dt);
        buf.extend_from_slice(&ds);
        buf.extend_from_slice(&self.raw_data);
        Ok(buf)
    }
}

/// All attributes stored in an object header, in header order.
///
/// Attributes kept in dense storage are not supported.
pub fn collect_attributes(
    header: &ObjectHeader,
    offset_size: u8,
    length_size: u8,
) -> Result<Vec<Attribute>, FormatError> {
    if let Some(info) = header.find(MessageType::AttributeInfo) {
        let data = &info.data;
        ensure_len(data, 0, 2)?;
        let pos = if data[1] & 0x01 != 0 { 4 } else { 2 };
        let heap = read_uint(data, pos, offset_size)?;
        if heap != undefined_address(offset_size) {
            return Err(FormatError::Unsupported("dense attribute storage".into()));
        }
    }
    header
        .find_all(MessageType::Attribute)
        .map(|msg| Attribute::parse(&msg.data, length_size))
        .collect()
}
