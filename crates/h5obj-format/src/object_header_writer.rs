//! Object header writer for the v2 format.

#[cfg(not(feature = "std"))]
use alloc::{format, vec::Vec};

use crate::bytes::push_uint;
use crate::checksum::jenkins_lookup3;
use crate::error::FormatError;
use crate::message_type::MessageType;
use crate::object_header::OHDR_SIGNATURE;

/// Message flag bit: the message is constant once written.
pub const MSG_FLAG_CONSTANT: u8 = 0x01;

/// Accumulates messages and serializes a single-chunk v2 object header.
#[derive(Debug, Default)]
pub struct ObjectHeaderWriter {
    messages: Vec<(MessageType, Vec<u8>, u8)>,
}

impl ObjectHeaderWriter {
    /// Create a new empty object header writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message with default flags (0).
    pub fn add_message(&mut self, msg_type: MessageType, data: Vec<u8>) {
        self.add_message_with_flags(msg_type, data, 0);
    }

    /// Add a message with specific flags.
    pub fn add_message_with_flags(&mut self, msg_type: MessageType, data: Vec<u8>, flags: u8) {
        self.messages.push((msg_type, data, flags));
    }

    /// Size of the serialized header in bytes.
    pub fn serialized_size(&self) -> usize {
        let body = self.body_size();
        4 + 1 + 1 + chunk_width(body) as usize + body + 4
    }

    fn body_size(&self) -> usize {
        self.messages.iter().map(|(_, data, _)| 4 + data.len()).sum()
    }

    /// Serialize the header: OHDR, version, flags, chunk size, messages,
    /// checksum.
    pub fn serialize(&self) -> Result<Vec<u8>, FormatError> {
        let body = self.body_size();
        let width = chunk_width(body);
        let mut buf = Vec::with_capacity(self.serialized_size());
        buf.extend_from_slice(&OHDR_SIGNATURE);
        buf.push(2);
        buf.push(width.trailing_zeros() as u8);
        push_uint(&mut buf, body as u64, width);
        for (msg_type, data, flags) in &self.messages {
            let size = u16::try_from(data.len()).map_err(|_| {
                FormatError::Unsupported(format!(
                    "{msg_type:?} message of {} bytes exceeds 64 KiB",
                    data.len()
                ))
            })?;
            buf.push(msg_type.to_u16() as u8);
            buf.extend_from_slice(&size.to_le_bytes());
            buf.push(*flags);
            buf.extend_from_slice(data);
        }
        let checksum = jenkins_lookup3(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        Ok(buf)
    }
}

/// Width of the chunk-0 size field; the flags byte stores its log2.
fn chunk_width(body: usize) -> u8 {
    if body <= 0xFF {
        1
    } else if body <= 0xFFFF {
        2
    } else {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_header::ObjectHeader;

    #[test]
    fn empty_header_roundtrip() {
        let bytes = ObjectHeaderWriter::new().serialize().unwrap();
        let hdr = ObjectHeader::parse(&bytes, 0, 8, 8).unwrap();
        assert_eq!(hdr.version, 2);
        assert!(hdr.messages.is_empty());
    }

    #[test]
    fn messages_roundtrip_and_size_is_exact() {
        let mut writer = ObjectHeaderWriter::new();
        writer.add_message(MessageType::Dataspace, vec![1, 2, 3, 4]);
        writer.add_message_with_flags(MessageType::Datatype, vec![0xAA; 300], MSG_FLAG_CONSTANT);
        let bytes = writer.serialize().unwrap();
        assert_eq!(bytes.len(), writer.serialized_size());

        let hdr = ObjectHeader::parse(&bytes, 0, 8, 8).unwrap();
        assert_eq!(hdr.messages.len(), 2);
        assert_eq!(hdr.messages[0].data, vec![1, 2, 3, 4]);
        assert_eq!(hdr.messages[1].flags, MSG_FLAG_CONSTANT);
        assert_eq!(hdr.messages[1].data.len(), 300);
    }

    #[test]
    fn oversized_message_rejected() {
        let mut writer = ObjectHeaderWriter::new();
        writer.add_message(MessageType::Attribute, vec![0; 70_000]);
        assert!(matches!(writer.serialize(), Err(FormatError::Unsupported(_))));
    }
}
