//! HDF5 object header parsing (v1 and v2).

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::bytes::{ensure_len, read_u16, read_u32, read_uint};
use crate::checksum::jenkins_lookup3;
use crate::error::FormatError;
use crate::message_type::MessageType;

/// OHDR signature for v2 object headers.
pub(crate) const OHDR_SIGNATURE: [u8; 4] = *b"OHDR";

/// OCHK signature for v2 continuation chunks.
const OCHK_SIGNATURE: [u8; 4] = *b"OCHK";

/// Message flag bit: the reader must understand this message.
const FLAG_MUST_UNDERSTAND: u8 = 0x08;

/// A single parsed header message.
#[derive(Debug, Clone)]
pub struct HeaderMessage {
    /// The message type.
    pub msg_type: MessageType,
    /// Message flags byte.
    pub flags: u8,
    /// Raw message data bytes.
    pub data: Vec<u8>,
}

/// Parsed HDF5 object header: every non-NIL message from every chunk.
#[derive(Debug, Clone)]
pub struct ObjectHeader {
    /// Header version (1 or 2).
    pub version: u8,
    /// Messages in on-disk order, continuation chunks appended.
    pub messages: Vec<HeaderMessage>,
}

/// Where a continuation message says the next chunk lives.
struct Continuation {
    offset: usize,
    length: usize,
}

impl ObjectHeader {
    /// Parse an object header at `offset`.
    ///
    /// `offset_size` and `length_size` come from the superblock.
    pub fn parse(
        data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<ObjectHeader, FormatError> {
        ensure_len(data, offset, 4)?;
        let mut header = ObjectHeader {
            version: 0,
            messages: Vec::new(),
        };
        let mut pending = Vec::new();
        let has_creation_order;
        if data[offset..offset + 4] == OHDR_SIGNATURE {
            header.version = 2;
            let (start, end, creation_order) = Self::v2_prefix(data, offset)?;
            has_creation_order = creation_order;
            header.collect(
                data,
                start,
                end,
                Layout::V2 { has_creation_order },
                offset_size,
                length_size,
                &mut pending,
            )?;
        } else {
            header.version = 1;
            has_creation_order = false;
            let (start, end) = Self::v1_prefix(data, offset)?;
            header.collect(data, start, end, Layout::V1, offset_size, length_size, &mut pending)?;
        }

        while let Some(cont) = pending.pop() {
            ensure_len(data, cont.offset, cont.length)?;
            if header.version == 1 {
                header.collect(
                    data,
                    cont.offset,
                    cont.offset + cont.length,
                    Layout::V1,
                    offset_size,
                    length_size,
                    &mut pending,
                )?;
            } else {
                if cont.length < 8 || data[cont.offset..cont.offset + 4] != OCHK_SIGNATURE {
                    return Err(FormatError::Unsupported("malformed OCHK continuation".into()));
                }
                let checksum_pos = cont.offset + cont.length - 4;
                verify_checksum(data, cont.offset, checksum_pos)?;
                header.collect(
                    data,
                    cont.offset + 4,
                    checksum_pos,
                    Layout::V2 { has_creation_order },
                    offset_size,
                    length_size,
                    &mut pending,
                )?;
            }
        }
        Ok(header)
    }

    /// v1 prefix: version, reserved, message count, reference count, header
    /// size, then padding to 16 bytes.
    fn v1_prefix(data: &[u8], offset: usize) -> Result<(usize, usize), FormatError> {
        ensure_len(data, offset, 16)?;
        let version = data[offset];
        if version != 1 {
            return Err(FormatError::InvalidObjectHeaderVersion(version));
        }
        let size = read_u32(data, offset + 8)? as usize;
        let start = offset + 16;
        ensure_len(data, start, size)?;
        Ok((start, start + size))
    }

    /// v2 prefix: signature, version, flags, optional times and attribute
    /// thresholds, then the chunk-0 size field.
    fn v2_prefix(data: &[u8], offset: usize) -> Result<(usize, usize, bool), FormatError> {
        ensure_len(data, offset, 6)?;
        let version = data[offset + 4];
        if version != 2 {
            return Err(FormatError::InvalidObjectHeaderVersion(version));
        }
        let flags = data[offset + 5];
        let mut pos = offset + 6;
        if flags & 0x20 != 0 {
            pos += 16; // access, modification, change, birth times
        }
        if flags & 0x10 != 0 {
            pos += 4; // max compact / min dense attribute counts
        }
        let width = 1u8 << (flags & 0x03);
        let chunk0 = read_uint(data, pos, width)? as usize;
        pos += width as usize;
        let end = pos + chunk0;
        ensure_len(data, end, 4)?;
        verify_checksum(data, offset, end)?;
        Ok((pos, end, flags & 0x04 != 0))
    }

    #[allow(clippy::too_many_arguments)]
    fn collect(
        &mut self,
        data: &[u8],
        start: usize,
        end: usize,
        layout: Layout,
        offset_size: u8,
        length_size: u8,
        pending: &mut Vec<Continuation>,
    ) -> Result<(), FormatError> {
        let prefix = layout.message_prefix();
        let mut pos = start;
        while pos + prefix <= end {
            let (raw_type, size, flags) = match layout {
                Layout::V1 => (
                    read_u16(data, pos)?,
                    read_u16(data, pos + 2)? as usize,
                    data[pos + 4],
                ),
                Layout::V2 { .. } => (
                    data[pos] as u16,
                    read_u16(data, pos + 1)? as usize,
                    data[pos + 3],
                ),
            };
            pos += prefix;
            if pos + size > end {
                // Trailing gap smaller than a message.
                break;
            }
            let msg_type = MessageType::from_u16(raw_type);
            let body = &data[pos..pos + size];
            pos += size;

            match msg_type {
                MessageType::Unknown(id) if flags & FLAG_MUST_UNDERSTAND != 0 => {
                    return Err(FormatError::UnsupportedMessage(id));
                }
                MessageType::Nil => {}
                MessageType::ObjectHeaderContinuation => {
                    let offset = read_uint(body, 0, offset_size)? as usize;
                    let length = read_uint(body, offset_size as usize, length_size)? as usize;
                    pending.push(Continuation { offset, length });
                }
                _ => self.messages.push(HeaderMessage {
                    msg_type,
                    flags,
                    data: body.to_vec(),
                }),
            }
        }
        Ok(())
    }

    /// First message of the given type.
    pub fn find(&self, msg_type: MessageType) -> Option<&HeaderMessage> {
        self.messages.iter().find(|m| m.msg_type == msg_type)
    }

    /// All messages of the given type, in order.
    pub fn find_all(&self, msg_type: MessageType) -> impl Iterator<Item = &HeaderMessage> {
        self.messages.iter().filter(move |m| m.msg_type == msg_type)
    }

    /// Whether the header carries a message of the given type.
    pub fn has(&self, msg_type: MessageType) -> bool {
        self.find(msg_type).is_some()
    }
}

#[derive(Clone, Copy)]
enum Layout {
    V1,
    V2 { has_creation_order: bool },
}

impl Layout {
    fn message_prefix(self) -> usize {
        match self {
            // type(2) size(2) flags(1) reserved(3)
            Layout::V1 => 8,
            // type(1) size(2) flags(1) [creation order(2)]
            Layout::V2 { has_creation_order: true } => 6,
            Layout::V2 { has_creation_order: false } => 4,
        }
    }
}

fn verify_checksum(data: &[u8], start: usize, checksum_pos: usize) -> Result<(), FormatError> {
    let stored = read_u32(data, checksum_pos)?;
    let computed = jenkins_lookup3(&data[start..checksum_pos]);
    if stored != computed {
        return Err(FormatError::ChecksumMismatch {
            expected: stored,
            computed,
        });
    }
    Ok(())
}
