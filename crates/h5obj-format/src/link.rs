//! Link info (0x0002) and link (0x0006) messages: compact group storage.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::bytes::{
    ensure_len, push_uint, read_u16, read_uint, undefined_address, UNDEFINED_ADDRESS,
};
use crate::error::FormatError;
use crate::message_type::MessageType;
use crate::object_header::ObjectHeader;

/// Link info message. Only the "no dense storage" form is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    /// Largest creation index, when creation order is tracked.
    pub max_creation_index: Option<u64>,
    /// Fractal heap address for dense link storage.
    pub fractal_heap_address: u64,
    /// Name index B-tree address for dense link storage.
    pub name_btree_address: u64,
}

impl LinkInfo {
    /// A link info message for a group whose links all live in its header.
    pub fn compact() -> LinkInfo {
        LinkInfo {
            max_creation_index: None,
            fractal_heap_address: UNDEFINED_ADDRESS,
            name_btree_address: UNDEFINED_ADDRESS,
        }
    }

    /// Whether the group keeps its links in a fractal heap.
    pub fn is_dense(&self, offset_size: u8) -> bool {
        self.fractal_heap_address != undefined_address(offset_size)
    }

    pub fn parse(data: &[u8], offset_size: u8) -> Result<LinkInfo, FormatError> {
        ensure_len(data, 0, 2)?;
        if data[0] != 0 {
            return Err(FormatError::InvalidLinkVersion(data[0]));
        }
        let flags = data[1];
        let mut pos = 2;
        let max_creation_index = if flags & 0x01 != 0 {
            let v = read_uint(data, pos, 8)?;
            pos += 8;
            Some(v)
        } else {
            None
        };
        let fractal_heap_address = read_uint(data, pos, offset_size)?;
        pos += offset_size as usize;
        let name_btree_address = read_uint(data, pos, offset_size)?;
        Ok(LinkInfo {
            max_creation_index,
            fractal_heap_address,
            name_btree_address,
        })
    }

    pub fn serialize(&self, offset_size: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 + 8 + 2 * offset_size as usize);
        buf.push(0);
        match self.max_creation_index {
            Some(idx) => {
                buf.push(0x01);
                buf.extend_from_slice(&idx.to_le_bytes());
            }
            None => buf.push(0),
        }
        push_uint(&mut buf, self.fractal_heap_address, offset_size);
        push_uint(&mut buf, self.name_btree_address, offset_size);
        buf
    }
}

/// What a link points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Object header address.
    Hard(u64),
    /// Path inside the same file.
    Soft(String),
    /// Link into another file; the payload is kept raw.
    External(Vec<u8>),
}

/// A parsed link message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub target: LinkTarget,
}

impl Link {
    pub fn hard(name: &str, address: u64) -> Link {
        Link {
            name: name.into(),
            target: LinkTarget::Hard(address),
        }
    }

    pub fn parse(data: &[u8], offset_size: u8) -> Result<Link, FormatError> {
        ensure_len(data, 0, 2)?;
        if data[0] != 1 {
            return Err(FormatError::InvalidLinkVersion(data[0]));
        }
        let flags = data[1];
        let name_width = 1u8 << (flags & 0x03);
        let mut pos = 2;

        let link_type = if flags & 0x08 != 0 {
            ensure_len(data, pos, 1)?;
            pos += 1;
            data[pos - 1]
        } else {
            0
        };
        if flags & 0x04 != 0 {
            pos += 8;
        }
        if flags & 0x10 != 0 {
            pos += 1;
        }

        let name_len = read_uint(data, pos, name_width)? as usize;
        pos += name_width as usize;
        ensure_len(data, pos, name_len)?;
        let name = String::from_utf8_lossy(&data[pos..pos + name_len]).into_owned();
        pos += name_len;

        let target = match link_type {
            0 => LinkTarget::Hard(read_uint(data, pos, offset_size)?),
            1 => {
                let len = read_u16(data, pos)? as usize;
                ensure_len(data, pos + 2, len)?;
                let target = &data[pos + 2..pos + 2 + len];
                LinkTarget::Soft(String::from_utf8_lossy(target).into_owned())

            }
            _ => {
                let len = read_u16(data, pos)? as usize;
                ensure_len(data, pos + 2, len)?;
                LinkTarget::External(data[pos + 2..pos + 2 + len].to_vec())
            }
        };
        Ok(Link { name, target })
    }

    /// Serialize as a version-1 link message with a UTF-8 name.
    pub fn serialize(&self, offset_size: u8) -> Vec<u8> {
        let name = self.name.as_bytes();
        let (width_bits, width) = match name.len() {
            0..=0xFF => (0u8, 1u8),
            0x100..=0xFFFF => (1, 2),
            _ => (2, 4),
        };
        let mut flags = width_bits | 0x10;
        let link_type = match self.target {
            LinkTarget::Hard(_) => None,
            LinkTarget::Soft(_) => Some(1u8),
            LinkTarget::External(_) => Some(64u8),
        };
        if link_type.is_some() {
            flags |= 0x08;
        }

        let mut buf = Vec::with_capacity(4 + name.len() + offset_size as usize + 4);
        buf.push(1);
        buf.push(flags);
        if let Some(t) = link_type {
            buf.push(t);
        }
        buf.push(1);
        push_uint(&mut buf, name.len() as u64, width);
        buf.extend_from_slice(name);
        match &self.target {
            LinkTarget::Hard(addr) => push_uint(&mut buf, *addr, offset_size),
            LinkTarget::Soft(path) => {
                buf.extend_from_slice(&(path.len() as u16).to_le_bytes());
                buf.extend_from_slice(path.as_bytes());
            }
            LinkTarget::External(raw) => {
                buf.extend_from_slice(&(raw.len() as u16).to_le_bytes());
                buf.extend_from_slice(raw);
            }
        }
        buf
    }
}

/// Collect the links stored directly in a group's object header.
///
/// Groups using dense storage or the old symbol-table layout are rejected.
pub fn collect_links(header: &ObjectHeader, offset_size: u8) -> Result<Vec<Link>, FormatError> {
    if header.has(MessageType::SymbolTable) {
        return Err(FormatError::Unsupported("symbol-table group".into()));
    }
    if let Some(msg) = header.find(MessageType::LinkInfo) {
        if LinkInfo::parse(&msg.data, offset_size)?.is_dense(offset_size) {
            return Err(FormatError::Unsupported("dense link storage".into()));
        }
    }
    header
        .find_all(MessageType::Link)
        .map(|msg| Link::parse(&msg.data, offset_size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_header::HeaderMessage;

    #[test]
    fn link_info_compact_roundtrip() {
        let info = LinkInfo::compact();
        let bytes = info.serialize(8);
        assert_eq!(bytes.len(), 18);
        let back = LinkInfo::parse(&bytes, 8).unwrap();
        assert_eq!(back, info);
        assert!(!back.is_dense(8));
    }

    #[test]
    fn link_info_small_offsets() {
        let info = LinkInfo::compact();
        let bytes = info.serialize(4);
        let back = LinkInfo::parse(&bytes, 4).unwrap();
        assert!(!back.is_dense(4));
    }

    #[test]
    fn hard_link_roundtrip() {
        let link = Link::hard("temperature", 0x1234);
        let back = Link::parse(&link.serialize(8), 8).unwrap();
        assert_eq!(back, link);
    }

    #[test]
    fn soft_link_roundtrip() {
        let link = Link {
            name: "alias".into(),
            target: LinkTarget::Soft("/data/x".into()),
        };
        assert_eq!(Link::parse(&link.serialize(8), 8).unwrap(), link);
    }

    #[test]
    fn long_name_uses_wider_length_field() {
        let name = "n".repeat(300);
        let link = Link::hard(&name, 96);
        let bytes = link.serialize(8);
        assert_eq!(bytes[1] & 0x03, 1);
        assert_eq!(Link::parse(&bytes, 8).unwrap().name, name);
    }

    #[test]
    fn bad_version() {
        assert_eq!(
            Link::parse(&[2, 0, 0], 8),
            Err(FormatError::InvalidLinkVersion(2))
        );
    }

    #[test]
    fn collect_from_header() {
        let header = ObjectHeader {
            version: 2,
            messages: vec![
                HeaderMessage {
                    msg_type: MessageType::LinkInfo,
                    flags: 0,
                    data: LinkInfo::compact().serialize(8),
                },
                HeaderMessage {
                    msg_type: MessageType::Link,
                    flags: 0,
                    data: Link::hard("a", 100).serialize(8),
                },
                HeaderMessage {
                    msg_type: MessageType::Link,
                    flags: 0,
                    data: Link::hard("b", 200).serialize(8),
                },
            ],
        };
        let links = collect_links(&header, 8).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].target, LinkTarget::Hard(200));
    }

    #[test]
    fn symbol_table_groups_rejected() {
        let header = ObjectHeader {
            version: 1,
            messages: vec![HeaderMessage {
                msg_type: MessageType::SymbolTable,
                flags: 0,
                data: vec![0; 16],
            }],
        };
        assert!(matches!(
            collect_links(&header, 8),
            Err(FormatError::Unsupported(_))
        ));
    }
}
