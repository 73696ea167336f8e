//! Whole-file parsing into a [`GroupNode`] tree.

#[cfg(not(feature = "std"))]
use alloc::{format, vec::Vec};

use crate::attribute::collect_attributes;
use crate::data_layout::DataLayout;
use crate::data_read::read_raw;
use crate::dataspace::{Dataspace, DataspaceType};
use crate::datatype::Datatype;
use crate::error::FormatError;
use crate::link::{collect_links, LinkTarget};
use crate::message_type::MessageType;
use crate::object_header::ObjectHeader;
use crate::signature::find_signature;
use crate::superblock::Superblock;
use crate::tree::{DatasetNode, GroupNode, Node};

struct Reader<'a> {
    data: &'a [u8],
    offset_size: u8,
    length_size: u8,
    /// Object headers on the path from the root, for cycle detection.
    path: Vec<u64>,
}

impl Reader<'_> {
    fn header(&self, addr: u64) -> Result<ObjectHeader, FormatError> {
        ObjectHeader::parse(self.data, addr as usize, self.offset_size, self.length_size)
    }

    fn group(&mut self, addr: u64, header: &ObjectHeader) -> Result<GroupNode, FormatError> {
        self.path.push(addr);
        let mut node = GroupNode {
            attrs: collect_attributes(header, self.offset_size, self.length_size)?,
            children: Vec::new(),
        };
        for link in collect_links(header, self.offset_size)? {
            // Soft and external links have no object of their own here.
            let LinkTarget::Hard(child) = link.target else {
                continue;
            };
            if self.path.contains(&child) {
                return Err(FormatError::Unsupported(format!(
                    "hard link cycle at {:?}",
                    link.name
                )));
            }
            let child_header = self.header(child)?;
            let child_node = if child_header.has(MessageType::Datatype) {
                Node::Dataset(self.dataset(&child_header)?)
            } else {
                Node::Group(self.group(child, &child_header)?)
            };
            node.children.push((link.name, child_node));
        }
        node.children.sort_by(|a, b| a.0.cmp(&b.0));
        self.path.pop();
        Ok(node)
    }

    fn dataset(&self, header: &ObjectHeader) -> Result<DatasetNode, FormatError> {
        if header.has(MessageType::FilterPipeline) {
            return Err(FormatError::Unsupported("filtered dataset".into()));
        }
        let dt_msg = header
            .find(MessageType::Datatype)
            .ok_or(FormatError::MissingMessage("datatype"))?;
        let (datatype, _) = Datatype::parse(&dt_msg.data)?;
        let dataspace = match header.find(MessageType::Dataspace) {
            Some(msg) => Dataspace::parse(&msg.data, self.length_size)?,
            None => Dataspace::scalar(),
        };
        let layout_msg = header
            .find(MessageType::DataLayout)
            .ok_or(FormatError::MissingMessage("data layout"))?;
        let layout = DataLayout::parse(&layout_msg.data, self.offset_size, self.length_size)?;

        let mut raw = read_raw(self.data, &layout, &dataspace, &datatype)?;
        raw.truncate(dataspace.num_elements() as usize * datatype.type_size() as usize);
        let shape = match dataspace.space_type {
            DataspaceType::Simple => dataspace.dimensions.clone(),
            DataspaceType::Scalar => Vec::new(),
            DataspaceType::Null => {
                return Err(FormatError::Unsupported("null dataspace".into()));
            }
        };
        Ok(DatasetNode {
            datatype,
            shape,
            raw,
            attrs: collect_attributes(header, self.offset_size, self.length_size)?,
        })
    }
}

/// Parse a complete file image. Children come back sorted by name.
pub fn read_file(data: &[u8]) -> Result<GroupNode, FormatError> {
    let sig = find_signature(data)?;
    let sb = Superblock::parse(data, sig)?;
    let base = if sb.version >= 2 { sb.base_address } else { sig as u64 };
    let data = data.get(base as usize..).unwrap_or(&[]);
    let mut reader = Reader {
        data,
        offset_size: sb.offset_size,
        length_size: sb.length_size,
        path: Vec::new(),
    };
    let header = reader.header(sb.root_group_address)?;
    reader.group(sb.root_group_address, &header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_writer::write_file;

    #[test]
    fn not_hdf5() {
        assert_eq!(read_file(b"plain text"), Err(FormatError::SignatureNotFound));
    }

    #[test]
    fn truncated_file() {
        let mut root = GroupNode::default();
        root.children.push(("g".into(), Node::Group(GroupNode::default())));
        let bytes = write_file(&root).unwrap();
        assert!(read_file(&bytes[..60]).is_err());
    }

    #[test]
    fn children_sorted() {
        let mut root = GroupNode::default();
        for name in ["b", "a", "c"] {
            root.children.push((name.into(), Node::Group(GroupNode::default())));
        }
        let back = read_file(&write_file(&root).unwrap()).unwrap();
        let names: Vec<_> = back.children.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
