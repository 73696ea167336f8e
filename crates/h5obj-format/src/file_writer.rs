//! Whole-file serialization of a [`GroupNode`] tree.
//!
//! Layout: v3 superblock, then every object header in pre-order, then the
//! contiguous data of every dataset in the same order. Header sizes do not
//! depend on addresses (all offsets are 8 bytes wide), so one sizing pass
//! fixes every address before the real headers are built.

#[cfg(not(feature = "std"))]
use alloc::{format, vec::Vec};

use crate::data_layout::DataLayout;
use crate::error::FormatError;
use crate::link::{Link, LinkInfo};
use crate::message_type::MessageType;
use crate::object_header_writer::{ObjectHeaderWriter, MSG_FLAG_CONSTANT};
use crate::superblock::{Superblock, SUPERBLOCK_V3_SIZE};
use crate::tree::{DatasetNode, GroupNode, Node};

const OFFSET_SIZE: u8 = 8;
const LENGTH_SIZE: u8 = 8;

/// Fill value message v3: allocation late, write if defined, none defined.
const FILL_VALUE_V3: [u8; 2] = [3, 0x0a];

enum Flat<'a> {
    Group {
        node: &'a GroupNode,
        children: Vec<(&'a str, usize)>,
    },
    Dataset(&'a DatasetNode),
}

fn flatten<'a>(group: &'a GroupNode, out: &mut Vec<Flat<'a>>) -> usize {
    let idx = out.len();
    out.push(Flat::Group {
        node: group,
        children: Vec::new(),
    });
    let mut links = Vec::with_capacity(group.children.len());
    for (name, child) in &group.children {
        let child_idx = match child {
            Node::Group(g) => flatten(g, out),
            Node::Dataset(d) => {
                out.push(Flat::Dataset(d));
                out.len() - 1
            }
        };
        links.push((name.as_str(), child_idx));
    }
    if let Flat::Group { children, .. } = &mut out[idx] {
        *children = links;
    }
    idx
}

fn group_header(
    node: &GroupNode,
    children: &[(&str, usize)],
    oh_addrs: &[u64],
) -> Result<Vec<u8>, FormatError> {
    let mut w = ObjectHeaderWriter::new();
    w.add_message(MessageType::LinkInfo, LinkInfo::compact().serialize(OFFSET_SIZE));
    for (name, idx) in children {
        let addr = oh_addrs.get(*idx).copied().unwrap_or(0);
        w.add_message(MessageType::Link, Link::hard(name, addr).serialize(OFFSET_SIZE));
    }
    for attr in &node.attrs {
        w.add_message(MessageType::Attribute, attr.serialize(LENGTH_SIZE)?);
    }
    w.serialize()
}

fn dataset_header(node: &DatasetNode, data_addr: u64) -> Result<Vec<u8>, FormatError> {
    let expected = node.dataspace().num_elements() * node.datatype.type_size() as u64;
    if node.raw.len() as u64 != expected {
        return Err(FormatError::DataSizeMismatch {
            expected: expected as usize,
            actual: node.raw.len(),
        });
    }
    let layout = DataLayout::contiguous(data_addr, node.raw.len() as u64);

    let mut w = ObjectHeaderWriter::new();
    w.add_message_with_flags(MessageType::Datatype, node.datatype.serialize()?, MSG_FLAG_CONSTANT);
    w.add_message(MessageType::Dataspace, node.dataspace().serialize(LENGTH_SIZE));
    w.add_message_with_flags(MessageType::FillValue, FILL_VALUE_V3.to_vec(), MSG_FLAG_CONSTANT);
    w.add_message(MessageType::DataLayout, layout.serialize(OFFSET_SIZE, LENGTH_SIZE)?);
    for attr in &node.attrs {
        w.add_message(MessageType::Attribute, attr.serialize(LENGTH_SIZE)?);
    }
    w.serialize()
}

fn header_bytes(flat: &Flat<'_>, oh_addrs: &[u64], data_addr: u64) -> Result<Vec<u8>, FormatError> {
    match flat {
        Flat::Group { node, children } => group_header(node, children, oh_addrs),
        Flat::Dataset(d) => dataset_header(d, data_addr),
    }
}

/// Serialize `root` as a complete HDF5 file image.
pub fn write_file(root: &GroupNode) -> Result<Vec<u8>, FormatError> {
    let mut flat = Vec::new();
    flatten(root, &mut flat);

    // Pass 1: sizes.
    let sizes = flat
        .iter()
        .map(|f| header_bytes(f, &[], 0).map(|b| b.len()))
        .collect::<Result<Vec<_>, _>>()?;

    // Addresses: headers first, then data.
    let mut cursor = SUPERBLOCK_V3_SIZE as u64;
    let oh_addrs: Vec<u64> = sizes
        .iter()
        .map(|&sz| {
            let addr = cursor;
            cursor += sz as u64;
            addr
        })
        .collect();
    let data_addrs: Vec<u64> = flat
        .iter()
        .map(|f| {
            let addr = cursor;
            if let Flat::Dataset(d) = f {
                cursor += d.raw.len() as u64;
            }
            addr
        })
        .collect();
    let eof = cursor;

    // Pass 2: real bytes.
    let mut out = Vec::with_capacity(eof as usize);
    out.extend_from_slice(&Superblock::v3(eof, oh_addrs[0]).serialize());
    for (i, f) in flat.iter().enumerate() {
        let bytes = header_bytes(f, &oh_addrs, data_addrs[i])?;
        if bytes.len() != sizes[i] {
            return Err(FormatError::Unsupported(format!(
                "object header {i} changed size between passes"
            )));
        }
        out.extend_from_slice(&bytes);
    }
    for f in &flat {
        if let Flat::Dataset(d) = f {
            out.extend_from_slice(&d.raw);
        }
    }
    debug_assert_eq!(out.len() as u64, eof);
    Ok(out)
}

/// A file holding only an empty root group.
pub fn empty_file() -> Result<Vec<u8>, FormatError> {
    write_file(&GroupNode::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::dataspace::Dataspace;
    use crate::datatype::Datatype;
    use crate::file_reader::read_file;

    fn f64_dataset(values: &[f64]) -> DatasetNode {
        DatasetNode {
            datatype: Datatype::float(8),
            shape: vec![values.len() as u64],
            raw: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            attrs: vec![],
        }
    }

    #[test]
    fn empty_root() {
        let bytes = empty_file().unwrap();
        let root = read_file(&bytes).unwrap();
        assert!(root.children.is_empty());
        assert!(root.attrs.is_empty());
    }

    #[test]
    fn superblock_points_at_root() {
        let bytes = empty_file().unwrap();
        let sb = Superblock::parse(&bytes, 0).unwrap();
        assert_eq!(sb.root_group_address, SUPERBLOCK_V3_SIZE as u64);
        assert_eq!(sb.eof_address, bytes.len() as u64);
    }

    #[test]
    fn nested_groups_roundtrip() {
        let mut inner = GroupNode::default();
        inner.children.push(("x".into(), Node::Dataset(f64_dataset(&[1.0, 2.0]))));
        inner.attrs.push(Attribute {
            name: "__DTYPE__".into(),
            datatype: Datatype::fixed_string(4),
            dataspace: Dataspace::scalar(),
            raw_data: b"dict".to_vec(),
        });
        let mut middle = GroupNode::default();
        middle.children.push(("inner".into(), Node::Group(inner)));
        let mut root = GroupNode::default();
        root.children.push(("middle".into(), Node::Group(middle)));
        root.children.push(("y".into(), Node::Dataset(f64_dataset(&[3.0]))));

        let back = read_file(&write_file(&root).unwrap()).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn empty_dataset_has_no_data() {
        let mut root = GroupNode::default();
        root.children.push(("e".into(), Node::Dataset(f64_dataset(&[]))));
        let back = read_file(&write_file(&root).unwrap()).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn raw_size_checked() {
        let mut ds = f64_dataset(&[1.0]);
        ds.raw.pop();
        let mut root = GroupNode::default();
        root.children.push(("bad".into(), Node::Dataset(ds)));
        assert!(matches!(
            write_file(&root),
            Err(FormatError::DataSizeMismatch { .. })
        ));
    }
}
