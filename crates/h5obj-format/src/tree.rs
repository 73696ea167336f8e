//! In-memory image of an HDF5 object tree, as read from or written to bytes.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::attribute::Attribute;
use crate::dataspace::Dataspace;
use crate::datatype::Datatype;

/// A dataset: element type, shape, raw little-endian element bytes and
/// attributes. An empty `shape` is a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetNode {
    pub datatype: Datatype,
    pub shape: Vec<u64>,
    pub raw: Vec<u8>,
    pub attrs: Vec<Attribute>,
}

impl DatasetNode {
    pub fn dataspace(&self) -> Dataspace {
        Dataspace::from_shape(&self.shape)
    }
}

/// A group: attributes plus named children in link order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupNode {
    pub attrs: Vec<Attribute>,
    pub children: Vec<(String, Node)>,
}

/// Either kind of object.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(GroupNode),
    Dataset(DatasetNode),
}

impl GroupNode {
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|(n, _)| n == name).map(|(_, node)| node)
    }
}
