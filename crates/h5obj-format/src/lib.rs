//! Pure-Rust parsing and writing of the HDF5 structures h5obj stores.
//!
//! The supported subset is what [`file_writer`] produces: a version 3
//! superblock, version 2 object headers, compact link storage, contiguous
//! or compact datasets and inline attributes. Version 0/1 superblocks and
//! version 1 object headers are parsed as well, so foreign files using
//! compact groups can be read. `no_std` builds need the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod attribute;
pub mod bytes;
pub mod checksum;
pub mod data_layout;
pub mod data_read;
pub mod dataspace;
pub mod datatype;
pub mod error;
pub mod file_reader;
pub mod file_writer;
pub mod link;
pub mod message_type;
pub mod object_header;
pub mod object_header_writer;
pub mod signature;
pub mod superblock;
pub mod tree;

pub use attribute::Attribute;
pub use dataspace::Dataspace;
pub use datatype::Datatype;
pub use error::FormatError;
pub use file_reader::read_file;
pub use file_writer::write_file;
pub use tree::{DatasetNode, GroupNode, Node};
