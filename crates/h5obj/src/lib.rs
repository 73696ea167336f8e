//! Persist nested values in HDF5 files and get the exact types back.
//!
//! Every stored node is tagged with the name of the type it came from
//! (`__DTYPE__`), so lists stay lists, tuples stay tuples and dict keys keep
//! their types. Values the file cannot hold natively are pickled.
//!
//! ```no_run
//! use h5obj::{ObjFile, Value};
//! use h5obj_store::Mode;
//!
//! let mut f = ObjFile::open("run.h5", Mode::Append)?;
//! let params = h5obj::literal::parse("{'steps': 100, 'labels': ('a', 'b'), 'seed': None}")?;
//! f.set_item("params", &params)?;
//! assert_eq!(f.get_item("params")?, params);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cofunc;
pub mod decode;
pub mod encode;
pub mod error;
pub mod file;
pub mod kind;
pub mod literal;
pub mod meta;
mod native;
pub mod options;
pub mod pickle;
pub mod sparse;
pub mod tag;
pub mod value;

pub use cofunc::{CoFunc, CoFunc2d};
pub use decode::{decode, decode_node};
pub use encode::encode;
pub use error::{Error, Result};
pub use file::{ObjFile, ObjGroup, ObjGroupMut};
pub use kind::Kind;
pub use meta::Metadata;
pub use options::{Options, Profile};
pub use sparse::{SparseFormat, SparseMatrix};
pub use tag::Tag;
pub use value::{NdArray, Object, Value};
