//! A mutable HDF5 file/group/dataset tree.
//!
//! [`File`] loads the whole object tree through `h5obj-format` on open;
//! every change happens in memory and is written back on flush, close or
//! drop.
//!
//! ```no_run
//! use h5obj_store::{Data, File, Mode};
//!
//! let mut file = File::open("data.h5", Mode::Append)?;
//! let root = file.root_mut()?;
//! root.create_dataset("sensors/temperature", Data::from(vec![22.5, 23.1]))?;
//! root.group_mut("sensors")?.attrs_mut().set("unit", "C");
//! file.close()?;
//! # Ok::<(), h5obj_store::StoreError>(())
//! ```

pub mod attrs;
mod convert;
pub mod data;
pub mod error;
pub mod file;
pub mod mode;
pub mod node;

pub use attrs::{AttrValue, Attrs};
pub use data::{DType, Data, Elements};
pub use error::{Result, StoreError};
pub use file::File;
pub use mode::Mode;
pub use node::{Dataset, Group, Node};
