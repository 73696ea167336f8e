//! File handles.

use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::{group_from_format, group_to_format};
use crate::error::{Result, StoreError};
use crate::mode::Mode;
use crate::node::Group;

/// An open HDF5 file, held in memory as a [`Group`] tree.
///
/// Changes are written back by [`flush`](File::flush), by
/// [`close`](File::close), or on drop.
#[derive(Debug)]
pub struct File {
    path: PathBuf,
    mode: Mode,
    root: Group,
    dirty: bool,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn load(path: &Path) -> Result<Group> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    Ok(group_from_format(h5obj_format::read_file(&bytes)?)?)
}

impl File {
    /// Open `path` in `mode`.
    pub fn open<P: AsRef<Path>>(path: P, mode: Mode) -> Result<File> {
        let path = path.as_ref().to_path_buf();
        let exists = path.exists();
        if mode == Mode::Exclusive && exists {
            return Err(StoreError::FileExists { path });
        }
        let root = if mode.starts_empty() || (mode == Mode::Append && !exists) {
            Group::default()
        } else {
            load(&path)?
        };
        let mut file = File {
            path,
            mode,
            root,
            dirty: false,
        };
        if mode.starts_empty() || !exists {
            // Creating modes leave a valid file behind even if nothing is written.
            file.dirty = true;
            file.flush()?;
        }
        tracing::debug!(path = %file.path.display(), mode = %mode, "opened store");
        Ok(file)
    }

    /// Create `path`, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<File> {
        File::open(path, Mode::Truncate)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Mutable access to the tree. Marks the file dirty.
    pub fn root_mut(&mut self) -> Result<&mut Group> {
        if !self.mode.is_writable() {
            return Err(StoreError::ReadOnly);
        }
        self.dirty = true;
        Ok(&mut self.root)
    }

    /// Write pending changes to disk.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty || !self.mode.is_writable() {
            return Ok(());
        }
        let bytes = h5obj_format::write_file(&group_to_format(&self.root))?;
        fs::write(&self.path, &bytes).map_err(io_error(&self.path))?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "flushed store");
        Ok(())
    }

    /// Flush and release the file.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to flush store on drop"
            );

        }
    }
}
