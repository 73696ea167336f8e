//! Mapping-style access to stored values.
//!
//! [`ObjFile`] owns an open store and a set of [`Options`]. Reads go through
//! [`ObjGroup`], writes through [`ObjGroupMut`]; both address values by
//! name relative to their group.

use std::path::Path;

use h5obj_store::{File, Group, Mode, Node};

use crate::decode::decode;
use crate::encode::encode;
use crate::error::{Error, Result};
use crate::meta;
use crate::options::Options;
use crate::value::Value;

/// Keys that read back the file name instead of a stored value.
pub const FILENAME_KEYS: [&str; 3] = ["@", "filename", "__filename__"];

/// A read view of one group.
#[derive(Debug, Clone, Copy)]
pub struct ObjGroup<'a> {
    group: &'a Group,
    options: &'a Options,
}

impl<'a> ObjGroup<'a> {
    pub fn new(group: &'a Group, options: &'a Options) -> ObjGroup<'a> {
        ObjGroup { group, options }
    }

    /// Decode the value stored under `key`.
    pub fn get_item(&self, key: &str) -> Result<Value> {
        decode(self.group, key, self.options)
    }

    /// Decode several values, in the order given.
    pub fn load_many<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Value>> {
        names.iter().map(|n| self.get_item(n.as_ref())).collect()
    }

    /// The raw store node under `key`, without decoding.
    pub fn get_node(&self, key: &str) -> Result<&'a Node> {
        self.group.get(key).ok_or_else(|| Error::NotFound {
            path: key.to_string(),
        })
    }

    /// A view of the subgroup at `path`.
    pub fn group(&self, path: &str) -> Result<ObjGroup<'a>> {
        Ok(ObjGroup {
            group: self.group.group(path)?,
            options: self.options,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.group.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.group.keys()
    }

    pub fn len(&self) -> usize {
        self.group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty()
    }

    /// Paths of every stored value root: nodes carrying `__DTYPE__` whose
    /// parent does not.
    pub fn dsetkeys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.group.visititems(|path, node| {
            if !node.attrs().contains(meta::DTYPE) {
                return;
            }
            let parent = path.rsplit_once('/').map_or("", |(dir, _)| dir);
            let parent_tagged = self
                .group
                .group(parent)
                .map(|g| g.attrs().contains(meta::DTYPE))
                .unwrap_or(false);
            if !parent_tagged {
                keys.push(path.to_string());
            }
        });
        keys
    }

    pub fn store(&self) -> &'a Group {
        self.group
    }
}

/// A write view of one group.
#[derive(Debug)]
pub struct ObjGroupMut<'a> {
    group: &'a mut Group,
    options: &'a Options,
}

impl<'a> ObjGroupMut<'a> {
    pub fn new(group: &'a mut Group, options: &'a Options) -> ObjGroupMut<'a> {
        ObjGroupMut { group, options }
    }

    /// A read view of the same group.
    pub fn view(&self) -> ObjGroup<'_> {
        ObjGroup {
            group: &*self.group,
            options: self.options,
        }
    }

    /// Encode `value` under `key`.
    pub fn set_item(&mut self, key: &str, value: &Value) -> Result<()> {
        encode(self.group, key, value, self.options)
    }

    /// Encode several values; stops at the first failure.
    pub fn save_many<S: AsRef<str>>(&mut self, pairs: &[(S, Value)]) -> Result<()> {
        for (name, value) in pairs {
            self.set_item(name.as_ref(), value)?;
        }
        Ok(())
    }

    pub fn del_item(&mut self, key: &str) -> Result<()> {
        match self.group.delete(key) {
            Ok(_) => Ok(()),
            Err(h5obj_store::StoreError::NotFound(_)) => Err(Error::NotFound {
                path: key.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// A write view of the subgroup at `path`, created if absent.
    pub fn require_group(&mut self, path: &str) -> Result<ObjGroupMut<'_>> {
        Ok(ObjGroupMut {
            group: self.group.require_group(path)?,
            options: self.options,
        })
    }

    pub fn store_mut(&mut self) -> &mut Group {
        self.group
    }
}

/// An open file of stored values.
///
/// ```no_run
/// use h5obj::{ObjFile, Value};
/// use h5obj_store::Mode;
///
/// let mut f = ObjFile::open("results.h5", Mode::Append)?;
/// f.set_item("answer", &Value::Int(42))?;
/// assert_eq!(f.get_item("answer")?, Value::Int(42));
/// f.close()?;
/// # Ok::<(), h5obj::Error>(())
/// ```
#[derive(Debug)]
pub struct ObjFile {
    file: File,
    options: Options,
}

impl ObjFile {
    pub fn open<P: AsRef<Path>>(path: P, mode: Mode) -> Result<ObjFile> {
        ObjFile::open_with(path, mode, Options::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, mode: Mode, options: Options) -> Result<ObjFile> {
        let file = File::open(path, mode)?;
        tracing::debug!(
            path = %file.path().display(),
            profile = %options.profile,
            "opened object file"
        );

        Ok(ObjFile { file, options })
    }

    pub fn filename(&self) -> &Path {
        self.file.path()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    pub fn root(&self) -> ObjGroup<'_> {
        ObjGroup::new(self.file.root(), &self.options)
    }

    pub fn root_mut(&mut self) -> Result<ObjGroupMut<'_>> {
        Ok(ObjGroupMut::new(self.file.root_mut()?, &self.options))
    }

    /// Decode the value under `key`. The keys in [`FILENAME_KEYS`] return
    /// the file name.
    pub fn get_item(&self, key: &str) -> Result<Value> {
        if FILENAME_KEYS.contains(&key) {
            return Ok(Value::Str(self.filename().display().to_string()));
        }
        self.root().get_item(key)
    }

    pub fn set_item(&mut self, key: &str, value: &Value) -> Result<()> {
        self.root_mut()?.set_item(key, value)
    }

    pub fn del_item(&mut self, key: &str) -> Result<()> {
        self.root_mut()?.del_item(key)
    }

    pub fn load_many<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Value>> {
        self.root().load_many(names)
    }

    pub fn save_many<S: AsRef<str>>(&mut self, pairs: &[(S, Value)]) -> Result<()> {
        self.root_mut()?.save_many(pairs)
    }

    pub fn get_node(&self, key: &str) -> Result<&Node> {
        self.root().get_node(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.file.root().contains(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.file.root().keys().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.file.root().len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.root().is_empty()
    }

    pub fn dsetkeys(&self) -> Vec<String> {
        self.root().dsetkeys()
    }

    pub fn create_group(&mut self, name: &str) -> Result<()> {
        self.file.root_mut()?.create_group(name)?;
        Ok(())
    }

    pub fn store(&self) -> &File {
        &self.file
    }

    pub fn store_mut(&mut self) -> &mut File {
        &mut self.file
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.file.flush()?)
    }

    pub fn close(self) -> Result<()> {
        Ok(self.file.close()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_node;
    use crate::options::Profile;

    #[test]
    fn filename_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.h5");
        let f = ObjFile::open(&path, Mode::Truncate).unwrap();
        for key in FILENAME_KEYS {
            assert_eq!(f.get_item(key).unwrap(), Value::Str(path.display().to_string()));
        }
    }

    #[test]
    fn dsetkeys_lists_value_roots() {
        let mut root = Group::default();
        let opts = Options::default();
        {
            let mut w = ObjGroupMut::new(&mut root, &opts);
            w.set_item("a", &Value::List(vec![Value::Int(1), Value::from("x")])).unwrap();
            w.require_group("plain").unwrap().set_item("b", &Value::Int(2)).unwrap();
        }
        let keys = ObjGroup::new(&root, &opts).dsetkeys();
        assert_eq!(keys, ["a", "plain/b"]);
    }

    #[test]
    fn many_at_once() {
        let mut root = Group::default();
        let opts = Options::default();
        ObjGroupMut::new(&mut root, &opts)
            .save_many(&[("x", Value::Int(1)), ("y", Value::from("two"))])
            .unwrap();
        let values = ObjGroup::new(&root, &opts).load_many(&["y", "x"]).unwrap();
        assert_eq!(values, [Value::from("two"), Value::Int(1)]);
    }

    #[test]
    fn raw_node_access() {
        let mut root = Group::default();
        let opts = Options::default().with_profile(Profile::PickleFirst);
        ObjGroupMut::new(&mut root, &opts).set_item("x", &Value::Float(1.5)).unwrap();
        let view = ObjGroup::new(&root, &opts);
        let node = view.get_node("x").unwrap();
        assert!(!node.is_group());
        assert_eq!(decode_node(node, "x", &opts).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut root = Group::default();
        let opts = Options::default();
        let err = ObjGroupMut::new(&mut root, &opts).del_item("nope").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
