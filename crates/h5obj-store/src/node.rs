//! Groups, datasets and the nodes that hold them.
//!
//! Paths are `/`-separated and relative to the group they are used on;
//! empty and `.` segments are ignored, so `"/a//b"` and `"a/b"` agree.

use std::collections::BTreeMap;

use crate::attrs::Attrs;
use crate::data::{DType, Data};
use crate::error::{Result, StoreError};

/// Either kind of object in a file.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

impl Node {
    pub fn attrs(&self) -> &Attrs {
        match self {
            Node::Group(g) => &g.attrs,
            Node::Dataset(d) => &d.attrs,
        }
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        match self {
            Node::Group(g) => &mut g.attrs,
            Node::Dataset(d) => &mut d.attrs,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Node::Group(_))
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            Node::Dataset(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Node::Group(g) => Some(g),
            Node::Dataset(_) => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Node::Dataset(d) => Some(d),
            Node::Group(_) => None,
        }
    }
}

/// A leaf holding a [`Data`] payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    data: Data,
    attrs: Attrs,
}

impl Dataset {
    pub(crate) fn new(data: Data, attrs: Attrs) -> Dataset {
        Dataset { data, attrs }
    }

    /// The native payload.
    pub fn value(&self) -> &Data {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.data.shape
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }
}

/// A container of named children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    attrs: Attrs,
    children: BTreeMap<String, Node>,
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".").collect()
}

fn split_last(path: &str) -> Result<(Vec<&str>, &str)> {
    let mut segs = segments(path);
    let last = segs
        .pop()
        .ok_or_else(|| StoreError::InvalidName(path.to_string()))?;
    Ok((segs, last))
}

impl Group {
    pub(crate) fn from_parts(attrs: Attrs, children: BTreeMap<String, Node>) -> Group {
        Group { attrs, children }
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child names, in name order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, path: &str) -> Option<&Node> {
        let segs = segments(path);
        let (last, parents) = segs.split_last()?;
        let mut group = self;
        for seg in parents {
            group = group.children.get(*seg)?.as_group()?;
        }
        group.children.get(*last)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Node> {
        let segs = segments(path);
        let (last, parents) = segs.split_last()?;
        let mut group = self;
        for seg in parents {
            group = group.children.get_mut(*seg)?.as_group_mut()?;
        }
        group.children.get_mut(*last)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn group(&self, path: &str) -> Result<&Group> {
        if segments(path).is_empty() {
            return Ok(self);
        }
        match self.get(path) {
            Some(Node::Group(g)) => Ok(g),
            Some(Node::Dataset(_)) => Err(StoreError::NotAGroup(path.to_string())),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    pub fn group_mut(&mut self, path: &str) -> Result<&mut Group> {
        if segments(path).is_empty() {
            return Ok(self);
        }
        match self.get_mut(path) {
            Some(Node::Group(g)) => Ok(g),
            Some(Node::Dataset(_)) => Err(StoreError::NotAGroup(path.to_string())),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    pub fn dataset(&self, path: &str) -> Result<&Dataset> {
        match self.get(path) {
            Some(Node::Dataset(d)) => Ok(d),
            Some(Node::Group(_)) => Err(StoreError::NotADataset(path.to_string())),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    /// Walk to the group holding the last segment, optionally creating
    /// missing intermediate groups.
    fn parent_mut(&mut self, parents: &[&str], create: bool) -> Result<&mut Group> {
        let mut group = self;
        let mut walked = String::new();
        for seg in parents {
            if !walked.is_empty() {
                walked.push('/');
            }
            walked.push_str(seg);
            if create && !group.children.contains_key(*seg) {
                group
                    .children
                    .insert(seg.to_string(), Node::Group(Group::default()));
            }
            group = match group.children.get_mut(*seg) {
                Some(Node::Group(g)) => g,
                Some(Node::Dataset(_)) => return Err(StoreError::NotAGroup(walked)),
                None => return Err(StoreError::NotFound(walked)),
            };
        }
        Ok(group)
    }

    /// Add `node` at `path`, creating intermediate groups.
    pub fn insert(&mut self, path: &str, node: Node) -> Result<&mut Node> {
        let (parents, last) = split_last(path)?;
        let parent = self.parent_mut(&parents, true)?;
        if parent.children.contains_key(last) {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        Ok(parent.children.entry(last.to_string()).or_insert(node))
    }

    /// Create an empty group. Fails if `path` already exists.
    pub fn create_group(&mut self, path: &str) -> Result<&mut Group> {
        match self.insert(path, Node::Group(Group::default()))? {
            Node::Group(g) => Ok(g),
            Node::Dataset(_) => Err(StoreError::NotAGroup(path.to_string())),
        }
    }

    /// Return the group at `path`, creating it (and its parents) if absent.
    pub fn require_group(&mut self, path: &str) -> Result<&mut Group> {
        if self.contains(path) {
            return self.group_mut(path);
        }
        self.create_group(path)
    }

    /// Create a dataset holding `data`.
    ///
    /// Fails with [`StoreError::UnsupportedShape`] when the payload does not
    /// fill its shape or has no native form.
    pub fn create_dataset(&mut self, path: &str, data: Data) -> Result<&mut Dataset> {
        if let Some(reason) = data.check() {
            return Err(StoreError::UnsupportedShape {
                name: path.to_string(),
                reason,
            });
        }
        match self.insert(path, Node::Dataset(Dataset::new(data, Attrs::default())))? {
            Node::Dataset(d) => Ok(d),
            Node::Group(_) => Err(StoreError::NotADataset(path.to_string())),
        }
    }

    /// Remove and return the node at `path`.
    pub fn delete(&mut self, path: &str) -> Result<Node> {
        let (parents, last) = split_last(path)?;
        let parent = self.parent_mut(&parents, false)?;
        parent
            .children
            .remove(last)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    /// Deep-copy the node at `source` to `dest` within this group.
    pub fn copy(&mut self, source: &str, dest: &str) -> Result<()> {
        let node = self
            .get(source)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(source.to_string()))?;
        self.insert(dest, node)?;
        Ok(())
    }

    /// Call `f` with the relative path of every descendant, pre-order.
    pub fn visit(&self, mut f: impl FnMut(&str)) {
        self.visititems(|name, _| f(name));
    }

    /// Call `f` with the relative path and node of every descendant,
    /// pre-order, children in name order.
    pub fn visititems(&self, mut f: impl FnMut(&str, &Node)) {
        fn walk(group: &Group, prefix: &str, f: &mut dyn FnMut(&str, &Node)) {
            for (name, node) in &group.children {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}/{name}")
                };
                f(&path, node);
                if let Node::Group(g) = node {
                    walk(g, &path, f);
                }
            }
        }
        walk(self, "", &mut f);
    }

    pub(crate) fn children(&self) -> &BTreeMap<String, Node> {
        &self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Elements;

    fn sample() -> Group {
        let mut root = Group::default();
        root.create_dataset("a/x", Data::from(vec![1i64, 2, 3])).unwrap();
        root.create_dataset("a/b/y", Data::from(2.5)).unwrap();
        root.create_group("c").unwrap();
        root
    }

    #[test]
    fn intermediate_groups_created() {
        let root = sample();
        assert!(root.get("a").unwrap().is_group());
        assert!(root.get("a/b").unwrap().is_group());
        assert_eq!(root.dataset("/a/b/y").unwrap().value(), &Data::from(2.5));
    }

    #[test]
    fn create_existing_fails() {
        let mut root = sample();
        assert!(matches!(
            root.create_group("a"),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            root.create_dataset("a/x", Data::from(1i64)),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn require_group_is_idempotent() {
        let mut root = sample();
        root.require_group("a").unwrap().attrs_mut().set("k", 1i64);
        assert_eq!(root.group("a").unwrap().attrs().get("k"), Some(&1i64.into()));
        assert!(root.require_group("new/deep").is_ok());
        assert!(matches!(
            root.require_group("a/x"),
            Err(StoreError::NotAGroup(_))
        ));
    }

    #[test]
    fn dataset_under_dataset_rejected() {
        let mut root = sample();
        assert!(matches!(
            root.create_dataset("a/x/z", Data::from(1i64)),
            Err(StoreError::NotAGroup(_))
        ));
    }

    #[test]
    fn unsupported_shape() {
        let mut root = Group::default();
        let err = root
            .create_dataset("bad", Data::with_shape(Elements::Int(vec![1]), vec![2]))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedShape { .. }));
        assert!(!root.contains("bad"));
    }

    #[test]
    fn delete_and_len() {
        let mut root = sample();
        assert_eq!(root.len(), 2);
        assert!(root.delete("a/b").unwrap().is_group());
        assert!(!root.contains("a/b/y"));
        assert!(matches!(root.delete("a/b"), Err(StoreError::NotFound(_))));
        assert!(matches!(root.delete(""), Err(StoreError::InvalidName(_))));
    }

    #[test]
    fn visit_preorder_sorted() {
        let root = sample();
        let mut names = Vec::new();
        root.visit(|n| names.push(n.to_string()));
        assert_eq!(names, ["a", "a/b", "a/b/y", "a/x", "c"]);
    }

    #[test]
    fn visititems_sees_nodes() {
        let root = sample();
        let mut datasets = 0;
        root.visititems(|_, node| {
            if node.as_dataset().is_some() {
                datasets += 1;
            }
        });
        assert_eq!(datasets, 2);
    }

    #[test]
    fn copy_is_deep() {
        let mut root = sample();
        root.copy("a", "c/a2").unwrap();
        root.delete("a/x").unwrap();
        assert!(root.contains("c/a2/x"));
        assert!(matches!(root.copy("missing", "z"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn empty_path_is_self() {
        let root = sample();
        assert_eq!(root.group("").unwrap().len(), 2);
        assert_eq!(root.group("/").unwrap().len(), 2);
    }
}
