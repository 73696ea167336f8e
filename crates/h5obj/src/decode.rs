//! Lifting store nodes back into values.

use std::collections::{BTreeMap, BTreeSet};

use h5obj_store::{Data, Dataset, Elements, Group, Node};
use ndarray::{Array1, Array2};

use crate::cofunc::{CoFunc, CoFunc2d};
use crate::error::{Error, Result};
use crate::meta::{self, Metadata};
use crate::native;
use crate::options::{Options, Profile};
use crate::pickle;
use crate::sparse::{Csr, SparseFormat, SparseMatrix};
use crate::tag::Tag;
use crate::value::{NdArray, Value};

/// Read the value stored under `name` in `group`.
pub fn decode(group: &Group, name: &str, options: &Options) -> Result<Value> {
    let node = group.get(name).ok_or_else(|| Error::NotFound {
        path: name.to_string(),
    })?;
    decode_node(node, name, options)
}

/// Read the value held by `node`; `path` names it in errors.
pub fn decode_node(node: &Node, path: &str, options: &Options) -> Result<Value> {
    let decoder = Decoder { options };
    match options.profile {
        Profile::Tagged => decoder.node(node, path),
        Profile::PickleFirst => decoder.loose(node, path),
    }
}

fn child_path(path: &str, name: &str) -> String {
    format!("{path}/{name}")
}

fn as_dataset<'a>(node: &'a Node, path: &str, tag: Tag) -> Result<&'a Dataset> {
    match node {
        Node::Dataset(d) => Ok(d),
        Node::Group(_) => Err(Error::mismatch(path, format!("{tag} stored as a group"))),
    }
}

fn as_group<'a>(node: &'a Node, path: &str, tag: Tag) -> Result<&'a Group> {
    match node {
        Node::Group(g) => Ok(g),
        Node::Dataset(_) => Err(Error::mismatch(path, format!("{tag} stored as a dataset"))),
    }
}

/// The bytes of a pickled payload. Older files hold pickles as strings.
fn payload_bytes(data: &Data) -> Option<&[u8]> {
    match &data.elements {
        Elements::Opaque { items, .. } if items.len() == 1 => Some(&items[0]),
        Elements::Str(v) if v.len() == 1 => Some(v[0].as_bytes()),
        _ => None,
    }
}

fn parse_key(name: &str, name_type: Option<&str>, path: &str) -> Result<Value> {
    let bad = || {
        let expected = name_type.unwrap_or("str");
        Error::mismatch(path, format!("key {name:?} is not a {expected}"))
    };
    Ok(match name_type.and_then(Tag::from_name) {
        None | Some(Tag::Str) => Value::Str(name.to_string()),
        Some(Tag::Int) => match name.parse::<i64>() {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Long(name.parse().map_err(|_| bad())?),
        },
        Some(Tag::Long) => Value::Long(name.parse().map_err(|_| bad())?),
        Some(Tag::Float) => Value::Float(name.parse().map_err(|_| bad())?),
        Some(Tag::Bool) => match name {
            "True" => Value::Bool(true),
            "False" => Value::Bool(false),
            _ => return Err(bad()),
        },
        Some(Tag::NoneType) => Value::None,
        Some(other) => return Err(Error::mismatch(path, format!("{other} cannot key a dict"))),
    })
}

fn index_vec(value: &Value) -> Option<Vec<usize>> {
    let as_index = |v: &Value| match v {
        Value::Int(i) => usize::try_from(*i).ok(),
        Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(*f as usize),
        _ => None,
    };
    match value {
        Value::Array(a) => a.to_values().iter().map(as_index).collect(),
        Value::List(v) | Value::Tuple(v) => v.iter().map(as_index).collect(),
        _ => None,
    }
}

fn one_dimensional(value: Value) -> Option<NdArray> {
    match value {
        Value::Array(a) if a.ndim() == 1 => Some(a),
        _ => None,
    }
}

struct Decoder<'a> {
    options: &'a Options,
}

impl Decoder<'_> {
    fn node(&self, node: &Node, path: &str) -> Result<Value> {
        let attrs = node.attrs();
        if meta::is_serialized(attrs) {
            return self.unpickle(node, path);
        }
        let Some(record) = Metadata::read(attrs) else {
            return self.untagged(node, path);
        };
        match (Tag::from_name(&record.original_type), node) {
            (Some(tag), _) => {
                tracing::debug!(path, %tag, "decoding node");
                self.tagged(tag, node, path)
            }
            (None, Node::Group(group)) => {
                tracing::warn!(
                    path,
                    dtype = %record.original_type,
                    "unrecognized type tag, reading group as Bundle"
                );
                self.bundle(group, path)
            }
            (None, Node::Dataset(d)) => {
                tracing::debug!(
                    path,
                    dtype = %record.original_type,
                    "unrecognized type tag, reading payload"
                );
                Ok(native::data_to_value(d.value()))
            }
        }
    }

    fn unpickle(&self, node: &Node, path: &str) -> Result<Value> {
        let Node::Dataset(d) = node else {
            return Err(Error::mismatch(path, "pickled value stored as a group"));
        };
        let bytes = payload_bytes(d.value())
            .ok_or_else(|| Error::mismatch(path, "pickled payload is not a single blob"))?;
        if !self.options.unpickle {
            return Ok(Value::Bytes(bytes.to_vec()));
        }
        pickle::loads_inner(bytes).map_err(|reason| Error::Deserialization {
            path: path.to_string(),
            reason,
        })
    }

    fn untagged(&self, node: &Node, path: &str) -> Result<Value> {
        match node {
            Node::Group(g) => self.bundle(g, path),
            Node::Dataset(d) => Ok(native::data_to_value(d.value())),
        }
    }

    fn children(&self, group: &Group, path: &str) -> Result<Vec<Value>> {
        group
            .iter()
            .map(|(name, child)| self.node(child, &child_path(path, name)))
            .collect()
    }

    fn child(&self, group: &Group, name: &str, path: &str) -> Result<Value> {
        let child = group
            .get(name)
            .ok_or_else(|| Error::mismatch(path, format!("missing child {name:?}")))?;
        self.node(child, &child_path(path, name))
    }

    fn bundle(&self, group: &Group, path: &str) -> Result<Value> {
        let mut map = BTreeMap::new();
        for (name, child) in group.iter() {
            map.insert(name.to_string(), self.node(child, &child_path(path, name))?);
        }
        Ok(Value::Bundle(map))
    }

    fn tagged(&self, tag: Tag, node: &Node, path: &str) -> Result<Value> {
        match tag {
            Tag::NoneType => Ok(Value::None),
            Tag::Bool
            | Tag::Int
            | Tag::Long
            | Tag::Float
            | Tag::Complex
            | Tag::Str
            | Tag::Bytes => {
                let d = as_dataset(node, path, tag)?;
                native::cast_scalar(tag, d.value()).map_err(|reason| Error::mismatch(path, reason))
            }
            Tag::List | Tag::Tuple | Tag::Set | Tag::FrozenSet => {
                let items = match node {
                    Node::Group(g) => self.children(g, path)?,
                    Node::Dataset(d) if native::is_sentinel(d.value(), meta::EMPTY_SENTINEL) => {
                        Vec::new()
                    }
                    Node::Dataset(d) => native::items(d.value()),
                };
                Ok(match tag {
                    Tag::Tuple => Value::Tuple(items),
                    Tag::Set => Value::Set(items.into_iter().collect()),
                    Tag::FrozenSet => Value::FrozenSet(items.into_iter().collect::<BTreeSet<_>>()),
                    _ => Value::List(items),
                })
            }
            Tag::Dict => {
                let group = as_group(node, path, tag)?;
                let mut map = BTreeMap::new();
                for (name, child) in group.iter() {
                    let name_type = child.attrs().get_str(meta::NTYPE);
                    let key = parse_key(name, name_type, path)?;
                    map.insert(key, self.node(child, &child_path(path, name))?);
                }
                Ok(Value::Dict(map))
            }
            Tag::Bundle => self.bundle(as_group(node, path, tag)?, path),
            Tag::Ndarray | Tag::Matrix => {
                let d = as_dataset(node, path, tag)?;
                let array = if native::is_sentinel(d.value(), meta::EMPTY_SENTINEL) {
                    if tag == Tag::Matrix {
                        NdArray::from(Array2::<f64>::zeros((1, 0)))
                    } else {
                        NdArray::from(Array1::<f64>::zeros(0))
                    }
                } else {
                    native::data_to_array(d.value())
                        .map_err(|reason| Error::mismatch(path, reason))?
                };
                if tag == Tag::Matrix {
                    if array.ndim() != 2 {
                        let reason = format!("matrix of shape {:?}", array.shape());
                        return Err(Error::mismatch(path, reason));
                    }
                    Ok(Value::Matrix(array))
                } else {
                    Ok(Value::Array(array))
                }
            }
            Tag::Sparse(format) => self.sparse(format, as_group(node, path, tag)?, path),
            Tag::CoFunc => {
                let group = as_group(node, path, tag)?;
                let (x, y) = (self.vector(group, "x", path)?, self.vector(group, "y", path)?);
                let attrs = self.func_attrs(group, path)?;
                let mut f = CoFunc::new(x, y).map_err(|reason| Error::mismatch(path, reason))?;
                f.attrs = attrs;
                Ok(Value::Func(f))
            }
            Tag::CoFunc2d => {
                let group = as_group(node, path, tag)?;
                let (x, y) = (self.vector(group, "x", path)?, self.vector(group, "y", path)?);
                let z = match self.child(group, "z", path)? {
                    Value::Array(z) => z,
                    other => {
                        let reason = format!("z is a {}", other.type_name());
                        return Err(Error::mismatch(path, reason));
                    }
                };
                let attrs = self.func_attrs(group, path)?;
                let mut f = CoFunc2d::new(x, y, z).map_err(|reason| Error::mismatch(path, reason))?;
                f.attrs = attrs;
                Ok(Value::Func2d(f))
            }
        }
    }

    fn vector(&self, group: &Group, name: &str, path: &str) -> Result<NdArray> {
        one_dimensional(self.child(group, name, path)?)
            .ok_or_else(|| Error::mismatch(path, format!("{name} is not a 1-D array")))
    }

    fn func_attrs(&self, group: &Group, path: &str) -> Result<BTreeMap<String, Value>> {
        if !group.contains("attrs") {
            return Ok(BTreeMap::new());
        }
        match self.child(group, "attrs", path)? {
            Value::Bundle(map) => Ok(map),
            Value::Dict(map) => map
                .into_iter()
                .map(|(k, v)| match k {
                    Value::Str(k) => Ok((k, v)),
                    other => Err(Error::mismatch(
                        path,
                        format!("attribute key {other} is not a string"),
                    )),
                })
                .collect(),
            Value::None => Ok(BTreeMap::new()),
            other => Err(Error::mismatch(path, format!("attrs is a {}", other.type_name()))),
        }
    }

    fn sparse(&self, format: SparseFormat, group: &Group, path: &str) -> Result<Value> {
        let data = match self.child(group, "data", path)? {
            Value::Array(a) => a.to_f64(),
            _ => None,
        }
        .ok_or_else(|| Error::mismatch(path, "sparse data is not a real array"))?;
        let indices = index_vec(&self.child(group, "indices", path)?)
            .ok_or_else(|| Error::mismatch(path, "sparse indices are not indices"))?;
        let indptr = index_vec(&self.child(group, "indptr", path)?)
            .ok_or_else(|| Error::mismatch(path, "sparse indptr is not an index array"))?;
        let shape = match index_vec(&self.child(group, "shape", path)?).as_deref() {
            Some(&[rows, cols]) => (rows, cols),
            _ => return Err(Error::mismatch(path, "sparse shape is not two indices")),
        };
        let csr = Csr { data, indices, indptr };
        SparseMatrix::from_csr(format, shape, csr)
            .map(Value::Sparse)
            .map_err(|reason| Error::mismatch(path, reason))
    }

    /// Pickle-first reading: unpickle what unpickles, return the rest as
    /// the store holds it.
    fn loose(&self, node: &Node, path: &str) -> Result<Value> {
        let d = match node {
            Node::Group(g) => {
                let mut map = BTreeMap::new();
                for (name, child) in g.iter() {
                    map.insert(name.to_string(), self.loose(child, &child_path(path, name))?);
                }
                return Ok(Value::Bundle(map));
            }
            Node::Dataset(d) => d,
        };
        let data = d.value();
        if self.options.unpickle && data.is_scalar() {
            let opaque_tag = match &data.elements {
                Elements::Opaque { tag, .. } => Some(tag.as_str()),
                _ => None,
            };
            let is_pickle = opaque_tag == Some(native::PICKLE_TAG);
            let is_bytes = opaque_tag == Some(native::BYTES_TAG);

            if let Some(bytes) = payload_bytes(data).filter(|_| !is_bytes) {
                match pickle::loads_inner(bytes) {
                    Ok(value) => return Ok(value),
                    Err(reason) if is_pickle => {
                        return Err(Error::Deserialization {
                            path: path.to_string(),
                            reason,
                        })
                    }
                    Err(_) => {}
                }
            }
        }
        Ok(native::data_to_value(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use h5obj_store::AttrValue;

    use crate::encode::encode;

    fn roundtrip(value: &Value) -> Value {
        let mut root = Group::default();
        let opts = Options::default();
        encode(&mut root, "v", value, &opts).unwrap();
        decode(&root, "v", &opts).unwrap()
    }

    #[test]
    fn missing_name() {
        let err = decode(&Group::default(), "nope", &Options::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound { path } if path == "nope"));
    }

    #[test]
    fn empty_matrix_sentinel_is_one_by_zero() {
        let value = Value::Matrix(NdArray::from(Array2::<f64>::zeros((0, 3))));
        match roundtrip(&value) {
            Value::Matrix(m) => assert_eq!(m.shape(), &[1, 0]),
            other => panic!("got {other}"),
        }
    }

    #[test]
    fn dict_keys_get_their_type_back() {
        let mut map = BTreeMap::new();
        map.insert(Value::Int(-3), Value::from("a"));
        map.insert(Value::Float(0.5), Value::None);
        map.insert(Value::Bool(true), Value::Int(1));
        map.insert(Value::None, Value::Int(2));
        map.insert(Value::from("k"), Value::List(vec![]));
        let value = Value::Dict(map);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn unknown_group_tag_reads_as_bundle() {
        let mut root = Group::default();
        let g = root.create_group("g").unwrap();
        g.attrs_mut().set(meta::DTYPE, "SomethingElse");
        g.create_dataset("a", Data::from(1i64)).unwrap();
        let value = decode(&root, "g", &Options::default()).unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("a".to_string(), Value::Int(1));
        assert_eq!(value, Value::Bundle(expected));
    }

    #[test]
    fn malformed_sparse_group_is_a_mismatch() {
        let mut root = Group::default();
        let g = root.create_group("s").unwrap();
        g.attrs_mut().set(meta::DTYPE, "csr_matrix");
        let err = decode(&root, "s", &Options::default()).unwrap_err();
        assert!(matches!(err, Error::StructuralMismatch { .. }));
    }

    #[test]
    fn corrupt_pickle_names_the_path() {
        let mut root = Group::default();
        let d = root.create_dataset("p", native::pickle_data(b"garbage".to_vec())).unwrap();
        d.attrs_mut().set(meta::DTYPE, "Circle");
        d.attrs_mut().set(meta::PICKLED, AttrValue::Bool(true));
        let err = decode(&root, "p", &Options::default()).unwrap_err();
        assert!(matches!(err, Error::Deserialization { path, .. } if path == "p"));
        let raw = decode(&root, "p", &Options::default().with_unpickle(false)).unwrap();
        assert_eq!(raw, Value::Bytes(b"garbage".to_vec()));
    }

    #[test]
    fn loose_reading_returns_raw_strings() {
        let mut root = Group::default();
        root.create_dataset("s", Data::from("plain text")).unwrap();
        let opts = Options::default().with_profile(Profile::PickleFirst);
        assert_eq!(decode(&root, "s", &opts).unwrap(), Value::from("plain text"));
    }
}
