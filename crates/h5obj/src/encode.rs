//! Lowering values into store nodes.

use h5obj_store::{Data, Group, StoreError};

use crate::error::{Error, Result};
use crate::kind::{key_name, key_names, Kind};
use crate::meta::{self, Metadata};
use crate::native;
use crate::options::{Options, Profile};
use crate::pickle;
use crate::sparse::SparseMatrix;
use crate::value::{NdArray, Object, Value};

/// Store `value` under `name` in `parent`.
///
/// An existing node of the same name is replaced when `options.overwrite`
/// is set; otherwise the call fails with [`Error::AlreadyExists`] and the
/// store is left untouched.
pub fn encode(parent: &mut Group, name: &str, value: &Value, options: &Options) -> Result<()> {
    if parent.contains(name) {
        if !options.overwrite {
            return Err(Error::AlreadyExists {
                path: name.to_string(),
            });
        }
        parent.delete(name)?;
    }
    let result = match options.profile {
        Profile::Tagged => Encoder { options }.node(parent, name, name, value, "str"),
        Profile::PickleFirst => encode_pickle_first(parent, name, value, options),
    };
    if let Err(err) = &result {
        // A partly built node must not reach the file.
        if parent.contains(name) {
            tracing::debug!(path = name, error = %err, "dropping partly encoded node");
            parent.delete(name)?;
        }
    }
    result
}

/// Name of the `i`-th of `len` sequence items: `key0`..`key9`, or
/// `key00`..`key10` for eleven items.
pub fn ordinal_key(i: usize, len: usize) -> String {
    let width = len.saturating_sub(1).to_string().len();
    format!("key{i:0width$}")
}

fn unsupported(path: &str, err: StoreError) -> Error {
    match err {
        StoreError::UnsupportedShape { reason, .. } => Error::UnsupportedShape {
            path: path.to_string(),
            reason,
        },
        other => Error::Store(other),
    }
}

fn child_path(path: &str, name: &str) -> String {
    format!("{path}/{name}")
}

/// Record the class of a stored object on the group that holds it.
fn record_owner(parent: &mut Group, name: &str, object: &Object) {
    let dir = name.rsplit_once('/').map_or("", |(dir, _)| dir);
    match parent.group_mut(dir) {
        Ok(group) => {
            group.attrs_mut().set(meta::MODULE, object.module.as_str());
            group.attrs_mut().set(meta::CLASS, object.class.as_str());
        }
        Err(err) => tracing::warn!(name, error = %err, "cannot record object provenance"),
    }
}

struct Encoder<'a> {
    options: &'a Options,
}

impl Encoder<'_> {
    fn node(
        &self,
        parent: &mut Group,
        name: &str,
        path: &str,
        value: &Value,
        name_type: &str,
    ) -> Result<()> {
        let mut meta = Metadata::new(value.type_name());
        meta.name_type = Some(name_type.to_string());
        let kind = Kind::of(value);
        tracing::debug!(path, ?kind, dtype = %meta.original_type, "encoding node");

        match (kind, value) {
            (Kind::None, _) => {
                let data = native::text_data(meta::NONE_SENTINEL);
                self.dataset(parent, name, data, &meta)?
            }
            (Kind::Empty, _) => {
                let data = native::text_data(meta::EMPTY_SENTINEL);
                self.dataset(parent, name, data, &meta)?
            }
            (Kind::Homogeneous, _) => self.homogeneous(parent, name, path, value, meta)?,
            (Kind::Heterogeneous, _) => self.sequence_group(parent, name, path, value, meta)?,
            (Kind::Mapping, _) => self.mapping(parent, name, path, value, meta)?,
            (Kind::Sparse, Value::Sparse(matrix)) => self.sparse(parent, name, path, matrix, meta)?,
            (Kind::Function, Value::Func(f)) => {
                let children = [
                    ("x", Value::Array(f.x.clone())),
                    ("y", Value::Array(f.y.clone())),
                    ("attrs", attrs_dict(&f.attrs)),
                ];
                self.fixed_group(parent, name, path, &children, meta)?
            }
            (Kind::Function, Value::Func2d(f)) => {
                let children = [
                    ("x", Value::Array(f.x.clone())),
                    ("y", Value::Array(f.y.clone())),
                    ("z", Value::Array(f.z.clone())),
                    ("attrs", attrs_dict(&f.attrs)),
                ];
                self.fixed_group(parent, name, path, &children, meta)?
            }
            (Kind::Opaque, _) => self.pickled(parent, name, path, value, meta)?,
            // Scalars, text and arrays.
            _ => match native::native_data(value) {
                Some(data) => self.native_or_pickle(parent, name, path, value, data, meta)?,
                None => self.pickled(parent, name, path, value, meta)?,
            },
        }

        if let Value::Object(object) = value {
            record_owner(parent, name, object);
        }
        Ok(())
    }

    fn dataset(
        &self,
        parent: &mut Group,
        name: &str,
        data: Data,
        meta: &Metadata,
    ) -> std::result::Result<(), StoreError> {
        let dataset = parent.create_dataset(name, data)?;
        meta.write(dataset.attrs_mut());
        Ok(())
    }

    fn native_or_pickle(
        &self,
        parent: &mut Group,
        name: &str,
        path: &str,
        value: &Value,
        data: Data,
        meta: Metadata,
    ) -> Result<()> {
        match self.dataset(parent, name, data, &meta) {
            Ok(()) => Ok(()),
            Err(StoreError::UnsupportedShape { reason, .. }) if self.options.pickle => {
                tracing::warn!(path, %reason, "no native form, pickling");
                self.pickled(parent, name, path, value, meta)
            }
            Err(err) => Err(unsupported(path, err)),
        }
    }

    fn pickled(
        &self,
        parent: &mut Group,
        name: &str,
        path: &str,
        value: &Value,
        mut meta: Metadata,
    ) -> Result<()> {
        if !self.options.pickle {
            return Err(Error::UnsupportedShape {
                path: path.to_string(),
                reason: format!("{} has no native form and pickling is off", value.type_name()),
            });
        }
        meta.is_serialized = true;
        let bytes = pickle::dumps(value)?;
        self.dataset(parent, name, native::pickle_data(bytes), &meta)
            .map_err(|err| unsupported(path, err))
    }

    fn homogeneous(
        &self,
        parent: &mut Group,
        name: &str,
        path: &str,
        value: &Value,
        meta: Metadata,
    ) -> Result<()> {
        let items = value.sequence_items().unwrap_or_default();
        let reason = match native::sequence_data(&items) {
            Ok(data) => match self.dataset(parent, name, data, &meta) {
                Ok(()) => return Ok(()),
                Err(StoreError::UnsupportedShape { reason, .. }) => reason,
                Err(err) => return Err(err.into()),
            },
            Err(reason) => reason,
        };
        tracing::warn!(path, %reason, "no native array form, storing items one by one");
        self.sequence_group(parent, name, path, value, meta)
    }

    fn sequence_group(
        &self,
        parent: &mut Group,
        name: &str,
        path: &str,
        value: &Value,
        mut meta: Metadata,
    ) -> Result<()> {
        let items = value.sequence_items().unwrap_or_default();
        if matches!(value, Value::List(_) | Value::Tuple(_)) {
            meta.item_types = Some(items.iter().map(|v| v.type_name().to_string()).collect());
        }
        let group = parent.create_group(name)?;
        for (i, item) in items.iter().enumerate() {
            let key = ordinal_key(i, items.len());
            self.node(group, &key, &child_path(path, &key), item, "str")?;
        }
        meta.write(group.attrs_mut());
        Ok(())
    }

    fn mapping(
        &self,
        parent: &mut Group,
        name: &str,
        path: &str,
        value: &Value,
        meta: Metadata,
    ) -> Result<()> {
        let entries: Vec<(String, &Value, &str)> = match value {
            Value::Dict(map) => match key_names(map.keys()) {
                Some(names) => names
                    .into_iter()
                    .zip(map)
                    .map(|(name, (key, v))| (name, v, key.type_name()))
                    .collect(),
                None => return self.pickled(parent, name, path, value, meta),
            },
            Value::Bundle(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, v) in map {
                    match key_name(&Value::Str(key.clone())) {
                        Some(name) => entries.push((name, v, "str")),
                        None => {
                            tracing::warn!(
                                path,
                                key = %key,
                                "bundle key is not a valid name, pickling"
                            );
                            return self.pickled(parent, name, path, value, meta);
                        }
                    }
                }
                entries
            }
            _ => return self.pickled(parent, name, path, value, meta),
        };
        let group = parent.create_group(name)?;
        for (key, v, name_type) in entries {
            self.node(group, &key, &child_path(path, &key), v, name_type)?;
        }
        meta.write(group.attrs_mut());
        Ok(())
    }

    fn fixed_group(
        &self,
        parent: &mut Group,
        name: &str,
        path: &str,
        children: &[(&str, Value)],
        meta: Metadata,
    ) -> Result<()> {
        let group = parent.create_group(name)?;
        for (key, v) in children {
            self.node(group, key, &child_path(path, key), v, "str")?;
        }
        meta.write(group.attrs_mut());
        Ok(())
    }

    fn sparse(
        &self,
        parent: &mut Group,
        name: &str,
        path: &str,
        matrix: &SparseMatrix,
        meta: Metadata,
    ) -> Result<()> {
        let csr = matrix.to_csr();
        let index_array = |v: &[usize]| {
            Value::Array(NdArray::from(ndarray::Array1::from_iter(v.iter().map(|&i| i as i64))))
        };
        let (rows, cols) = matrix.shape();
        let children = [
            ("data", Value::Array(NdArray::from(ndarray::Array1::from(csr.data)))),
            ("indices", index_array(&csr.indices)),
            ("indptr", index_array(&csr.indptr)),
            ("shape", Value::Tuple(vec![Value::Int(rows as i64), Value::Int(cols as i64)])),
        ];
        self.fixed_group(parent, name, path, &children, meta)
    }
}

fn attrs_dict(attrs: &std::collections::BTreeMap<String, Value>) -> Value {
    Value::Dict(attrs.iter().map(|(k, v)| (Value::Str(k.clone()), v.clone())).collect())
}

/// Native when the store gives the value back unchanged, pickled otherwise.
fn encode_pickle_first(
    parent: &mut Group,
    name: &str,
    value: &Value,
    options: &Options,
) -> Result<()> {
    tracing::debug!(path = name, dtype = value.type_name(), "encoding node (pickle-first)");
    if let Some(data) = native::native_data(value) {
        let faithful = native::data_to_value(&data) == *value;
        if faithful || !options.pickle {
            match parent.create_dataset(name, data) {
                Ok(_) => return Ok(()),
                Err(StoreError::UnsupportedShape { reason, .. }) if options.pickle => {
                    tracing::warn!(path = name, %reason, "no native form, pickling");
                }
                Err(err) => return Err(unsupported(name, err)),
            }
        }
    } else if !options.pickle {
        return Err(Error::UnsupportedShape {
            path: name.to_string(),
            reason: format!("{} has no native form and pickling is off", value.type_name()),
        });
    }
    parent
        .create_dataset(name, native::pickle_data(pickle::dumps(value)?))
        .map_err(|err| unsupported(name, err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use h5obj_store::{Elements, Node};

    fn tagged() -> Options {
        Options::default()
    }

    #[test]
    fn ordinal_key_width() {
        assert_eq!(ordinal_key(0, 1), "key0");
        assert_eq!(ordinal_key(9, 10), "key9");
        assert_eq!(ordinal_key(3, 11), "key03");
        assert_eq!(ordinal_key(10, 11), "key10");
        assert_eq!(ordinal_key(7, 101), "key007");
    }

    #[test]
    fn scalar_gets_full_record() {
        let mut root = Group::default();
        encode(&mut root, "x", &Value::Int(5), &tagged()).unwrap();
        let attrs = root.dataset("x").unwrap().attrs();
        assert_eq!(attrs.get_str(meta::DTYPE), Some("int"));
        assert_eq!(attrs.get_str(meta::NTYPE), Some("str"));
        assert!(attrs.contains(meta::DATE));
        assert!(!meta::is_serialized(attrs));
    }

    #[test]
    fn none_list_falls_back_to_group() {
        let mut root = Group::default();
        encode(&mut root, "n", &Value::List(vec![Value::None, Value::None]), &tagged()).unwrap();
        let group = root.group("n").unwrap();
        assert_eq!(group.keys().collect::<Vec<_>>(), ["key0", "key1"]);
        assert_eq!(
            crate::decode(&root, "n", &tagged()).unwrap(),
            Value::List(vec![Value::None, Value::None])
        );
    }

    #[test]
    fn failed_encode_leaves_no_partial_node() {
        let mut root = Group::default();
        let value = Value::Dict(
            [
                (Value::from("a"), Value::Int(1)),
                (Value::from("z"), Value::Bytes(vec![])),
            ]
            .into_iter()
            .collect(),
        );
        let err = encode(&mut root, "d", &value, &tagged().with_pickle(false)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape { ref path, .. } if path == "d/z"));
        assert!(!root.contains("d"));
        assert!(root.is_empty());
    }

    #[test]
    fn homogeneous_list_is_one_dataset() {
        let mut root = Group::default();
        encode(&mut root, "v", &Value::from(vec![1.0, 2.0]), &tagged()).unwrap();
        assert_eq!(root.dataset("v").unwrap().value().elements, Elements::Float(vec![1.0, 2.0]));
    }

    #[test]
    fn empty_bytes_are_pickled() {
        let mut root = Group::default();
        encode(&mut root, "b", &Value::Bytes(vec![]), &tagged()).unwrap();
        assert!(meta::is_serialized(root.dataset("b").unwrap().attrs()));
        let no_pickle = tagged().with_pickle(false);
        let err = encode(&mut root, "c", &Value::Bytes(vec![]), &no_pickle).unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape { .. }));
    }

    #[test]
    fn object_marks_parent() {
        let mut root = Group::default();
        let value = Value::from(Object::new("shapes", "Circle"));
        encode(&mut root, "g/c", &value, &tagged()).unwrap();
        let g = root.group("g").unwrap();
        assert_eq!(g.attrs().get_str(meta::CLASS), Some("Circle"));
        assert_eq!(g.attrs().get_str(meta::MODULE), Some("shapes"));
        assert!(meta::is_serialized(g.dataset("c").unwrap().attrs()));
    }

    #[test]
    fn refusal_leaves_node() {
        let mut root = Group::default();
        encode(&mut root, "x", &Value::Int(1), &tagged()).unwrap();
        let before = root.clone();
        let keep = tagged().with_overwrite(false);
        let err = encode(&mut root, "x", &Value::Int(2), &keep).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(root, before);
    }

    #[test]
    fn pickle_first_keeps_faithful_natives() {
        let opts = tagged().with_profile(Profile::PickleFirst);
        let mut root = Group::default();
        encode(&mut root, "s", &Value::from("hi"), &opts).unwrap();
        encode(&mut root, "t", &Value::Tuple(vec![Value::Int(1)]), &opts).unwrap();
        assert!(root.dataset("s").unwrap().attrs().is_empty());
        assert!(matches!(
            root.get("s"),
            Some(Node::Dataset(d)) if d.value().elements == Elements::Str(vec!["hi".into()])
        ));

        assert!(matches!(
            &root.dataset("t").unwrap().value().elements,
            Elements::Opaque { tag, .. } if tag == native::PICKLE_TAG
        ));
    }
}
