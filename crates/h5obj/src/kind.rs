//! Classification of values into the shapes the encoder knows how to store.

use std::collections::BTreeSet;

use crate::value::{float_repr, Value};

/// How a value is laid out in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    None,
    Bool,
    /// int, long, float or complex.
    Scalar,
    /// str or bytes.
    Text,
    /// An empty sequence or set, or an array with a zero-length dimension.
    Empty,
    /// A sequence of scalars that all share one type.
    Homogeneous,
    Heterogeneous,
    Mapping,
    Array,
    Sparse,
    Function,
    /// Only storable pickled.
    Opaque,
}

impl Kind {
    pub fn of(value: &Value) -> Kind {
        match value {
            Value::None => Kind::None,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Complex(_) => Kind::Scalar,
            Value::Str(_) | Value::Bytes(_) => Kind::Text,
            Value::List(_) | Value::Tuple(_) | Value::Set(_) | Value::FrozenSet(_) => {
                let items = value.sequence_items().unwrap_or_default();
                if items.is_empty() {
                    Kind::Empty
                } else if is_homogeneous(&items) {
                    Kind::Homogeneous
                } else {
                    Kind::Heterogeneous
                }
            }
            Value::Dict(d) => {
                if key_names(d.keys()).is_some() {
                    Kind::Mapping
                } else {
                    Kind::Opaque
                }
            }
            Value::Bundle(_) => Kind::Mapping,
            Value::Array(a) | Value::Matrix(a) => {
                if a.is_empty() {
                    Kind::Empty
                } else {
                    Kind::Array
                }
            }
            Value::Sparse(_) => Kind::Sparse,
            Value::Func(_) | Value::Func2d(_) => Kind::Function,
            Value::Object(_) => Kind::Opaque,
        }
    }
}

/// Every item is a scalar of the first item's type. Scans the whole sequence.
fn is_homogeneous(items: &[&Value]) -> bool {
    let Some(first) = items.first() else {
        return true;
    };
    items
        .iter()
        .all(|v| v.is_scalar() && v.type_name() == first.type_name())
}

/// The link name a dict key is stored under, if it has one.
pub fn key_name(key: &Value) -> Option<String> {
    let name = match key {
        Value::Str(s) => s.clone(),
        Value::Int(v) => v.to_string(),
        Value::Long(v) => v.to_string(),
        Value::Float(v) => float_repr(*v),
        Value::Bool(b) => String::from(if *b { "True" } else { "False" }),
        Value::None => "None".to_string(),
        _ => return None,
    };
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return None;
    }
    Some(name)
}

/// Names for all keys, or `None` if any key is unnameable or two keys
/// share a name.
pub fn key_names<'a>(keys: impl Iterator<Item = &'a Value>) -> Option<Vec<String>> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for key in keys {
        let name = key_name(key)?;
        if !seen.insert(name.clone()) {
            return None;
        }
        names.push(name);
    }
    Some(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use ndarray::Array2;

    use crate::value::{NdArray, Object};

    #[test]
    fn bool_is_not_a_number() {
        assert_eq!(Kind::of(&Value::Bool(true)), Kind::Bool);
        assert_eq!(Kind::of(&Value::Long(1)), Kind::Scalar);
        assert_eq!(Kind::of(&Value::Bytes(vec![])), Kind::Text);
    }

    #[test]
    fn sequences() {
        assert_eq!(Kind::of(&Value::List(vec![])), Kind::Empty);
        assert_eq!(Kind::of(&Value::from(vec![1i64, 2, 3])), Kind::Homogeneous);
        assert_eq!(
            Kind::of(&Value::List(vec![Value::Int(1), Value::from("a")])),
            Kind::Heterogeneous
        );
        // The mismatch is at the end, so a sampled check would miss it.
        let mut long: Vec<Value> = (0..50).map(Value::Int).collect();
        long.push(Value::Float(1.0));
        assert_eq!(Kind::of(&Value::Tuple(long)), Kind::Heterogeneous);
        let nested = Value::List(vec![Value::List(vec![]), Value::List(vec![])]);
        assert_eq!(Kind::of(&nested), Kind::Heterogeneous);
    }

    #[test]
    fn dict_keys_decide_mapping() {
        let mut d = BTreeMap::new();
        d.insert(Value::from("a"), Value::Int(1));
        d.insert(Value::Int(1), Value::Int(2));
        assert_eq!(Kind::of(&Value::Dict(d.clone())), Kind::Mapping);
        d.insert(Value::Str("1".into()), Value::None);
        assert_eq!(Kind::of(&Value::Dict(d.clone())), Kind::Opaque, "names collide");
        d.clear();
        d.insert(Value::Tuple(vec![Value::Int(1)]), Value::None);
        assert_eq!(Kind::of(&Value::Dict(d)), Kind::Opaque);
    }

    #[test]
    fn unnameable_strings() {
        assert_eq!(key_name(&Value::from("a/b")), None);
        assert_eq!(key_name(&Value::from("")), None);
        assert_eq!(key_name(&Value::from(".")), None);
        assert_eq!(key_name(&Value::Float(0.5)), Some("0.5".into()));
    }

    #[test]
    fn arrays_and_the_rest() {
        let empty = NdArray::from(Array2::<f64>::zeros((3, 0)));
        assert_eq!(Kind::of(&Value::Matrix(empty)), Kind::Empty);
        let full = NdArray::from(Array2::<f64>::zeros((2, 2)));
        assert_eq!(Kind::of(&Value::Array(full)), Kind::Array);
        assert_eq!(Kind::of(&Value::from(Object::new("m", "C"))), Kind::Opaque);
    }
}
