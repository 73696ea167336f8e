//! Conversions between values and native dataset payloads.

use h5obj_store::{Data, Elements};
use ndarray::{ArrayD, IxDyn};
use num_complex::Complex64;

use crate::tag::Tag;
use crate::value::{NdArray, Value};

/// Opaque tag of a `bytes` payload.
pub const BYTES_TAG: &str = "bytes";
/// Opaque tag of a pickled payload.
pub const PICKLE_TAG: &str = "pickle";

pub fn pickle_data(bytes: Vec<u8>) -> Data {
    Data::scalar(Elements::Opaque {
        tag: PICKLE_TAG.to_string(),
        items: vec![bytes],
    })
}

pub fn text_data(s: &str) -> Data {
    Data::scalar(Elements::Str(vec![s.to_string()]))
}

/// A scalar dataset payload for numbers and text.
pub fn scalar_data(value: &Value) -> Option<Data> {
    let elements = match value {
        Value::Bool(b) => Elements::Bool(vec![*b]),
        Value::Int(v) => Elements::Int(vec![*v]),
        Value::Long(v) => Elements::Long(vec![*v]),
        Value::Float(v) => Elements::Float(vec![*v]),
        Value::Complex(c) => Elements::Complex(vec![*c]),
        Value::Str(s) => Elements::Str(vec![s.clone()]),
        Value::Bytes(b) => Elements::Opaque {
            tag: BYTES_TAG.to_string(),
            items: vec![b.clone()],
        },
        _ => return None,
    };
    Some(Data::scalar(elements))
}

fn collect_as<T>(items: &[&Value], pick: impl Fn(&Value) -> Option<T>) -> Result<Vec<T>, String> {
    items
        .iter()
        .map(|v| pick(v).ok_or_else(|| format!("mixed item types ({})", v.type_name())))
        .collect()
}

/// A 1-D payload for a sequence of same-typed scalars.
pub fn sequence_data(items: &[&Value]) -> Result<Data, String> {
    let Some(first) = items.first() else {
        return Err("empty sequence".into());
    };
    let elements = match first {
        Value::Bool(_) => Elements::Bool(collect_as(items, |v| match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        })?),
        Value::Int(_) => Elements::Int(collect_as(items, |v| match v {
            Value::Int(x) => Some(*x),
            _ => None,
        })?),
        Value::Long(_) => Elements::Long(collect_as(items, |v| match v {
            Value::Long(x) => Some(*x),
            _ => None,
        })?),
        Value::Float(_) => Elements::Float(collect_as(items, |v| match v {
            Value::Float(x) => Some(*x),
            _ => None,
        })?),
        Value::Complex(_) => Elements::Complex(collect_as(items, |v| match v {
            Value::Complex(x) => Some(*x),
            _ => None,
        })?),
        Value::Str(_) => Elements::Str(collect_as(items, |v| match v {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        })?),
        Value::Bytes(_) => Elements::Opaque {
            tag: BYTES_TAG.to_string(),
            items: collect_as(items, |v| match v {
                Value::Bytes(b) => Some(b.clone()),
                _ => None,
            })?,
        },
        other => return Err(format!("{} items have no native array form", other.type_name())),
    };
    Ok(Data::vector(elements))
}

pub fn array_data(array: &NdArray) -> Data {
    let elements = match array {
        NdArray::Bool(a) => Elements::Bool(a.iter().copied().collect()),
        NdArray::Int(a) => Elements::Int(a.iter().copied().collect()),
        NdArray::Float(a) => Elements::Float(a.iter().copied().collect()),
        NdArray::Complex(a) => Elements::Complex(a.iter().copied().collect()),
    };
    Data::with_shape(elements, array.shape().to_vec())
}

/// Any native payload the value has: scalars, same-typed sequences and
/// arrays.
pub fn native_data(value: &Value) -> Option<Data> {
    match value {
        Value::Array(a) | Value::Matrix(a) => Some(array_data(a)),
        Value::List(_) | Value::Tuple(_) | Value::Set(_) | Value::FrozenSet(_) => {
            sequence_data(&value.sequence_items()?).ok()
        }
        other => scalar_data(other),
    }
}

/// Payload elements as scalar values, in storage order.
pub fn items(data: &Data) -> Vec<Value> {
    match &data.elements {
        Elements::Bool(v) => v.iter().map(|&b| Value::Bool(b)).collect(),
        Elements::Int(v) => v.iter().map(|&x| Value::Int(x)).collect(),
        Elements::Long(v) => v.iter().map(|&x| Value::Long(x)).collect(),
        Elements::Float(v) => v.iter().map(|&x| Value::Float(x)).collect(),
        Elements::Complex(v) => v.iter().map(|&x| Value::Complex(x)).collect(),
        Elements::Str(v) => v.iter().cloned().map(Value::Str).collect(),
        Elements::Opaque { items, .. } => items.iter().cloned().map(Value::Bytes).collect(),
        Elements::Raw { bytes, .. } => vec![Value::Bytes(bytes.clone())],
    }
}

pub fn is_sentinel(data: &Data, sentinel: &str) -> bool {
    data.size() == 1
        && matches!(&data.elements, Elements::Str(v) if v.len() == 1 && v[0] == sentinel)
}

fn shaped<T>(shape: &[usize], v: Vec<T>) -> Result<ArrayD<T>, String> {
    ArrayD::from_shape_vec(IxDyn(shape), v)
        .map_err(|e| format!("payload does not fit shape {shape:?}: {e}"))
}

/// The payload as an N-dimensional array.
pub fn data_to_array(data: &Data) -> Result<NdArray, String> {
    let shape = &data.shape;
    Ok(match &data.elements {
        Elements::Bool(v) => NdArray::Bool(shaped(shape, v.clone())?),
        Elements::Int(v) => NdArray::Int(shaped(shape, v.clone())?),
        Elements::Long(v) => {
            let ints: Result<Vec<i64>, _> = v.iter().map(|&x| i64::try_from(x)).collect();
            match ints {
                Ok(ints) => NdArray::Int(shaped(shape, ints)?),
                Err(_) => NdArray::Float(shaped(shape, v.iter().map(|&x| x as f64).collect())?),
            }
        }

        Elements::Float(v) => NdArray::Float(shaped(shape, v.clone())?),
        Elements::Complex(v) => NdArray::Complex(shaped(shape, v.clone())?),
        other => return Err(format!("{} payload is not numeric", other.dtype())),
    })
}

/// The closest value to an untagged payload: scalars for scalar payloads,
/// arrays for numeric ones, lists otherwise.
pub fn data_to_value(data: &Data) -> Value {
    let mut values = items(data);
    if data.is_scalar() && values.len() == 1 {
        return values.pop().unwrap_or(Value::None);
    }
    match data_to_array(data) {
        Ok(array) => Value::Array(array),
        Err(_) => Value::List(values),
    }
}

/// Cast a scalar payload to the exact type named by `tag`.
pub fn cast_scalar(tag: Tag, data: &Data) -> Result<Value, String> {
    let mut values = items(data);
    if values.len() != 1 {
        return Err(format!("expected one {tag} element, found {}", values.len()));
    }
    let value = values.pop().unwrap_or(Value::None);
    let cast = match (tag, value) {
        (Tag::Bool, Value::Bool(b)) => Some(Value::Bool(b)),
        (Tag::Bool, Value::Int(x)) => Some(Value::Bool(x != 0)),
        (Tag::Int, Value::Int(x)) => Some(Value::Int(x)),
        (Tag::Int, Value::Bool(b)) => Some(Value::Int(i64::from(b))),
        (Tag::Int, Value::Long(x)) => i64::try_from(x).ok().map(Value::Int),
        (Tag::Long, Value::Long(x)) => Some(Value::Long(x)),
        (Tag::Long, Value::Int(x)) => Some(Value::Long(i128::from(x))),
        (Tag::Float, Value::Float(x)) => Some(Value::Float(x)),
        (Tag::Float, Value::Int(x)) => Some(Value::Float(x as f64)),
        (Tag::Complex, Value::Complex(c)) => Some(Value::Complex(c)),
        (Tag::Complex, Value::Float(x)) => Some(Value::Complex(Complex64::new(x, 0.0))),
        (Tag::Str, Value::Str(s)) => Some(Value::Str(s)),
        (Tag::Str, Value::Bytes(b)) => String::from_utf8(b).ok().map(Value::Str),
        (Tag::Bytes, Value::Bytes(b)) => Some(Value::Bytes(b)),
        (Tag::Bytes, Value::Str(s)) => Some(Value::Bytes(s.into_bytes())),
        _ => None,
    };
    cast.ok_or_else(|| format!("{} payload cannot be read as {tag}", data.dtype()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sequence_payloads() {
        let a = Value::from("ab");
        let b = Value::from("c");
        let data = sequence_data(&[&a, &b]).unwrap();
        assert_eq!(data.shape, [2]);
        assert_eq!(items(&data), [a, b]);
        assert!(sequence_data(&[&Value::None]).is_err());
    }

    #[test]
    fn arrays_keep_shape() {
        let array = NdArray::from(array![[1i64, 2, 3], [4, 5, 6]]);
        let data = array_data(&array);
        assert_eq!(data.shape, [2, 3]);
        assert_eq!(data_to_array(&data).unwrap(), array);
        assert_eq!(data_to_value(&data), Value::Array(array));
    }

    #[test]
    fn scalar_casts() {
        let data = Data::from(3i64);
        assert_eq!(cast_scalar(Tag::Float, &data), Ok(Value::Float(3.0)));
        assert_eq!(cast_scalar(Tag::Long, &data), Ok(Value::Long(3)));
        assert!(cast_scalar(Tag::Str, &data).is_err());
        assert_eq!(data_to_value(&data), Value::Int(3));
    }

    #[test]
    fn sentinels() {
        assert!(is_sentinel(&text_data("__EMPTY__"), "__EMPTY__"));
        assert!(!is_sentinel(&text_data("__EMPTY__"), "__NONE__"));
    }

    #[test]
    fn string_vectors_read_as_lists() {
        let data = Data::vector(Elements::Str(vec!["x".into(), "y".into()]));
        assert_eq!(data_to_value(&data), Value::List(vec!["x".into(), "y".into()]));
    }
}
