//! Byte serialization of values that have no native form.
//!
//! Values are pickled through `serde_pickle` inside a small envelope
//! (`{"h5obj": 1, "value": ...}`). Plain Python pickles of builtin types
//! (None, bool, int, float, str, bytes, list, tuple, set, frozenset, dict)
//! also load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_pickle::value::{HashableValue, Value as PyValue};
use serde_pickle::{DeOptions, SerOptions};

use crate::error::{Error, Result};
use crate::value::Value;

const ENVELOPE_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    h5obj: u32,
    value: &'a Value,
}

#[derive(Deserialize)]
struct Envelope {
    h5obj: u32,
    value: Value,
}

pub fn dumps(value: &Value) -> Result<Vec<u8>> {
    let envelope = EnvelopeRef {
        h5obj: ENVELOPE_VERSION,
        value,
    };
    Ok(serde_pickle::to_vec(&envelope, SerOptions::new())?)
}

pub fn loads(bytes: &[u8]) -> Result<Value> {
    loads_inner(bytes).map_err(|reason| Error::Deserialization {
        path: String::from("<bytes>"),
        reason,
    })
}

pub(crate) fn loads_inner(bytes: &[u8]) -> std::result::Result<Value, String> {
    if let Ok(envelope) = serde_pickle::from_slice::<Envelope>(bytes, DeOptions::new()) {
        if envelope.h5obj != ENVELOPE_VERSION {
            return Err(format!("unsupported envelope version {}", envelope.h5obj));
        }
        return Ok(envelope.value);
    }
    let py = serde_pickle::value_from_slice(bytes, DeOptions::new()).map_err(|e| e.to_string())?;
    from_python(py)
}

fn collect<T, C>(
    items: impl IntoIterator<Item = T>,
    f: fn(T) -> std::result::Result<Value, String>,
) -> std::result::Result<C, String>
where
    C: FromIterator<Value>,
{
    items.into_iter().map(f).collect()
}

fn from_hashable(v: HashableValue) -> std::result::Result<Value, String> {
    from_python(v.into_value())
}

fn from_python(v: PyValue) -> std::result::Result<Value, String> {
    Ok(match v {
        PyValue::None => Value::None,
        PyValue::Bool(b) => Value::Bool(b),
        PyValue::I64(v) => Value::Int(v),
        PyValue::Int(big) => Value::Long(
            big.to_string()
                .parse()
                .map_err(|_| format!("integer {big} does not fit in 128 bits"))?,
        ),
        PyValue::F64(v) => Value::Float(v),
        PyValue::Bytes(b) => Value::Bytes(b),
        PyValue::String(s) => Value::Str(s),
        PyValue::List(items) => Value::List(collect(items, from_python)?),
        PyValue::Tuple(items) => Value::Tuple(collect(items, from_python)?),
        PyValue::Set(items) => Value::Set(collect(items, from_hashable)?),
        PyValue::FrozenSet(items) => Value::FrozenSet(collect(items, from_hashable)?),
        PyValue::Dict(map) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                out.insert(from_hashable(k)?, from_python(v)?);
            }
            Value::Dict(out)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use num_complex::Complex64;

    use crate::value::{NdArray, Object};

    #[test]
    fn value_survives() {
        let mut dict = BTreeMap::new();
        dict.insert(Value::List(vec![Value::Int(1)]), Value::Long(i128::MAX));
        dict.insert(Value::None, Value::Complex(Complex64::new(1.0, -1.0)));
        let value = Value::Tuple(vec![
            Value::Dict(dict),
            Value::Array(NdArray::from(array![[1.0, 2.0], [3.0, 4.0]])),
            Value::from(Object::new("shapes", "Circle").with_field("r", 2.0)),
            Value::Bytes(vec![]),
        ]);
        assert_eq!(loads(&dumps(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn python_protocol_0_pickle() {
        // pickle.dumps([1, 'a', None], protocol=0)
        let bytes = b"(lp0\nI1\naVa\np1\naNa.";
        assert_eq!(
            loads(bytes).unwrap(),
            Value::List(vec![Value::Int(1), Value::from("a"), Value::None])
        );
    }

    #[test]
    fn garbage_is_a_deserialization_error() {
        assert!(matches!(loads(b"not a pickle"), Err(Error::Deserialization { .. })));
    }
}
