//! `h5load` projections: reduce a loaded value before printing it.

use anyhow::{anyhow, bail, Result};
use h5obj::{NdArray, Value};
use ndarray::Axis;

/// Applied in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub dtype: bool,
    pub x: bool,
    pub y: bool,
    pub attrs: bool,
    pub item: Option<i64>,
    pub max: bool,
    pub min: bool,
    pub len: bool,
}

impl Projection {
    pub fn is_identity(&self) -> bool {
        *self == Projection::default()
    }

    pub fn apply(&self, mut value: Value) -> Result<Value> {
        if self.dtype {
            value = Value::Str(value.type_name().to_string());
        }
        if self.x {
            value = field(value, "x")?;
        }
        if self.y {
            value = field(value, "y")?;
        }
        if self.attrs {
            value = field(value, "attrs")?;
        }
        if let Some(index) = self.item {
            value = item(&value, index)?;
        }
        if self.max {
            value = extreme(&value, "max")?;
        }
        if self.min {
            value = extreme(&value, "min")?;
        }
        if self.len {
            let len = value
                .len()
                .ok_or_else(|| anyhow!("object of type '{}' has no len()", value.type_name()))?;
            value = Value::Int(len as i64);
        }
        Ok(value)
    }
}

fn field(value: Value, name: &str) -> Result<Value> {
    Ok(match (value, name) {
        (Value::Func(f), "x") => Value::Array(f.x),
        (Value::Func(f), "y") => Value::Array(f.y),
        (Value::Func(f), "attrs") => Value::Bundle(f.attrs),
        (Value::Func2d(f), "x") => Value::Array(f.x),
        (Value::Func2d(f), "y") => Value::Array(f.y),
        (Value::Func2d(f), "attrs") => Value::Bundle(f.attrs),
        (Value::Bundle(mut map), _) => map
            .remove(name)
            .ok_or_else(|| anyhow!("'Bundle' object has no attribute '{name}'"))?,
        (Value::Object(mut object), _) => object
            .fields
            .remove(name)
            .ok_or_else(|| anyhow!("'{}' object has no attribute '{name}'", object.class))?,
        (other, _) => bail!("'{}' object has no attribute '{name}'", other.type_name()),
    })
}

fn wrap(index: i64, len: usize) -> Result<usize> {
    let at = if index < 0 { index + len as i64 } else { index };
    usize::try_from(at)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| anyhow!("index {index} out of range"))
}

fn array_item(array: &NdArray, index: i64) -> Result<Value> {
    let len = array.shape().first().copied().ok_or_else(|| anyhow!("too many indices for array"))?;
    let i = wrap(index, len)?;
    macro_rules! take {
        ($a:expr, $variant:ident, $scalar:ident) => {{
            let sub = $a.index_axis(Axis(0), i);
            if sub.ndim() == 0 {
                Value::$scalar(sub.iter().next().copied().ok_or_else(|| anyhow!("empty element"))?)
            } else {
                Value::Array(NdArray::$variant(sub.to_owned()))
            }
        }};
    }
    Ok(match array {
        NdArray::Bool(a) => take!(a, Bool, Bool),
        NdArray::Int(a) => take!(a, Int, Int),
        NdArray::Float(a) => take!(a, Float, Float),
        NdArray::Complex(a) => take!(a, Complex, Complex),
    })
}

fn item(value: &Value, index: i64) -> Result<Value> {
    match value {
        Value::List(v) | Value::Tuple(v) => Ok(v[wrap(index, v.len())?].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(chars[wrap(index, chars.len())?].to_string()))
        }
        Value::Bytes(b) => Ok(Value::Int(i64::from(b[wrap(index, b.len())?]))),
        Value::Dict(map) => map
            .get(&Value::Int(index))
            .cloned()
            .ok_or_else(|| anyhow!("KeyError: {index}")),
        Value::Array(a) | Value::Matrix(a) => array_item(a, index),
        other => bail!("'{}' object is not subscriptable", other.type_name()),
    }
}

fn extreme(value: &Value, which: &str) -> Result<Value> {
    let items: Vec<Value> = match value {
        Value::Array(a) | Value::Matrix(a) => a.to_values(),
        Value::Dict(map) => map.keys().cloned().collect(),
        Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
        Value::Func(f) => f.y.to_values(),
        other => match other.sequence_items() {
            Some(items) => items.into_iter().cloned().collect(),
            None => bail!("'{}' object is not iterable", other.type_name()),
        },
    };
    let found = if which == "max" {
        items.into_iter().max()
    } else {
        items.into_iter().min()
    };
    found.ok_or_else(|| anyhow!("{which}() arg is an empty sequence"))
}
