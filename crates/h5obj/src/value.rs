//! The closed value universe that can be persisted.
//!
//! [`Value`] is totally ordered so it can key a `BTreeMap` or populate a
//! `BTreeSet`: variants order by declaration, floats by
//! [`f64::total_cmp`], arrays by shape and then elements.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ndarray::{ArrayD, ArrayViewD, Dimension};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::cofunc::{CoFunc, CoFunc2d};
use crate::sparse::SparseMatrix;

/// An N-dimensional numeric array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NdArray {
    Bool(ArrayD<bool>),
    Int(ArrayD<i64>),
    Float(ArrayD<f64>),
    Complex(ArrayD<Complex64>),
}

impl NdArray {
    pub fn shape(&self) -> &[usize] {
        match self {
            NdArray::Bool(a) => a.shape(),
            NdArray::Int(a) => a.shape(),
            NdArray::Float(a) => a.shape(),
            NdArray::Complex(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// True when any dimension has length zero.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// numpy-style element type name.
    pub fn dtype(&self) -> &'static str {
        match self {
            NdArray::Bool(_) => "bool",
            NdArray::Int(_) => "int64",
            NdArray::Float(_) => "float64",
            NdArray::Complex(_) => "complex128",
        }
    }

    /// Elements in row-major order, as scalar values.
    pub fn to_values(&self) -> Vec<Value> {
        match self {
            NdArray::Bool(a) => a.iter().map(|&b| Value::Bool(b)).collect(),
            NdArray::Int(a) => a.iter().map(|&v| Value::Int(v)).collect(),
            NdArray::Float(a) => a.iter().map(|&v| Value::Float(v)).collect(),
            NdArray::Complex(a) => a.iter().map(|&v| Value::Complex(v)).collect(),
        }
    }

    /// Elements as `f64`, for numeric arrays. Complex arrays yield `None`.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            NdArray::Bool(a) => Some(a.iter().map(|&b| f64::from(u8::from(b))).collect()),
            NdArray::Int(a) => Some(a.iter().map(|&v| v as f64).collect()),
            NdArray::Float(a) => Some(a.iter().copied().collect()),
            NdArray::Complex(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            NdArray::Bool(_) => 0,
            NdArray::Int(_) => 1,
            NdArray::Float(_) => 2,
            NdArray::Complex(_) => 3,
        }
    }
}

fn cmp_complex(a: &Complex64, b: &Complex64) -> Ordering {
    a.re.total_cmp(&b.re).then_with(|| a.im.total_cmp(&b.im))
}

fn cmp_iter<'a, T: 'a>(
    a: impl Iterator<Item = &'a T>,
    mut b: impl Iterator<Item = &'a T>,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    for x in a {
        match b.next() {
            Some(y) => match cmp(x, y) {
                Ordering::Equal => {}
                other => return other,
            },
            None => return Ordering::Greater,
        }
    }
    if b.next().is_some() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

impl Ord for NdArray {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.shape().cmp(other.shape()))
            .then_with(|| match (self, other) {
                (NdArray::Bool(a), NdArray::Bool(b)) => cmp_iter(a.iter(), b.iter(), Ord::cmp),
                (NdArray::Int(a), NdArray::Int(b)) => cmp_iter(a.iter(), b.iter(), Ord::cmp),
                (NdArray::Float(a), NdArray::Float(b)) => {
                    cmp_iter(a.iter(), b.iter(), f64::total_cmp)
                }
                (NdArray::Complex(a), NdArray::Complex(b)) => {
                    cmp_iter(a.iter(), b.iter(), cmp_complex)
                }
                _ => Ordering::Equal,
            })
    }
}

impl PartialOrd for NdArray {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NdArray {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NdArray {}

macro_rules! ndarray_from {
    ($elem:ty, $variant:ident) => {
        impl<D: Dimension> From<ndarray::Array<$elem, D>> for NdArray {
            fn from(a: ndarray::Array<$elem, D>) -> NdArray {
                NdArray::$variant(a.into_dyn())
            }
        }
    };
}

ndarray_from!(bool, Bool);
ndarray_from!(i64, Int);
ndarray_from!(f64, Float);
ndarray_from!(Complex64, Complex);

/// An instance of a user-defined class. Always persisted pickled.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Object {
    pub module: String,
    pub class: String,
    pub fields: BTreeMap<String, Value>,
}

impl Object {
    pub fn new(module: impl Into<String>, class: impl Into<String>) -> Object {
        Object {
            module: module.into(),
            class: class.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Object {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A persistable value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    /// Arbitrary-width integer kept apart from `Int`.
    Long(#[serde(with = "long_text")] i128),
    Float(f64),
    Complex(Complex64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(BTreeSet<Value>),
    FrozenSet(BTreeSet<Value>),
    Dict(#[serde(with = "dict_pairs")] BTreeMap<Value, Value>),
    /// Attribute-style mapping with string keys.
    Bundle(BTreeMap<String, Value>),
    Array(NdArray),
    /// A two-dimensional array that stays two-dimensional.
    Matrix(NdArray),
    Sparse(SparseMatrix),
    Func(CoFunc),
    Func2d(CoFunc2d),
    Object(Object),
}

mod long_text {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &i128, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i128, D::Error> {
        String::deserialize(d)?.parse().map_err(D::Error::custom)
    }
}

// Pickled as a list of pairs: pickle dicts need hashable keys, and a
// `Value` key may hold a list.
mod dict_pairs {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::Value;

    pub fn serialize<S: Serializer>(map: &BTreeMap<Value, Value>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<Value, Value>, D::Error> {
        let pairs = Vec::<(Value, Value)>::deserialize(d)?;
        Ok(pairs.into_iter().collect())
    }
}

impl Value {
    /// The canonical type name written as `__DTYPE__`. For objects this is
    /// the class name.
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::FrozenSet(_) => "frozenset",
            Value::Dict(_) => "dict",
            Value::Bundle(_) => "Bundle",
            Value::Array(_) => "ndarray",
            Value::Matrix(_) => "matrix",
            Value::Sparse(s) => s.format().type_name(),
            Value::Func(_) => "coFunc",
            Value::Func2d(_) => "coFunc2d",
            Value::Object(o) => &o.class,
        }
    }

    /// Scalars in the sense of the homogeneity test: numbers, text and `None`.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::None
                | Value::Bool(_)
                | Value::Int(_)
                | Value::Long(_)
                | Value::Float(_)
                | Value::Complex(_)
                | Value::Str(_)
                | Value::Bytes(_)
        )
    }

    /// Number of items for containers, text and arrays.
    pub fn len(&self) -> Option<usize> {
        Some(match self {
            Value::Str(s) => s.chars().count(),
            Value::Bytes(b) => b.len(),
            Value::List(v) | Value::Tuple(v) => v.len(),
            Value::Set(s) | Value::FrozenSet(s) => s.len(),
            Value::Dict(d) => d.len(),
            Value::Bundle(b) => b.len(),
            Value::Array(a) | Value::Matrix(a) => a.shape().first().copied().unwrap_or(1),
            Value::Sparse(s) => s.shape().0,
            Value::Func(f) => f.x.len(),
            _ => return None,
        })
    }

    /// Items of a list, tuple, set or frozenset, in iteration order.
    pub fn sequence_items(&self) -> Option<Vec<&Value>> {
        match self {
            Value::List(v) | Value::Tuple(v) => Some(v.iter().collect()),
            Value::Set(s) | Value::FrozenSet(s) => Some(s.iter().collect()),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::None => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Long(_) => 3,
            Value::Float(_) => 4,
            Value::Complex(_) => 5,
            Value::Str(_) => 6,
            Value::Bytes(_) => 7,
            Value::List(_) => 8,
            Value::Tuple(_) => 9,
            Value::Set(_) => 10,
            Value::FrozenSet(_) => 11,
            Value::Dict(_) => 12,
            Value::Bundle(_) => 13,
            Value::Array(_) => 14,
            Value::Matrix(_) => 15,
            Value::Sparse(_) => 16,
            Value::Func(_) => 17,
            Value::Func2d(_) => 18,
            Value::Object(_) => 19,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        match (self, other) {
            (None, None) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Long(a), Long(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Complex(a), Complex(b)) => cmp_complex(a, b),
            (Str(a), Str(b)) => a.cmp(b),
            (Bytes(a), Bytes(b)) => a.cmp(b),
            (List(a), List(b)) | (Tuple(a), Tuple(b)) => a.cmp(b),
            (Set(a), Set(b)) | (FrozenSet(a), FrozenSet(b)) => a.cmp(b),
            (Dict(a), Dict(b)) => a.cmp(b),
            (Bundle(a), Bundle(b)) => a.cmp(b),
            (Array(a), Array(b)) | (Matrix(a), Matrix(b)) => a.cmp(b),
            (Sparse(a), Sparse(b)) => a.cmp(b),
            (Func(a), Func(b)) => a.cmp(b),
            (Func2d(a), Func2d(b)) => a.cmp(b),
            (Object(a), Object(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float(v)
    }
}

impl From<Complex64> for Value {
    fn from(v: Complex64) -> Value {
        Value::Complex(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Str(v)
    }
}

impl From<NdArray> for Value {
    fn from(v: NdArray) -> Value {
        Value::Array(v)
    }
}

impl From<SparseMatrix> for Value {
    fn from(v: SparseMatrix) -> Value {
        Value::Sparse(v)
    }
}

impl From<CoFunc> for Value {
    fn from(v: CoFunc) -> Value {
        Value::Func(v)
    }
}

impl From<CoFunc2d> for Value {
    fn from(v: CoFunc2d) -> Value {
        Value::Func2d(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Value {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Value {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// repr
// ---------------------------------------------------------------------------

/// Python `repr` of a float.
pub(crate) fn float_repr(v: f64) -> String {
    if v.is_nan() {
        "nan".into()
    } else if v.is_infinite() {
        String::from(if v > 0.0 { "inf" } else { "-inf" })
    } else {
        format!("{v:?}")
    }
}

fn complex_part(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{}", v as i64)
    } else {
        float_repr(v)
    }
}

pub(crate) fn complex_repr(c: Complex64) -> String {
    if c.re == 0.0 && c.re.is_sign_positive() {
        return format!("{}j", complex_part(c.im));
    }
    let sign = if c.im.is_sign_negative() { '-' } else { '+' };
    format!("({}{sign}{}j)", complex_part(c.re), complex_part(c.im.abs()))
}

fn quote_for(has_single: bool, has_double: bool) -> char {
    if has_single && !has_double {
        '"'
    } else {
        '\''
    }
}

pub(crate) fn str_repr(s: &str) -> String {
    let quote = quote_for(s.contains('\''), s.contains('"'));
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

pub(crate) fn bytes_repr(b: &[u8]) -> String {
    let quote = quote_for(b.contains(&b'\''), b.contains(&b'"'));
    let mut out = String::with_capacity(b.len() + 3);
    out.push('b');
    out.push(quote);
    for &byte in b {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            c if c as char == quote => {
                out.push('\\');
                out.push(quote);
            }
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\x{byte:02x}")),
        }
    }
    out.push(quote);
    out
}

fn nested<T>(view: ArrayViewD<'_, T>, elem: &dyn Fn(&T) -> String) -> String {
    if view.ndim() == 0 {
        return view.iter().next().map(elem).unwrap_or_default();
    }
    let parts: Vec<String> = view.outer_iter().map(|sub| nested(sub, elem)).collect();
    format!("[{}]", parts.join(", "))
}

impl fmt::Display for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match self {
            NdArray::Bool(a) => {
                nested(a.view(), &|b| String::from(if *b { "True" } else { "False" }))
            }

            NdArray::Int(a) => nested(a.view(), &|v| v.to_string()),
            NdArray::Float(a) => nested(a.view(), &|v| float_repr(*v)),
            NdArray::Complex(a) => nested(a.view(), &|v| complex_repr(*v)),
        };
        if self.is_empty() {
            write!(f, "{body}, shape={:?}, dtype={}", self.shape(), self.dtype())
        } else {
            write!(f, "{body}")
        }
    }
}

fn join<'a>(items: impl Iterator<Item = &'a Value>) -> String {
    items.map(Value::to_string).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}L"),
            Value::Float(v) => write!(f, "{}", float_repr(*v)),
            Value::Complex(c) => write!(f, "{}", complex_repr(*c)),
            Value::Str(s) => write!(f, "{}", str_repr(s)),
            Value::Bytes(b) => write!(f, "{}", bytes_repr(b)),
            Value::List(v) => write!(f, "[{}]", join(v.iter())),
            Value::Tuple(v) if v.len() == 1 => write!(f, "({},)", v[0]),
            Value::Tuple(v) => write!(f, "({})", join(v.iter())),
            Value::Set(s) if s.is_empty() => write!(f, "set()"),
            Value::Set(s) => write!(f, "{{{}}}", join(s.iter())),
            Value::FrozenSet(s) if s.is_empty() => write!(f, "frozenset()"),
            Value::FrozenSet(s) => write!(f, "frozenset({{{}}})", join(s.iter())),
            Value::Dict(d) => {
                let parts: Vec<String> = d.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Value::Bundle(b) => {
                let parts: Vec<String> = b.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "Bundle({})", parts.join(", "))
            }
            Value::Array(a) => write!(f, "array({a})"),
            Value::Matrix(a) => write!(f, "matrix({a})"),
            Value::Sparse(s) => write!(f, "{s}"),
            Value::Func(c) => write!(f, "{c}"),
            Value::Func2d(c) => write!(f, "{c}"),
            Value::Object(o) => write!(f, "<{}.{} object>", o.module, o.class),
        }
    }
}
