//! The type tags written as `__DTYPE__` and `__NTYPE__`.
//!
//! The encoder writes [`Tag::name`]; the decoder parses with
//! [`Tag::from_name`] and dispatches with an exhaustive `match`.

use std::fmt;

use crate::sparse::SparseFormat;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    NoneType,
    Bool,
    Int,
    Long,
    Float,
    Complex,
    Str,
    Bytes,
    List,
    Tuple,
    Set,
    FrozenSet,
    Dict,
    Bundle,
    Ndarray,
    Matrix,
    Sparse(SparseFormat),
    CoFunc,
    CoFunc2d,
}

impl Tag {
    pub const ALL: [Tag; 25] = [
        Tag::NoneType,
        Tag::Bool,
        Tag::Int,
        Tag::Long,
        Tag::Float,
        Tag::Complex,
        Tag::Str,
        Tag::Bytes,
        Tag::List,
        Tag::Tuple,
        Tag::Set,
        Tag::FrozenSet,
        Tag::Dict,
        Tag::Bundle,
        Tag::Ndarray,
        Tag::Matrix,
        Tag::Sparse(SparseFormat::Csr),
        Tag::Sparse(SparseFormat::Csc),
        Tag::Sparse(SparseFormat::Coo),
        Tag::Sparse(SparseFormat::Bsr),
        Tag::Sparse(SparseFormat::Lil),
        Tag::Sparse(SparseFormat::Dok),
        Tag::Sparse(SparseFormat::Dia),
        Tag::CoFunc,
        Tag::CoFunc2d,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tag::NoneType => "NoneType",
            Tag::Bool => "bool",
            Tag::Int => "int",
            Tag::Long => "long",
            Tag::Float => "float",
            Tag::Complex => "complex",
            Tag::Str => "str",
            Tag::Bytes => "bytes",
            Tag::List => "list",
            Tag::Tuple => "tuple",
            Tag::Set => "set",
            Tag::FrozenSet => "frozenset",
            Tag::Dict => "dict",
            Tag::Bundle => "Bundle",
            Tag::Ndarray => "ndarray",
            Tag::Matrix => "matrix",
            Tag::Sparse(format) => format.type_name(),
            Tag::CoFunc => "coFunc",
            Tag::CoFunc2d => "coFunc2d",
        }
    }

    /// Parse a stored tag. `struct` is the older name of `Bundle`, and
    /// `unicode` the older name of `str`.
    pub fn from_name(name: &str) -> Option<Tag> {
        match name {
            "struct" => return Some(Tag::Bundle),
            "unicode" => return Some(Tag::Str),
            _ => {}
        }
        Tag::ALL.into_iter().find(|tag| tag.name() == name)
    }

    /// The tag a value is written under. `None` for user objects, whose tag
    /// is their class name.
    pub fn of(value: &Value) -> Option<Tag> {
        Some(match value {
            Value::None => Tag::NoneType,
            Value::Bool(_) => Tag::Bool,
            Value::Int(_) => Tag::Int,
            Value::Long(_) => Tag::Long,
            Value::Float(_) => Tag::Float,
            Value::Complex(_) => Tag::Complex,
            Value::Str(_) => Tag::Str,
            Value::Bytes(_) => Tag::Bytes,
            Value::List(_) => Tag::List,
            Value::Tuple(_) => Tag::Tuple,
            Value::Set(_) => Tag::Set,
            Value::FrozenSet(_) => Tag::FrozenSet,
            Value::Dict(_) => Tag::Dict,
            Value::Bundle(_) => Tag::Bundle,
            Value::Array(_) => Tag::Ndarray,
            Value::Matrix(_) => Tag::Matrix,
            Value::Sparse(s) => Tag::Sparse(s.format()),
            Value::Func(_) => Tag::CoFunc,
            Value::Func2d(_) => Tag::CoFunc2d,
            Value::Object(_) => return None,
        })
    }

    pub fn is_sequence(self) -> bool {
        matches!(self, Tag::List | Tag::Tuple | Tag::Set | Tag::FrozenSet)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
