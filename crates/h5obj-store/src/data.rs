//! Dataset payloads: a typed element vector plus a shape.

use std::fmt;

use h5obj_format::Datatype;
use num_complex::Complex64;

/// Flat element storage, in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum Elements {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    /// 16-byte integers.
    Long(Vec<i128>),
    Float(Vec<f64>),
    Complex(Vec<Complex64>),
    Str(Vec<String>),
    /// Fixed-size opaque blobs, all of the same length.
    Opaque { tag: String, items: Vec<Vec<u8>> },
    /// Data of a type the store does not interpret, kept byte-for-byte.
    Raw { datatype: Datatype, bytes: Vec<u8> },
}

impl Elements {
    pub fn len(&self) -> usize {
        match self {
            Elements::Bool(v) => v.len(),
            Elements::Int(v) => v.len(),
            Elements::Long(v) => v.len(),
            Elements::Float(v) => v.len(),
            Elements::Complex(v) => v.len(),
            Elements::Str(v) => v.len(),
            Elements::Opaque { items, .. } => items.len(),
            Elements::Raw { datatype, bytes } => match datatype.type_size() {
                0 => 0,
                size => bytes.len() / size as usize,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            Elements::Bool(_) => DType::Bool,
            Elements::Int(_) => DType::Int64,
            Elements::Long(_) => DType::Int128,
            Elements::Float(_) => DType::Float64,
            Elements::Complex(_) => DType::Complex128,
            Elements::Str(v) => DType::String(v.iter().map(String::len).max().unwrap_or(0).max(1)),
            Elements::Opaque { tag, .. } => DType::Opaque(tag.clone()),
            Elements::Raw { datatype, .. } => DType::Other(datatype.to_string()),
        }
    }
}

/// Simplified element type, for listings and projections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DType {
    Bool,
    Int64,
    Int128,
    Float64,
    Complex128,
    /// Fixed-length string of the given byte width.
    String(usize),
    Opaque(String),
    Other(String),
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Bool => write!(f, "bool"),
            DType::Int64 => write!(f, "int64"),
            DType::Int128 => write!(f, "int128"),
            DType::Float64 => write!(f, "float64"),
            DType::Complex128 => write!(f, "complex128"),
            DType::String(n) => write!(f, "|S{n}"),
            DType::Opaque(tag) => write!(f, "opaque({tag})"),
            DType::Other(desc) => write!(f, "{desc}"),
        }
    }
}

/// A dataset payload. An empty shape is a scalar holding one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    pub elements: Elements,
    pub shape: Vec<usize>,
}

impl Data {
    pub fn scalar(elements: Elements) -> Data {
        Data {
            elements,
            shape: Vec::new(),
        }
    }

    /// A 1-D array as long as the element vector.
    pub fn vector(elements: Elements) -> Data {
        let n = elements.len();
        Data {
            elements,
            shape: vec![n],
        }
    }

    pub fn with_shape(elements: Elements, shape: Vec<usize>) -> Data {
        Data { elements, shape }
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Number of elements the shape calls for.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn dtype(&self) -> DType {
        self.elements.dtype()
    }

    /// Why this payload cannot be stored, if it cannot.
    pub(crate) fn check(&self) -> Option<String> {
        let have = self.elements.len();
        if have != self.size() {
            return Some(format!(
                "{have} elements do not fill shape {:?}",
                self.shape
            ));
        }
        if let Elements::Str(v) = &self.elements {
            // Fixed-length strings are NUL padded, so a NUL would end the text.
            if v.iter().any(|s| s.contains('\0')) {
                return Some("string contains a NUL character".into());
            }
        }
        if let Elements::Opaque { items, .. } = &self.elements {
            let width = items.first().map_or(1, Vec::len);
            if width == 0 {
                return Some("zero-length opaque element".into());
            }
            if items.iter().any(|i| i.len() != width) {
                return Some("opaque elements of different lengths".into());
            }
        }
        None
    }
}

impl From<bool> for Data {
    fn from(v: bool) -> Data {
        Data::scalar(Elements::Bool(vec![v]))
    }
}

impl From<i64> for Data {
    fn from(v: i64) -> Data {
        Data::scalar(Elements::Int(vec![v]))
    }
}

impl From<f64> for Data {
    fn from(v: f64) -> Data {
        Data::scalar(Elements::Float(vec![v]))
    }
}

impl From<&str> for Data {
    fn from(v: &str) -> Data {
        Data::scalar(Elements::Str(vec![v.to_string()]))
    }
}

impl From<Vec<i64>> for Data {
    fn from(v: Vec<i64>) -> Data {
        Data::vector(Elements::Int(v))
    }
}

impl From<Vec<f64>> for Data {
    fn from(v: Vec<f64>) -> Data {
        Data::vector(Elements::Float(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_has_one_element() {
        let d = Data::from(3i64);
        assert!(d.is_scalar());
        assert_eq!(d.size(), 1);
        assert_eq!(d.check(), None);
    }

    #[test]
    fn shape_mismatch_reported() {
        let d = Data::with_shape(Elements::Float(vec![1.0, 2.0, 3.0]), vec![2, 2]);
        assert!(d.check().unwrap().contains("shape"));
    }

    #[test]
    fn opaque_lengths_checked() {
        let d = Data::vector(Elements::Opaque {
            tag: "bytes".into(),
            items: vec![b"ab".to_vec(), b"c".to_vec()],
        });
        assert!(d.check().is_some());
        let empty = Data::scalar(Elements::Opaque {
            tag: "bytes".into(),
            items: vec![Vec::new()],
        });
        assert!(empty.check().is_some());
    }

    #[test]
    fn nul_in_strings_rejected() {
        assert!(Data::from("a\0b").check().unwrap().contains("NUL"));
        let list = Data::vector(Elements::Str(vec!["x\0".into(), "y".into()]));
        assert!(list.check().is_some());
        assert_eq!(Data::from("ab").check(), None);
    }

    #[test]
    fn dtype_names() {
        assert_eq!(Data::from(vec![1.0, 2.0]).dtype().to_string(), "float64");
        assert_eq!(Data::from("hello").dtype(), DType::String(5));
        assert_eq!(DType::String(5).to_string(), "|S5");
    }
}
