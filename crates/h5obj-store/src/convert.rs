//! Translation between the store tree and the format layer's file image.

use std::collections::BTreeMap;

use h5obj_format::data_read::{
    read_as_bool, read_as_complex, read_as_f64, read_as_i128, read_as_i64, read_as_opaque,
    read_as_strings,
};
use h5obj_format::dataspace::{Dataspace, DataspaceType};
use h5obj_format::{Attribute, DatasetNode, Datatype, FormatError, GroupNode, Node as RawNode};
use num_complex::Complex64;

use crate::attrs::{AttrValue, Attrs};
use crate::data::{Data, Elements};
use crate::node::{Dataset, Group, Node};

/// Element type and raw bytes for a payload.
fn encode_elements(elements: &Elements) -> (Datatype, Vec<u8>) {
    match elements {
        Elements::Bool(v) => (Datatype::bool_enum(), v.iter().map(|&b| u8::from(b)).collect()),
        Elements::Int(v) => (Datatype::int(8), v.iter().flat_map(|x| x.to_le_bytes()).collect()),
        Elements::Long(v) => (Datatype::int(16), v.iter().flat_map(|x| x.to_le_bytes()).collect()),
        Elements::Float(v) => (
            Datatype::float(8),
            v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ),
        Elements::Complex(v) => (
            Datatype::complex128(),
            v.iter()
                .flat_map(|c| c.re.to_le_bytes().into_iter().chain(c.im.to_le_bytes()))
                .collect(),
        ),
        Elements::Str(v) => {
            let width = v.iter().map(String::len).max().unwrap_or(0).max(1);
            let mut raw = Vec::with_capacity(width * v.len());
            for s in v {
                raw.extend_from_slice(s.as_bytes());
                raw.resize(raw.len() + width - s.len(), 0);
            }
            (Datatype::fixed_string(width as u32), raw)
        }
        Elements::Opaque { tag, items } => {
            let width = items.first().map_or(1, Vec::len);
            (Datatype::opaque(width as u32, tag), items.concat())
        }
        Elements::Raw { datatype, bytes } => (datatype.clone(), bytes.clone()),
    }
}

fn decode_elements(datatype: &Datatype, raw: &[u8]) -> Result<Elements, FormatError> {
    Ok(match datatype {
        Datatype::Enumeration { .. } if datatype.is_bool() => {
            Elements::Bool(read_as_bool(raw, datatype)?)
        }
        // 16-byte integers stay Long whatever their values.
        Datatype::FixedPoint { size: 16, .. } => Elements::Long(read_as_i128(raw, datatype)?),
        Datatype::FixedPoint { .. } | Datatype::Enumeration { .. } => {
            match read_as_i64(raw, datatype) {
                Ok(v) => Elements::Int(v),
                Err(_) => Elements::Long(read_as_i128(raw, datatype)?),
            }
        }
        Datatype::FloatingPoint { .. } => Elements::Float(read_as_f64(raw, datatype)?),
        Datatype::Compound { .. } if datatype.is_complex() => Elements::Complex(
            read_as_complex(raw, datatype)?
                .into_iter()
                .map(|(re, im)| Complex64::new(re, im))
                .collect(),
        ),
        Datatype::String { .. } => Elements::Str(read_as_strings(raw, datatype)?),
        Datatype::Opaque { tag, .. } => Elements::Opaque {
            tag: tag.clone(),
            items: read_as_opaque(raw, datatype)?,
        },
        _ => Elements::Raw {
            datatype: datatype.clone(),
            bytes: raw.to_vec(),
        },
    })
}

fn attr_to_format(name: &str, value: &AttrValue) -> Attribute {
    let (elements, shape) = match value {
        AttrValue::Bool(b) => (Elements::Bool(vec![*b]), None),
        AttrValue::I64(v) => (Elements::Int(vec![*v]), None),
        AttrValue::F64(v) => (Elements::Float(vec![*v]), None),
        AttrValue::String(s) => (Elements::Str(vec![s.clone()]), None),
        AttrValue::I64Array(v) => (Elements::Int(v.clone()), Some(v.len())),
        AttrValue::F64Array(v) => (Elements::Float(v.clone()), Some(v.len())),
        AttrValue::StringArray(v) => (Elements::Str(v.clone()), Some(v.len())),
    };
    let (datatype, raw_data) = encode_elements(&elements);
    Attribute {
        name: name.to_string(),
        datatype,
        dataspace: match shape {
            Some(n) => Dataspace::simple(&[n as u64]),
            None => Dataspace::scalar(),
        },
        raw_data,
    }
}

fn attr_from_format(attr: &Attribute) -> Option<AttrValue> {
    let scalar = attr.dataspace.space_type == DataspaceType::Scalar;
    let elements = decode_elements(&attr.datatype, &attr.raw_data).ok()?;
    let value = match (elements, scalar) {
        (Elements::Bool(v), true) => AttrValue::Bool(*v.first()?),
        (Elements::Int(v), true) => AttrValue::I64(*v.first()?),
        (Elements::Float(v), true) => AttrValue::F64(*v.first()?),
        (Elements::Str(mut v), true) => AttrValue::String(v.pop()?),
        (Elements::Int(v), false) => AttrValue::I64Array(v),
        (Elements::Float(v), false) => AttrValue::F64Array(v),
        (Elements::Str(v), false) => AttrValue::StringArray(v),
        _ => return None,
    };
    Some(value)
}

fn attrs_from_format(attrs: &[Attribute]) -> Attrs {
    let mut out = Attrs::default();
    for attr in attrs {
        match attr_from_format(attr) {
            Some(value) => out.set(&attr.name, value),
            None => tracing::debug!(
                name = %attr.name,
                datatype = %attr.datatype,
                "skipping attribute"
            ),

        }
    }
    out
}

pub(crate) fn group_to_format(group: &Group) -> GroupNode {
    GroupNode {
        attrs: group.attrs().iter().map(|(k, v)| attr_to_format(k, v)).collect(),
        children: group
            .children()
            .iter()
            .map(|(name, node)| {
                let raw = match node {
                    Node::Group(g) => RawNode::Group(group_to_format(g)),
                    Node::Dataset(d) => {
                        let (datatype, raw) = encode_elements(&d.value().elements);
                        RawNode::Dataset(DatasetNode {
                            datatype,
                            shape: d.shape().iter().map(|&n| n as u64).collect(),
                            raw,
                            attrs: d.attrs().iter().map(|(k, v)| attr_to_format(k, v)).collect(),
                        })
                    }
                };
                (name.clone(), raw)
            })
            .collect(),
    }
}

pub(crate) fn group_from_format(group: GroupNode) -> Result<Group, FormatError> {
    let mut children = BTreeMap::new();
    for (name, raw) in group.children {
        let node = match raw {
            RawNode::Group(g) => Node::Group(group_from_format(g)?),
            RawNode::Dataset(d) => {
                let elements = decode_elements(&d.datatype, &d.raw)?;
                let shape = d.shape.iter().map(|&n| n as usize).collect();
                Node::Dataset(Dataset::new(
                    Data::with_shape(elements, shape),
                    attrs_from_format(&d.attrs),
                ))
            }
        };
        children.insert(name, node);
    }
    Ok(Group::from_parts(attrs_from_format(&group.attrs), children))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(group: &Group) -> Group {
        let bytes = h5obj_format::write_file(&group_to_format(group)).unwrap();
        group_from_format(h5obj_format::read_file(&bytes).unwrap()).unwrap()
    }

    #[test]
    fn every_element_kind_survives() {
        let mut root = Group::default();
        let payloads = [
            ("b", Data::vector(Elements::Bool(vec![true, false]))),
            ("i", Data::from(vec![1i64, -2])),
            ("l", Data::scalar(Elements::Long(vec![i128::MAX]))),
            ("f", Data::with_shape(Elements::Float(vec![1.0, 2.0, 3.0, 4.0]), vec![2, 2])),
            ("c", Data::scalar(Elements::Complex(vec![Complex64::new(1.0, 2.0)]))),
            ("s", Data::vector(Elements::Str(vec!["a".into(), "".into(), "long one".into()]))),
            (
                "o",
                Data::scalar(Elements::Opaque {
                    tag: "pickle".into(),
                    items: vec![b"\x80\x04N.".to_vec()],
                }),
            ),
        ];
        for (name, data) in payloads {
            root.create_dataset(name, data).unwrap();
        }
        assert_eq!(roundtrip(&root), root);
    }

    #[test]
    fn attributes_survive() {
        let mut root = Group::default();
        let g = root.create_group("g").unwrap();
        g.attrs_mut().set("__DTYPE__", "dict");
        g.attrs_mut().set("__PICKLED__", false);
        g.attrs_mut().set("n", 3i64);
        g.attrs_mut().set("x", 0.5);
        g.attrs_mut().set("list", AttrValue::StringArray(vec!["int".into(), "str".into()]));
        g.attrs_mut().set("empty", "");
        assert_eq!(roundtrip(&root), root);
    }

    #[test]
    fn unsigned_64_bit_overflow_reads_as_long() {
        let dt = Datatype::FixedPoint {
            size: 8,
            byte_order: h5obj_format::datatype::ByteOrder::LittleEndian,
            signed: false,
        };
        let elements = decode_elements(&dt, &u64::MAX.to_le_bytes()).unwrap();
        assert_eq!(elements, Elements::Long(vec![u64::MAX as i128]));
    }

    #[test]
    fn small_values_in_16_byte_integers_read_as_long() {
        let mut root = Group::default();
        root.create_dataset("l", Data::vector(Elements::Long(vec![1, -2])))
            .unwrap();
        root.create_dataset("s", Data::scalar(Elements::Long(vec![5])))
            .unwrap();
        assert_eq!(roundtrip(&root), root);

        let raw: Vec<u8> = 7i128.to_le_bytes().to_vec();
        assert_eq!(
            decode_elements(&Datatype::int(16), &raw).unwrap(),
            Elements::Long(vec![7])
        );
    }
}
