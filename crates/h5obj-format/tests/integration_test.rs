use h5obj_format::attribute::Attribute;
use h5obj_format::data_read::{
    read_as_bool, read_as_complex, read_as_i64, read_as_opaque, read_as_strings,
};
use h5obj_format::dataspace::Dataspace;
use h5obj_format::datatype::Datatype;
use h5obj_format::signature::find_signature;
use h5obj_format::superblock::Superblock;
use h5obj_format::{read_file, write_file, DatasetNode, GroupNode, Node};

fn string_attr(name: &str, value: &str) -> Attribute {
    Attribute {
        name: name.to_string(),
        datatype: Datatype::fixed_string(value.len().max(1) as u32),
        dataspace: Dataspace::scalar(),
        raw_data: if value.is_empty() { vec![0] } else { value.as_bytes().to_vec() },
    }
}

fn dataset(datatype: Datatype, shape: &[u64], raw: Vec<u8>) -> DatasetNode {
    DatasetNode {
        datatype,
        shape: shape.to_vec(),
        raw,
        attrs: vec![],
    }
}

fn sample_tree() -> GroupNode {
    let mut ints = dataset(
        Datatype::int(8),
        &[2, 3],
        (1i64..=6).flat_map(|v| v.to_le_bytes()).collect(),
    );
    ints.attrs.push(string_attr("__DTYPE__", "ndarray"));

    let mut complex_raw = Vec::new();
    for v in [1.5f64, -0.5] {
        complex_raw.extend_from_slice(&v.to_le_bytes());
    }

    let mut payload = GroupNode::default();
    payload.attrs.push(string_attr("__DTYPE__", "dict"));
    let flags = dataset(Datatype::bool_enum(), &[3], vec![1, 0, 1]);
    payload.children.push(("flags".into(), Node::Dataset(flags)));
    payload.children.push(("ints".into(), Node::Dataset(ints)));
    let z = dataset(Datatype::complex128(), &[], complex_raw);
    payload.children.push(("z".into(), Node::Dataset(z)));

    let mut root = GroupNode::default();
    let blob = dataset(Datatype::opaque(4, "pickle"), &[], b"\x80\x04N.".to_vec());
    root.children.push(("blob".into(), Node::Dataset(blob)));
    let name = dataset(Datatype::fixed_string(5), &[], b"hello".to_vec());
    root.children.push(("name".into(), Node::Dataset(name)));

    root.children.push(("payload".into(), Node::Group(payload)));
    root
}

#[test]
fn written_file_has_valid_superblock() {
    let bytes = write_file(&sample_tree()).unwrap();
    let offset = find_signature(&bytes).expect("signature");
    assert_eq!(offset, 0);
    let sb = Superblock::parse(&bytes, offset).unwrap();
    assert_eq!(sb.version, 3);
    assert_eq!(sb.eof_address, bytes.len() as u64);
}

#[test]
fn tree_roundtrip_preserves_everything() {
    let tree = sample_tree();
    let back = read_file(&write_file(&tree).unwrap()).unwrap();
    assert_eq!(back, tree);
}

#[test]
fn typed_values_after_roundtrip() {
    let back = read_file(&write_file(&sample_tree()).unwrap()).unwrap();

    let Some(Node::Group(payload)) = back.child("payload") else {
        panic!("payload should be a group");
    };
    let Some(Node::Dataset(ints)) = payload.child("ints") else {
        panic!("ints should be a dataset");
    };
    assert_eq!(ints.shape, vec![2, 3]);
    assert_eq!(read_as_i64(&ints.raw, &ints.datatype).unwrap(), vec![1, 2, 3, 4, 5, 6]);

    let Some(Node::Dataset(flags)) = payload.child("flags") else {
        panic!("flags should be a dataset");
    };
    assert_eq!(read_as_bool(&flags.raw, &flags.datatype).unwrap(), vec![true, false, true]);

    let Some(Node::Dataset(z)) = payload.child("z") else {
        panic!("z should be a dataset");
    };
    assert_eq!(read_as_complex(&z.raw, &z.datatype).unwrap(), vec![(1.5, -0.5)]);

    let Some(Node::Dataset(name)) = back.child("name") else {
        panic!("name should be a dataset");
    };
    assert_eq!(read_as_strings(&name.raw, &name.datatype).unwrap(), vec!["hello".to_string()]);

    let Some(Node::Dataset(blob)) = back.child("blob") else {
        panic!("blob should be a dataset");
    };
    assert_eq!(read_as_opaque(&blob.raw, &blob.datatype).unwrap(), vec![b"\x80\x04N.".to_vec()]);
    assert!(matches!(&blob.datatype, Datatype::Opaque { tag, .. } if tag == "pickle"));
}

#[test]
fn corrupted_header_is_detected() {
    let mut bytes = write_file(&sample_tree()).unwrap();
    // Flip a byte inside the root object header.
    bytes[60] ^= 0xff;
    assert!(read_file(&bytes).is_err());
}
