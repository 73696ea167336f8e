use h5obj::{decode, encode, pickle, Options, Profile, Value};
use h5obj_store::{File, Group, Mode};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::None),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<i128>().prop_map(Value::Long),
        (-1e9f64..1e9).prop_map(Value::Float),
        "[a-z ]{0,8}".prop_map(Value::Str),
        "(?s).{0,8}".prop_map(Value::Str),
        vec(any::<u8>(), 1..6).prop_map(Value::Bytes),
    ]
}

fn nested() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..6).prop_map(Value::List),
            vec(inner.clone(), 0..6).prop_map(Value::Tuple),
            btree_map("[a-z]{1,6}", inner.clone(), 0..4).prop_map(|m| {
                Value::Dict(m.into_iter().map(|(k, v)| (Value::Str(k), v)).collect())
            }),

            btree_map(any::<i32>(), inner.clone(), 0..4).prop_map(|m| {
                Value::Dict(m.into_iter().map(|(k, v)| (Value::Int(i64::from(k)), v)).collect())
            }),
            btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Bundle),
        ]
    })
}

/// Save under `v`, close the file, reopen it and load `v` back.
fn through_disk(value: &Value, opts: &Options) -> Value {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prop.h5");
    let mut file = File::create(&path).unwrap();
    encode(file.root_mut().unwrap(), "v", value, opts).unwrap();
    file.close().unwrap();
    let file = File::open(&path, Mode::Read).unwrap();
    decode(file.root(), "v", opts).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn tagged_roundtrip(value in nested()) {
        let mut root = Group::default();
        let opts = Options::default();
        encode(&mut root, "v", &value, &opts).unwrap();
        prop_assert_eq!(decode(&root, "v", &opts).unwrap(), value);
    }

    #[test]
    fn pickle_first_roundtrip(value in nested()) {
        let mut root = Group::default();
        let opts = Options::default().with_profile(Profile::PickleFirst);
        encode(&mut root, "v", &value, &opts).unwrap();
        prop_assert_eq!(decode(&root, "v", &opts).unwrap(), value);
    }

    #[test]
    fn pickle_roundtrip(value in nested()) {
        let bytes = pickle::dumps(&value).unwrap();
        prop_assert_eq!(pickle::loads(&bytes).unwrap(), value);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn tagged_roundtrip_through_disk(value in nested()) {
        let opts = Options::default();
        prop_assert_eq!(through_disk(&value, &opts), value);
    }

    #[test]
    fn pickle_first_roundtrip_through_disk(value in nested()) {
        let opts = Options::default().with_profile(Profile::PickleFirst);
        prop_assert_eq!(through_disk(&value, &opts), value);
    }
}
