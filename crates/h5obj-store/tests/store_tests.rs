use h5obj_store::{AttrValue, Data, Elements, File, Mode, Node, StoreError};
use num_complex::Complex64;

fn scratch() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.h5");
    (dir, path)
}

#[test]
fn nested_tree_survives_reopen() {
    let (_dir, path) = scratch();
    {
        let mut f = File::create(&path).unwrap();
        let root = f.root_mut().unwrap();
        let g = root.create_group("root").unwrap();
        g.attrs_mut().set("__DTYPE__", "dict");
        g.create_dataset("x", Data::from(vec![1i64, 2, 3]))
            .unwrap()
            .attrs_mut()
            .set("__DTYPE__", "list");
        g.create_dataset("y", Data::from("s")).unwrap();
        g.create_dataset(
            "z",
            Data::scalar(Elements::Complex(vec![Complex64::new(0.0, -1.0)])),
        )
        .unwrap();
        f.close().unwrap();
    }

    let f = File::open(&path, Mode::Read).unwrap();
    let g = f.root().group("root").unwrap();
    assert_eq!(g.keys().collect::<Vec<_>>(), ["x", "y", "z"]);
    assert_eq!(g.attrs().get_str("__DTYPE__"), Some("dict"));
    let x = g.dataset("x").unwrap();
    assert_eq!(x.value().elements, Elements::Int(vec![1, 2, 3]));
    assert_eq!(x.attrs().get("__DTYPE__"), Some(&AttrValue::String("list".into())));
    assert_eq!(g.dataset("y").unwrap().value(), &Data::from("s"));
}

#[test]
fn copy_between_files() {
    let (_dir, path) = scratch();
    let other = path.with_file_name("other.h5");
    {
        let mut f = File::create(&path).unwrap();
        f.root_mut().unwrap().create_dataset("a/b", Data::from(7i64)).unwrap();
        f.close().unwrap();
    }
    let src = File::open(&path, Mode::Read).unwrap();
    let mut dst = File::create(&other).unwrap();
    let node = src.root().get("a").cloned().unwrap();
    dst.root_mut().unwrap().insert("copied", node).unwrap();
    dst.close().unwrap();

    let back = File::open(&other, Mode::Read).unwrap();
    assert_eq!(back.root().dataset("copied/b").unwrap().value(), &Data::from(7i64));
}

#[test]
fn modify_in_read_write_mode() {
    let (_dir, path) = scratch();
    {
        let mut f = File::create(&path).unwrap();
        f.root_mut().unwrap().create_dataset("d", Data::from(1i64)).unwrap();
        f.close().unwrap();
    }
    {
        let mut f = File::open(&path, Mode::ReadWrite).unwrap();
        let root = f.root_mut().unwrap();
        root.delete("d").unwrap();
        root.create_dataset("d", Data::from(2i64)).unwrap();
        f.close().unwrap();
    }
    let f = File::open(&path, Mode::Read).unwrap();
    assert_eq!(f.root().len(), 1);
    assert_eq!(f.root().dataset("d").unwrap().value(), &Data::from(2i64));
}

#[test]
fn wrong_node_kind_errors() {
    let (_dir, path) = scratch();
    let mut f = File::create(&path).unwrap();
    let root = f.root_mut().unwrap();
    root.create_dataset("d", Data::from(1i64)).unwrap();
    root.create_group("g").unwrap();
    assert!(matches!(root.group("d"), Err(StoreError::NotAGroup(_))));
    assert!(matches!(root.dataset("g"), Err(StoreError::NotADataset(_))));
    assert!(matches!(root.get("g"), Some(Node::Group(_))));
}

#[test]
fn integer_width_survives_reopen() {
    let (_dir, path) = scratch();
    {
        let mut f = File::create(&path).unwrap();
        let root = f.root_mut().unwrap();
        root.create_dataset("long", Data::vector(Elements::Long(vec![1, 2])))
            .unwrap();
        root.create_dataset("int", Data::from(vec![1i64, 2])).unwrap();
        f.close().unwrap();
    }
    let f = File::open(&path, Mode::Read).unwrap();
    let root = f.root();
    assert_eq!(root.dataset("long").unwrap().value().elements, Elements::Long(vec![1, 2]));
    assert_eq!(root.dataset("int").unwrap().value().elements, Elements::Int(vec![1, 2]));
}

#[test]
fn strings_with_nul_are_refused() {
    let (_dir, path) = scratch();
    let mut f = File::create(&path).unwrap();
    let root = f.root_mut().unwrap();
    let err = root.create_dataset("s", Data::from("a\0b")).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedShape { .. }));
    assert!(!root.contains("s"));
}
