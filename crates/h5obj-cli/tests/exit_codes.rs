use std::process::Command;

fn scratch() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("data.h5").display().to_string();
    (dir, file)
}

fn run(bin: &str, args: &[&str]) -> std::process::Output {
    Command::new(bin)
        .args(args)
        .env_remove("H5OBJ_LOG")
        .env_remove("H5OBJ_PROFILE")
        .output()
        .expect("spawn")
}

#[test]
fn save_load_ls_succeed() {
    let (_dir, file) = scratch();
    let address = format!("{file}/params");

    let out = run(env!("CARGO_BIN_EXE_h5save"), &[&address, "--data", "{'steps': 3, 'tag': 'a'}"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let out = run(env!("CARGO_BIN_EXE_h5load"), &[&address]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "{'steps': 3, 'tag': 'a'}");

    let out = run(env!("CARGO_BIN_EXE_h5load"), &[&address, "--len"]);
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "2");

    let out = run(env!("CARGO_BIN_EXE_h5ls"), &[&file]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "params");
}

#[test]
fn missing_file_exits_one() {
    let (dir, _file) = scratch();
    let address = format!("{}/absent.h5/x", dir.path().display());
    let out = run(env!("CARGO_BIN_EXE_h5ls"), &[&address]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("h5ls: cannot access"), "{stderr}");
    assert!(stderr.contains(&address));
}

#[test]
fn existing_dataset_without_force_exits_one() {
    let (_dir, file) = scratch();
    let address = format!("{file}/x");
    assert!(run(env!("CARGO_BIN_EXE_h5save"), &[&address, "--data", "1"]).status.success());

    let out = run(env!("CARGO_BIN_EXE_h5save"), &[&address, "--data", "2"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&out.stderr).trim(),
        format!("h5save: cannot save \"{address}\": dataset exists")
    );

    let forced = run(env!("CARGO_BIN_EXE_h5save"), &[&address, "--data", "2", "--force"]);
    assert!(forced.status.success());
    let out = run(env!("CARGO_BIN_EXE_h5load"), &[&address]);
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "2");
}

#[test]
fn non_empty_group_without_recursive_exits_one() {
    let (_dir, file) = scratch();
    let saved = run(env!("CARGO_BIN_EXE_h5save"), &[&format!("{file}/g/a"), "--data", "1"]);
    assert!(saved.status.success());


    let out = run(env!("CARGO_BIN_EXE_h5rm"), &["-f", &format!("{file}/g")]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("is a group"));

    let out = run(env!("CARGO_BIN_EXE_h5rmgrp"), &[&format!("{file}/g")]);
    assert_eq!(out.status.code(), Some(1));

    assert!(run(env!("CARGO_BIN_EXE_h5rm"), &["-f", "-r", &format!("{file}/g")]).status.success());
}

#[test]
fn missing_dataset_exits_one() {
    let (_dir, file) = scratch();
    assert!(run(env!("CARGO_BIN_EXE_h5save"), &[&format!("{file}/a")]).status.success());
    let out = run(env!("CARGO_BIN_EXE_h5load"), &[&format!("{file}/b")]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no such dataset"));
}

#[test]
fn bad_literal_exits_one() {
    let (_dir, file) = scratch();
    let out = run(env!("CARGO_BIN_EXE_h5save"), &[&format!("{file}/a"), "--data", "[1, 2"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("h5save: invalid data"));
}
