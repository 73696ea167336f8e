//! The verbs behind the binaries.
//!
//! Every failure reads `<verb>: cannot <action> "<address>": <reason>`, the
//! form the binaries print before exiting with status 1.

use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use h5obj::file::FILENAME_KEYS;
use h5obj::{meta, ObjFile, Options, Value};
use h5obj_store::{Group, Mode, Node};

use crate::address::{h5glob, h5split};
use crate::project::Projection;

fn cannot(verb: &str, action: &str, address: &str, reason: impl fmt::Display) -> anyhow::Error {
    anyhow!("{verb}: cannot {action} \"{address}\": {reason}")
}

fn is_file(path: &str) -> bool {
    Path::new(path).is_file()
}

/// A group that is not itself a stored value.
fn plain_group(node: &Node) -> Option<&Group> {
    node.as_group().filter(|g| !g.attrs().contains(meta::DTYPE))
}

fn basename(name: &str) -> &str {
    name.rsplit('/').find(|s| !s.is_empty()).unwrap_or(name)
}

/// Split an address whose file may not exist yet. The first in-store
/// segment after an existing directory names the new file.
pub fn split_for_create(address: &str) -> (String, String) {
    let (file, inner) = h5split(address);
    if file.is_empty() || is_file(&file) {
        return (file, inner);
    }
    let (dir, rest) = if Path::new(&file).is_dir() {
        (file, inner)
    } else {
        (String::new(), file)
    };
    let (new_file, name) = rest.split_once('/').unwrap_or((rest.as_str(), ""));
    let new_file = if dir.is_empty() {
        new_file.to_string()
    } else {
        format!("{dir}/{new_file}")
    };
    (new_file, name.to_string())
}

/// Load the value at `address` and apply `projection` to it.
pub fn load(address: &str, projection: &Projection, options: Options) -> Result<Value> {
    let (filename, name) = h5split(address);
    if !is_file(&filename) {
        return Err(cannot("h5load", "load", address, "no such file or directory"));
    }
    let file = ObjFile::open_with(&filename, Mode::Read, options)
        .with_context(|| format!("h5load: cannot load \"{address}\""))?;
    if !FILENAME_KEYS.contains(&name.as_str()) && !file.contains(&name) {
        return Err(cannot("h5load", "load", address, "no such dataset"));
    }
    let value = file
        .get_item(&name)
        .with_context(|| format!("h5load: cannot load \"{address}\""))?;
    projection
        .apply(value)
        .with_context(|| format!("h5load: cannot load \"{address}\""))
}

/// Save `value` at `address`, creating the file if needed. An existing
/// dataset is replaced only with `force`.
pub fn save(address: &str, value: &Value, force: bool, options: Options) -> Result<()> {
    let (filename, name) = split_for_create(address);
    if filename.is_empty() || name.is_empty() {
        return Err(anyhow!("h5save: no dataset name specified"));
    }
    let context = || format!("h5save: cannot save \"{address}\"");
    let found = is_file(&filename)
        && ObjFile::open(&filename, Mode::Read)
            .with_context(context)?
            .contains(&name);
    if found && !force {
        return Err(cannot("h5save", "save", address, "dataset exists"));
    }
    let mut file = ObjFile::open_with(&filename, Mode::Append, options.with_overwrite(true))
        .with_context(context)?;
    file.set_item(&name, value).with_context(context)?;
    file.close().with_context(context)?;
    tracing::debug!(file = %filename, name = %name, "saved");
    Ok(())
}

/// Names inside the group at `address`, or the dataset's own name.
pub fn ls(address: &str) -> Result<Vec<String>> {
    let (filename, name) = h5split(address);
    let path = Path::new(&filename);
    if filename.is_empty() || !path.exists() {
        return Err(cannot("h5ls", "access", address, "no such group or dataset"));
    }
    if !path.is_file() {
        return Err(anyhow!("h5ls: {filename}: is a directory"));
    }
    let file = ObjFile::open(path, Mode::Read)
        .with_context(|| format!("h5ls: cannot access \"{address}\""))?;
    if name.is_empty() {
        return Ok(file.keys());
    }
    let node = file
        .get_node(&name)
        .map_err(|_| cannot("h5ls", "access", address, "no such group or dataset"))?;
    Ok(match plain_group(node) {
        Some(group) => group.keys().map(str::to_string).collect(),
        None => vec![basename(&name).to_string()],
    })
}

/// Remove every node matching `pattern`. Groups need `recursive`; unless
/// `force` is set, `confirm` is asked before each removal.
///
/// Returns the removed addresses.
pub fn rm(
    pattern: &str,
    force: bool,
    recursive: bool,
    confirm: &mut dyn FnMut(&str) -> Result<bool>,
) -> Result<Vec<String>> {
    let addresses = h5glob(pattern).with_context(|| format!("h5rm: cannot remove \"{pattern}\""))?;
    if addresses.is_empty() {
        return Err(cannot("h5rm", "remove", pattern, "no such group or dataset"));
    }
    let mut removed = Vec::new();
    for address in addresses {
        let (filename, name) = h5split(&address);
        let is_group = {
            let file = ObjFile::open(&filename, Mode::Read)
                .with_context(|| format!("h5rm: cannot remove \"{address}\""))?;
            match file.get_node(&name) {
                Ok(node) => plain_group(node).is_some(),
                // Gone with a group removed earlier in this call.
                Err(_) => continue,
            }
        };
        if is_group && !recursive {
            return Err(cannot("h5rm", "remove", &address, "is a group"));
        }
        if !force {
            let kind = if is_group { "group" } else { "dataset" };
            if !confirm(&format!("h5rm: remove {kind} \"{address}\"?"))? {
                continue;
            }
        }
        let mut file = ObjFile::open(&filename, Mode::ReadWrite)?;
        file.del_item(&name)
            .with_context(|| format!("h5rm: cannot remove \"{address}\""))?;
        file.close()?;
        removed.push(address);
    }
    Ok(removed)
}

/// Create a group inside an existing file.
pub fn mkgrp(address: &str) -> Result<()> {
    let (filename, name) = h5split(address);
    if name.is_empty() {
        return Err(anyhow!("h5mkgrp: no group name given"));
    }
    if !is_file(&filename) {
        return Err(cannot("h5mkgrp", "open", &filename, "no such file"));
    }
    let context = || format!("h5mkgrp: cannot create group \"{address}\"");
    let mut file = ObjFile::open(&filename, Mode::ReadWrite).with_context(context)?;
    file.create_group(&name).with_context(context)?;
    file.close().with_context(context)
}

/// Remove empty groups matching `pattern`. Non-empty groups fail unless
/// `ignore_non_empty` is set, in which case they are skipped.
pub fn rmgrp(pattern: &str, ignore_non_empty: bool) -> Result<Vec<String>> {
    let addresses =
        h5glob(pattern).with_context(|| format!("h5rmgrp: cannot remove \"{pattern}\""))?;
    if addresses.is_empty() {
        return Err(cannot("h5rmgrp", "remove", pattern, "no such group or dataset"));
    }
    let mut removed = Vec::new();
    for address in addresses {
        let (filename, name) = h5split(&address);
        let mut file = ObjFile::open(&filename, Mode::ReadWrite)?;
        let empty = match file.get_node(&name) {
            Ok(node) => match plain_group(node) {
                Some(group) => group.is_empty(),
                None => return Err(cannot("h5rmgrp", "remove", &address, "is a dataset")),
            },
            Err(_) => continue,
        };
        if !empty {
            if ignore_non_empty {
                continue;
            }
            return Err(cannot("h5rmgrp", "remove", &address, "group not empty"));
        }
        file.del_item(&name)?;
        file.close()?;
        removed.push(address);
    }
    Ok(removed)
}

/// Copy the node at `source` to `dest`, within or across files. Stored
/// metadata travels with it.
///
/// When `dest` is a group the node lands inside it under its own name.
/// Returns the address written.
pub fn cp(source: &str, dest: &str, force: bool, recursive: bool) -> Result<String> {
    let (src_file, src_name) = h5split(source);
    if !is_file(&src_file) {
        return Err(cannot("h5cp", "stat", source, "no such file or directory"));
    }
    let node = {
        let file = ObjFile::open(&src_file, Mode::Read)
            .with_context(|| format!("h5cp: cannot stat \"{source}\""))?;
        file.get_node(&src_name)
            .map_err(|_| cannot("h5cp", "stat", source, "no such group or dataset"))?
            .clone()
    };
    if plain_group(&node).is_some() && !recursive {
        return Err(anyhow!("h5cp: omitting group \"{source}\""));
    }

    let (dest_file, dest_name) = split_for_create(dest);
    if dest_file.is_empty() {
        return Err(cannot("h5cp", "copy to", dest, "no file given"));
    }
    let context = || format!("h5cp: cannot copy to \"{dest}\"");
    let mut out = ObjFile::open(&dest_file, Mode::Append).with_context(context)?;
    let base = basename(&src_name).to_string();
    let target = if dest_name.is_empty() {
        base
    } else if out.get_node(&dest_name).map_or(false, |n| plain_group(n).is_some()) {
        format!("{dest_name}/{base}")
    } else {
        dest_name
    };
    if out.contains(&target) {
        if !force {
            return Err(cannot("h5cp", "copy to", dest, "dataset exists"));
        }
        out.del_item(&target).with_context(context)?;
    }
    out.store_mut().root_mut()?.insert(&target, node).with_context(context)?;
    out.close().with_context(context)?;
    tracing::debug!(source, file = %dest_file, name = %target, "copied");
    Ok(format!("{dest_file}/{target}"))
}

/// Copy, then remove the source.
pub fn mv(source: &str, dest: &str, recursive: bool) -> Result<String> {
    let written = cp(source, dest, false, recursive)
        .map_err(|err| anyhow!("{err:#}").context("h5mv: copy failed"))?;
    let (src_file, src_name) = h5split(source);
    let mut file = ObjFile::open(&src_file, Mode::ReadWrite)?;
    file.del_item(&src_name)
        .with_context(|| format!("h5mv: cannot remove \"{source}\""))?;
    file.close()?;
    Ok(written)
}

fn set_key(target: &mut Value, key: &str, item: Value) -> Result<()> {
    match target {
        Value::Dict(map) => {
            let as_str = Value::Str(key.to_string());
            let key = match h5obj::literal::parse(key) {
                Ok(parsed) if !map.contains_key(&as_str) && map.contains_key(&parsed) => parsed,
                _ => as_str,
            };
            map.insert(key, item);
        }
        Value::Bundle(map) => {
            map.insert(key.to_string(), item);
        }
        Value::Object(object) => {
            object.fields.insert(key.to_string(), item);
        }
        Value::List(items) => {
            let index: i64 = key
                .parse()
                .map_err(|_| anyhow!("list indices must be integers, not {key:?}"))?;
            let len = items.len() as i64;
            let at = if index < 0 { index + len } else { index };
            let slot = usize::try_from(at)
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| anyhow!("list assignment index {index} out of range"))?;
            *slot = item;
        }
        other => {
            return Err(anyhow!(
                "'{}' object does not support item assignment",
                other.type_name()
            ))
        }
    }
    Ok(())
}

/// Set `key` to `item` in every stored value matching `pattern`.
pub fn setitem(pattern: &str, key: &str, item: &Value, options: Options) -> Result<usize> {
    let addresses = h5glob(pattern)
        .with_context(|| format!("h5setitem: cannot set item of \"{pattern}\""))?;
    if addresses.is_empty() {
        return Err(cannot("h5setitem", "set item of", pattern, "no such dataset"));
    }
    for address in &addresses {
        let context = || format!("h5setitem: cannot set item of \"{address}\"");
        let (filename, name) = h5split(address);
        let mut file =
            ObjFile::open_with(&filename, Mode::ReadWrite, options.with_overwrite(true))
                .with_context(context)?;

        let mut value = file.get_item(&name).with_context(context)?;
        set_key(&mut value, key, item.clone()).with_context(context)?;
        file.set_item(&name, &value).with_context(context)?;
        file.close().with_context(context)?;
    }
    Ok(addresses.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_key_in_containers() {
        let mut list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        set_key(&mut list, "-1", Value::from("last")).unwrap();
        assert_eq!(list, Value::List(vec![Value::Int(1), Value::from("last")]));
        assert!(set_key(&mut list, "7", Value::None).is_err());

        let mut dict = Value::Dict([(Value::Int(3), Value::None)].into_iter().collect());
        set_key(&mut dict, "3", Value::Int(9)).unwrap();
        set_key(&mut dict, "name", Value::Int(1)).unwrap();
        let Value::Dict(map) = dict else { unreachable!() };
        assert_eq!(map[&Value::Int(3)], Value::Int(9));
        assert_eq!(map[&Value::from("name")], Value::Int(1));

        let err = set_key(&mut Value::Int(1), "a", Value::None).unwrap_err();
        assert_eq!(err.to_string(), "'int' object does not support item assignment");
    }

    #[test]
    fn basename_of_paths() {
        assert_eq!(basename("a/b/c"), "c");
        assert_eq!(basename("c"), "c");
        assert_eq!(basename("a/b/"), "b");
    }
}
