//! Combined `<file>/<in-store path>` addresses.
//!
//! The file part is found by probing the filesystem: the address is cut
//! before the first `/`-separated prefix that matches nothing on disk.
//! Wildcards (`*`, `?`, `[...]`) work in both parts.

use std::path::Path;

use anyhow::{bail, Context, Result};
use glob::Pattern;
use h5obj_store::{File, Mode, Node};

fn matches_any(pattern: &str) -> bool {
    match glob::glob(pattern) {
        Ok(mut paths) => paths.any(|p| p.is_ok()),
        Err(_) => Path::new(pattern).exists(),
    }
}

fn sorted_glob(pattern: &str) -> Vec<String> {
    let mut found: Vec<String> = match glob::glob(pattern) {
        Ok(paths) => paths
            .filter_map(|p| p.ok())
            .map(|p| p.display().to_string())
            .collect(),
        Err(_) if Path::new(pattern).exists() => vec![pattern.to_string()],
        Err(_) => Vec::new(),
    };
    found.sort();
    found
}

/// Split `address` into its filesystem part and its in-store part.
///
/// ```no_run
/// let (file, inner) = h5obj_cli::address::h5split("runs/a.h5/params/steps");
/// assert_eq!((file.as_str(), inner.as_str()), ("runs/a.h5", "params/steps"));
/// ```
pub fn h5split(address: &str) -> (String, String) {
    let parts: Vec<&str> = address.split('/').collect();
    let mut cut = parts.len();
    for mark in 0..parts.len() {
        if mark == 0 && parts[0].is_empty() {
            continue;
        }
        if !matches_any(&parts[..=mark].join("/")) {
            cut = mark;
            break;
        }
    }
    let file = parts[..cut].join("/");
    let inner = parts[cut..].join("/");
    if file.is_empty() && !inner.is_empty() {
        return (inner, file);
    }
    (file, inner)
}

/// Expand `pattern` into every matching `<file>/<in-store path>`.
///
/// Both parts may hold wildcards. Matching directories are an error.
pub fn h5glob(pattern: &str) -> Result<Vec<String>> {
    let (file_pattern, inner_pattern) = h5split(pattern);
    if file_pattern.is_empty() {
        return Ok(Vec::new());
    }
    let inner = Pattern::new(&inner_pattern)
        .with_context(|| format!("bad in-store pattern {inner_pattern:?}"))?;
    let mut out = Vec::new();
    for filename in sorted_glob(&file_pattern) {
        if !Path::new(&filename).is_file() {
            bail!("{filename:?} is not a file");
        }
        let file = File::open(&filename, Mode::Read)
            .with_context(|| format!("cannot open {filename:?}"))?;
        file.root().visit(|name| {
            if inner.matches(name) {
                out.push(format!("{filename}/{name}"));
            }
        });
    }
    tracing::debug!(pattern, matches = out.len(), "expanded address pattern");
    Ok(out)
}

/// Expand only the filesystem part: one address per matching file, with
/// the in-store part left as given.
pub fn h5glob_filewise(pattern: &str) -> Vec<String> {
    let (file_pattern, inner_pattern) = h5split(pattern);
    sorted_glob(&file_pattern)
        .into_iter()
        .map(|filename| format!("{filename}/{inner_pattern}"))
        .collect()
}

/// Cut `s` at the `n`-th `/` (from the back when negative), dropping it.
fn divide(s: &str, n: isize) -> (String, String) {
    let parts: Vec<&str> = s.split('/').collect();
    let at = if n < 0 {
        parts.len().saturating_sub(n.unsigned_abs())
    } else {
        (n as usize).min(parts.len())
    };
    (parts[..at].join("/"), parts[at..].join("/"))
}

/// Shell completions for a partly typed address.
///
/// Filesystem paths complete first. Once the text runs past a file, the
/// names inside that file complete; groups get a trailing `/`.
pub fn h5complete(partial: &str) -> Vec<String> {
    let on_disk = sorted_glob(&format!("{partial}*"));
    if !on_disk.is_empty() {
        return on_disk.into_iter().map(|p| p + "/").collect();
    }

    let slashes = partial.matches('/').count();
    for at in (1..=slashes).rev() {
        let (file, rest) = divide(partial, at as isize);
        let path = Path::new(&file);
        if path.is_dir() {
            break;
        }
        if !path.is_file() {
            continue;
        }
        let (group_path, stem) = divide(&rest, -1);
        let Ok(store) = File::open(path, Mode::Read) else {
            return Vec::new();
        };
        let Ok(group) = store.root().group(&group_path) else {
            return Vec::new();
        };
        let Ok(prefix) = Pattern::new(&format!("{stem}*")) else {
            return Vec::new();
        };
        let dir = if group_path.is_empty() {
            String::new()
        } else {
            format!("{group_path}/")
        };
        return group
            .iter()
            .filter(|(name, _)| prefix.matches(name))
            .map(|(name, node)| {
                let slash = if matches!(node, Node::Group(_)) { "/" } else { "" };
                format!("{file}/{dir}{name}{slash}")
            })
            .collect();
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use h5obj_store::Data;

    fn scratch_file(dir: &Path, name: &str) -> String {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        let root = f.root_mut().unwrap();
        root.create_dataset("params/steps", Data::from(10i64)).unwrap();
        root.create_dataset("params/seed", Data::from(3i64)).unwrap();
        root.create_dataset("x", Data::from(1.5)).unwrap();
        f.close().unwrap();
        path.display().to_string()
    }

    #[test]
    fn split_at_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = scratch_file(dir.path(), "a.h5");
        assert_eq!(
            h5split(&format!("{file}/params/steps")),
            (file.clone(), "params/steps".to_string())
        );

        assert_eq!(h5split(&file), (file.clone(), String::new()));
    }

    #[test]
    fn split_missing_file_keeps_existing_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().display().to_string();
        let (file, inner) = h5split(&format!("{base}/new.h5/x"));
        assert_eq!(file, base);
        assert_eq!(inner, "new.h5/x");
    }

    #[test]
    fn glob_both_parts() {
        let dir = tempfile::tempdir().unwrap();
        let a = scratch_file(dir.path(), "a.h5");
        let b = scratch_file(dir.path(), "b.h5");
        let base = dir.path().display().to_string();
        let found = h5glob(&format!("{base}/*.h5/params/s*")).unwrap();
        assert_eq!(
            found,
            [
                format!("{a}/params/seed"),
                format!("{a}/params/steps"),
                format!("{b}/params/seed"),
                format!("{b}/params/steps"),
            ]
        );
    }

    #[test]
    fn filewise_keeps_inner_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let a = scratch_file(dir.path(), "a.h5");
        let base = dir.path().display().to_string();
        assert_eq!(h5glob_filewise(&format!("{base}/*.h5/x*")), [format!("{a}/x*")]);
    }

    #[test]
    fn complete_inside_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = scratch_file(dir.path(), "a.h5");
        assert_eq!(h5complete(&format!("{file}/p")), [format!("{file}/params/")]);
        assert_eq!(
            h5complete(&format!("{file}/params/s")),
            [format!("{file}/params/seed"), format!("{file}/params/steps")]
        );
        assert!(h5complete(&format!("{file}/zzz")).is_empty());
    }

    #[test]
    fn divide_from_either_end() {
        assert_eq!(divide("a/b/c/d", 1), ("a".into(), "b/c/d".into()));
        assert_eq!(divide("a/b/c/d", -1), ("a/b/c".into(), "d".into()));
        assert_eq!(divide("d", -1), (String::new(), "d".into()));
    }
}
