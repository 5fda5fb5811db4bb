//! Reference resolution.
//!
//! A raw reference is resolved twice: against the directory of the file that
//! contains it, to find the image on disk, and against the target URI, to
//! produce the flattened reference written back into the file.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// A reference resolved for both rewriting and relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    /// Replacement text: the reference's basename under the target URI.
    pub new_reference: String,
    /// Where the referenced image lives, relative to the process directory.
    pub image_path: PathBuf,
}

/// Resolves `raw` as written in a file under `containing_dir`.
pub fn resolve(raw: &str, containing_dir: &Path, target_uri: &str) -> Resolved {
    Resolved {
        new_reference: rewrite_uri(target_uri, basename(raw)),
        image_path: join_reference(containing_dir, raw),
    }
}

/// Final path segment of a reference; the reference itself if it has none.
pub fn basename(reference: &str) -> &str {
    Path::new(reference)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(reference)
}

/// Joins a reference onto a directory and normalizes the result.
///
/// Leading slashes are treated as plain separators, so `/img/a.png` inside
/// `site` resolves to `site/img/a.png`.
pub fn join_reference(dir: &Path, reference: &str) -> PathBuf {
    normalize(&dir.join(reference.trim_start_matches('/')))
}

/// Places `name` under `target_uri`, treating the URI as a directory.
///
/// Backslashes become forward slashes and `.` segments are dropped; `..`
/// segments and any scheme or host are kept as written.
pub fn rewrite_uri(target_uri: &str, name: &str) -> String {
    let mut base = target_uri.replace('\\', "/");
    if !base.is_empty() && !base.ends_with('/') {
        base.push('/');
    }
    let base = base
        .split('/')
        .filter(|segment| *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    format!("{base}{name}")
}

/// Lexically normalizes a path: drops `.`, folds `..` into preceding normal
/// components, and never touches the filesystem.
///
/// Leading `..` components of a relative path are preserved. An empty result
/// becomes `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Absolute, normalized form of `path` for location comparisons.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path)
        .map(|p| normalize(&p))
        .unwrap_or_else(|_| normalize(path))
}
