//! Task configuration.
//!
//! A task file is JSON:
//!
//! ```json
//! {
//!   "options": { "validformats": ["png", "jpg"], "newrelativeuri": "assets/" },
//!   "groups": [ { "cwd": "site", "src": ["**/*.html", "css"], "dest": "assets" } ]
//! }
//! ```
//!
//! Each group's `src` entries are expanded into concrete files before
//! processing: glob patterns through `glob`, directories by walking them for
//! files of a recognized format.

use crate::error::{Error, Result};
use crate::extractor::Format;
use crate::filter::DEFAULT_VALID_FORMATS;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Per-run options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Accepted image extensions, compared case-sensitively.
    #[serde(rename = "validformats", default = "default_valid_formats")]
    pub valid_formats: Vec<String>,

    /// URI prefix written into rewritten references. Defaults to the group's `dest`.
    #[serde(rename = "newrelativeuri", default)]
    pub new_relative_uri: Option<String>,

    /// Compute and report everything without touching the filesystem.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_valid_formats() -> Vec<String> {
    DEFAULT_VALID_FORMATS.iter().map(|f| f.to_string()).collect()
}

impl Default for Options {
    fn default() -> Self {
        Self {
            valid_formats: default_valid_formats(),
            new_relative_uri: None,
            dry_run: false,
        }
    }
}

/// A file group as written in the task file, before pattern expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    pub src: Vec<String>,
    pub dest: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub options: Options,
    pub groups: Vec<GroupSpec>,
}

impl TaskConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A file group with its sources expanded to concrete paths.
///
/// Source paths are relative to `cwd` when it is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileGroup {
    pub cwd: Option<PathBuf>,
    pub src: Vec<PathBuf>,
    pub dest: PathBuf,
}

impl GroupSpec {
    /// Expands every `src` entry, keeping the first occurrence of each file.
    ///
    /// Entries without glob metacharacters that name no directory are kept
    /// as-is, so a missing file surfaces as a per-file failure later on.
    pub fn expand(&self) -> Result<FileGroup> {
        let base = self.cwd.clone().unwrap_or_default();
        let mut seen = HashSet::new();
        let mut src = Vec::new();

        for pattern in self.src.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            let full = base.join(pattern);
            let found = if full.is_dir() {
                collect_source_files(&full)?
            } else if is_glob(pattern) {
                glob_files(pattern, &full)?
            } else {
                vec![full]
            };

            for path in found {
                let relative = path
                    .strip_prefix(&base)
                    .map(Path::to_path_buf)
                    .unwrap_or(path);
                if seen.insert(relative.clone()) {
                    src.push(relative);
                }
            }
        }

        Ok(FileGroup {
            cwd: self.cwd.clone(),
            src,
            dest: self.dest.clone(),
        })
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

fn glob_files(pattern: &str, full: &Path) -> Result<Vec<PathBuf>> {
    let full = full.to_string_lossy();
    let paths = glob::glob(&full).map_err(|err| Error::Pattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(err) => warn!(pattern, "skipping unreadable match: {err}"),
        }
    }
    Ok(files)
}

/// Collects files of a recognized format under `dir`, skipping hidden and
/// underscore-prefixed entries.
pub fn collect_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden_or_underscore(e))
    {
        let entry = entry.map_err(|source| Error::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && Format::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn is_hidden_or_underscore(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.') || s.starts_with('_'))
}
