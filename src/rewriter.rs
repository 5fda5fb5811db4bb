//! Per-file reference rewriting.
//!
//! Extracts and filters a file's image references, maps each accepted
//! reference to its flattened form under the target URI, and substitutes
//! every occurrence of the raw reference text in the file. The substitution
//! is a global, case-insensitive literal match over the whole file, so the
//! same text appearing outside the originating tag or declaration is
//! rewritten as well.

use crate::error::{Error, Result};
use crate::extractor::Format;
use crate::filter::filter_references;
use crate::resolver::resolve;
use regex::{NoExpand, RegexBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One raw reference and the text that replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

/// Everything learned from one file, before anything is written.
#[derive(Debug, Clone, Serialize)]
pub struct FileScan {
    pub file: PathBuf,
    pub format: Format,
    /// Accepted references, unique, in first-seen order.
    pub accepted: Vec<String>,
    /// References skipped because of their extension.
    pub rejected: Vec<String>,
    pub substitutions: Vec<Substitution>,
    /// On-disk locations of the accepted references.
    pub images: Vec<PathBuf>,
    /// Whether the substitutions change the file's text.
    pub changed: bool,
    #[serde(skip)]
    pub rewritten: String,
}

/// Result of processing one file. Never an error: failures are recorded here.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Rewritten {
        scan: FileScan,
        /// False when running dry.
        written: bool,
    },
    Skipped { file: PathBuf, reason: String },
    Failed { file: PathBuf, reason: String },
}

impl FileStatus {
    pub fn file(&self) -> &Path {
        match self {
            FileStatus::Rewritten { scan, .. } => &scan.file,
            FileStatus::Skipped { file, .. } | FileStatus::Failed { file, .. } => file,
        }
    }

    /// Image paths contributed to the batch; empty unless the file was processed.
    pub fn images(&self) -> &[PathBuf] {
        match self {
            FileStatus::Rewritten { scan, .. } => &scan.images,
            _ => &[],
        }
    }
}

/// Reads `file` and computes its references and rewritten text.
///
/// Fails for unrecognized extensions, unreadable files, and substitution
/// patterns that cannot be compiled. Nothing on disk is modified.
pub fn inspect_file<S: AsRef<str>>(
    file: &Path,
    valid_formats: &[S],
    target_uri: &str,
) -> Result<FileScan> {
    let format = Format::from_path(file).ok_or_else(|| Error::UnsupportedFormat {
        path: file.to_path_buf(),
        recognized: Format::recognized_extensions().join(","),
    })?;

    let content = std::fs::read_to_string(file).map_err(|source| Error::Read {
        path: file.to_path_buf(),
        source,
    })?;

    let filtered = filter_references(&format.extract(&content), valid_formats);
    let dir = file.parent().unwrap_or_else(|| Path::new(""));

    let mut substitutions = Vec::with_capacity(filtered.accepted.len());
    let mut images = Vec::with_capacity(filtered.accepted.len());
    for raw in &filtered.accepted {
        let resolved = resolve(raw, dir, target_uri);
        debug!(
            file = %file.display(),
            reference = %raw,
            image = %resolved.image_path.display(),
            "resolved reference"
        );
        substitutions.push(Substitution {
            from: raw.clone(),
            to: resolved.new_reference,
        });
        images.push(resolved.image_path);
    }

    let rewritten = apply_substitutions(&content, &substitutions)?;

    Ok(FileScan {
        file: file.to_path_buf(),
        format,
        accepted: filtered.accepted,
        rejected: filtered.rejected,
        substitutions,
        images,
        changed: rewritten != content,
        rewritten,
    })
}

/// Rewrites the image references in `file` and writes it back in place.
///
/// Any failure is logged and recorded in the returned status; a file that
/// fails contributes no images to the batch.
pub fn rewrite_file<S: AsRef<str>>(
    file: &Path,
    valid_formats: &[S],
    target_uri: &str,
    dry_run: bool,
) -> FileStatus {
    let scan = match inspect_file(file, valid_formats, target_uri) {
        Ok(scan) => scan,
        Err(err @ Error::UnsupportedFormat { .. }) => {
            warn!("{err}, not scanned");
            return FileStatus::Skipped {
                file: file.to_path_buf(),
                reason: err.to_string(),
            };
        }
        Err(err) => {
            warn!(file = %file.display(), "{err}");
            return FileStatus::Failed {
                file: file.to_path_buf(),
                reason: err.to_string(),
            };
        }
    };

    if !dry_run {
        if let Err(source) = std::fs::write(file, &scan.rewritten) {
            let err = Error::Write {
                path: file.to_path_buf(),
                source,
            };
            warn!(file = %file.display(), "{err}");
            return FileStatus::Failed {
                file: file.to_path_buf(),
                reason: err.to_string(),
            };
        }
    }

    info!(
        file = %file.display(),
        matches = scan.accepted.len(),
        ignored = scan.rejected.len(),
        "processed file"
    );
    for ignored in &scan.rejected {
        warn!(file = %file.display(), reference = %ignored, "ignored image extension");
    }

    FileStatus::Rewritten {
        scan,
        written: !dry_run,
    }
}

/// Replaces every occurrence of each substitution's `from` text, in order.
///
/// Matching is literal and case-insensitive; `to` is inserted verbatim.
pub fn apply_substitutions(content: &str, substitutions: &[Substitution]) -> Result<String> {
    let mut result = content.to_string();
    for sub in substitutions {
        let pattern = RegexBuilder::new(&regex::escape(&sub.from))
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|source| Error::Substitution {
                reference: sub.from.clone(),
                source,
            })?;
        result = pattern
            .replace_all(&result, NoExpand(&sub.to))
            .into_owned();
    }
    Ok(result)
}
