//! Batch orchestration.
//!
//! Runs one file group end to end: rewrites every source file, aggregates
//! the discovered image paths, makes sure the destination exists, and moves
//! the images into it. Every per-file and per-image outcome is kept in the
//! returned [`GroupReport`].

use crate::config::{FileGroup, Options};
use crate::error::Error;
use crate::relocator::{Relocation, RelocationStatus, relocate};
use crate::resolver::normalize;
use crate::rewriter::{FileStatus, rewrite_file};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything that happened while processing one file group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub destination: PathBuf,
    /// Prefix written into rewritten references.
    pub target_uri: String,
    pub dry_run: bool,
    pub files: Vec<FileStatus>,
    /// Unique image paths discovered across all files.
    pub images: Vec<PathBuf>,
    /// Set when the destination directory could not be created.
    pub destination_error: Option<String>,
    pub relocations: Vec<Relocation>,
}

/// Summary counts for a group run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub files_scanned: usize,
    pub files_rewritten: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub references_rewritten: usize,
    pub references_ignored: usize,
    pub images_found: usize,
    pub images_moved: usize,
    pub images_in_place: usize,
    pub images_missing: usize,
    pub relocation_failures: usize,
    pub dirs_removed: usize,
}

impl GroupReport {
    pub fn diagnostics(&self) -> Diagnostics {
        let mut d = Diagnostics {
            files_scanned: self.files.len(),
            images_found: self.images.len(),
            ..Diagnostics::default()
        };

        for file in &self.files {
            match file {
                FileStatus::Rewritten { scan, .. } => {
                    d.files_rewritten += 1;
                    d.references_rewritten += scan.accepted.len();
                    d.references_ignored += scan.rejected.len();
                }
                FileStatus::Skipped { .. } => d.files_skipped += 1,
                FileStatus::Failed { .. } => d.files_failed += 1,
            }
        }

        for relocation in &self.relocations {
            match &relocation.status {
                RelocationStatus::Moved { removed_dir, .. } => {
                    d.images_moved += 1;
                    if removed_dir.is_some() {
                        d.dirs_removed += 1;
                    }
                }
                RelocationStatus::WouldMove => d.images_moved += 1,
                RelocationStatus::AlreadyInPlace => d.images_in_place += 1,
                RelocationStatus::NotFound => d.images_missing += 1,
                RelocationStatus::Failed { .. } => d.relocation_failures += 1,
            }
        }

        d
    }
}

/// Source files of `group`, joined onto its working directory when set.
pub fn source_files(group: &FileGroup) -> Vec<PathBuf> {
    group
        .src
        .iter()
        .filter(|path| !path.as_os_str().is_empty())
        .map(|path| match &group.cwd {
            Some(cwd) => normalize(&cwd.join(path)),
            None => path.clone(),
        })
        .collect()
}

/// Directory images are moved into: `dest`, under `cwd` when set.
pub fn destination_dir(group: &FileGroup) -> PathBuf {
    match &group.cwd {
        Some(cwd) => normalize(&cwd.join(&group.dest)),
        None => normalize(&group.dest),
    }
}

/// Processes one file group.
///
/// Never fails as a whole: unreadable files, a destination that cannot be
/// created, and images that cannot be moved are all recorded in the report.
pub fn run_group(group: &FileGroup, options: &Options) -> GroupReport {
    let target_uri = options
        .new_relative_uri
        .clone()
        .unwrap_or_else(|| group.dest.to_string_lossy().into_owned());
    let destination = destination_dir(group);

    let files: Vec<FileStatus> = source_files(group)
        .iter()
        .map(|file| rewrite_file(file, &options.valid_formats, &target_uri, options.dry_run))
        .collect();

    let images = unique_images(files.iter().flat_map(|f| f.images()));

    let destination_error = if options.dry_run {
        None
    } else {
        ensure_destination(&destination).err().map(|err| {
            warn!("{err}");
            err.to_string()
        })
    };

    let relocations = relocate(&images, &destination, options.dry_run);

    let report = GroupReport {
        destination,
        target_uri,
        dry_run: options.dry_run,
        files,
        images,
        destination_error,
        relocations,
    };
    let d = report.diagnostics();
    info!(
        files_scanned = d.files_scanned,
        images_found = d.images_found,
        images_moved = d.images_moved,
        "completed file group"
    );
    report
}

/// Deduplicates image paths, keeping each one's first occurrence.
fn unique_images<'a>(paths: impl Iterator<Item = &'a PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .filter(|path| seen.insert(path.as_path()))
        .cloned()
        .collect()
}

fn ensure_destination(destination: &Path) -> Result<(), Error> {
    if destination.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(destination).map_err(|source| Error::CreateDir {
        path: destination.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn group(cwd: &Path, src: &[&str], dest: &str) -> FileGroup {
        FileGroup {
            cwd: Some(cwd.to_path_buf()),
            src: src.iter().map(PathBuf::from).collect(),
            dest: PathBuf::from(dest),
        }
    }

    #[test]
    fn source_files_join_cwd_and_drop_empty() {
        let g = FileGroup {
            cwd: Some(PathBuf::from("site")),
            src: vec![PathBuf::from("./index.html"), PathBuf::new(), PathBuf::from("css/../a.css")],
            dest: PathBuf::from("assets"),
        };
        assert_eq!(
            source_files(&g),
            vec![PathBuf::from("site/index.html"), PathBuf::from("site/a.css")]
        );
        assert_eq!(destination_dir(&g), PathBuf::from("site/assets"));
    }

    #[test]
    fn aggregate_is_deduplicated_across_files() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("a.html"), r#"<img src="img/x.png">"#);
        write(&tmp.path().join("b.html"), r#"<img src="img/x.png"><img src="img/y.gif">"#);
        write(&tmp.path().join("img/x.png"), "x");
        write(&tmp.path().join("img/y.gif"), "y");

        let options = Options {
            new_relative_uri: Some("assets/".into()),
            ..Options::default()
        };
        let report = run_group(&group(tmp.path(), &["a.html", "b.html"], "assets"), &options);

        assert_eq!(
            report.images,
            vec![tmp.path().join("img/x.png"), tmp.path().join("img/y.gif")]
        );
        let d = report.diagnostics();
        assert_eq!(d.files_scanned, 2);
        assert_eq!(d.images_found, 2);
        assert_eq!(d.images_moved, 2);
        assert_eq!(d.dirs_removed, 1);
        assert!(tmp.path().join("assets/x.png").exists());
        assert!(tmp.path().join("assets/y.gif").exists());
        assert!(!tmp.path().join("img").exists());
    }

    #[test]
    fn target_uri_defaults_to_dest() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("index.html"), r#"<img src="a.png">"#);

        let report = run_group(&group(tmp.path(), &["index.html"], "public/img"), &Options::default());
        assert_eq!(report.target_uri, "public/img");
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("index.html")).unwrap(),
            r#"<img src="public/img/a.png">"#
        );
    }

    #[test]
    fn failing_file_does_not_abort_group() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("ok.css"), ".a{background:url(a.png);}");
        write(&tmp.path().join("a.png"), "a");

        let report = run_group(
            &group(tmp.path(), &["missing.html", "readme.txt", "ok.css"], "assets"),
            &Options::default(),
        );
        let d = report.diagnostics();
        assert_eq!(d.files_failed, 1);
        assert_eq!(d.files_skipped, 1);
        assert_eq!(d.files_rewritten, 1);
        assert_eq!(d.images_moved, 1);
        assert!(tmp.path().join("assets/a.png").exists());
    }

    #[test]
    fn destination_creation_failure_is_recorded() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("index.html"), r#"<img src="a.png">"#);
        write(&tmp.path().join("a.png"), "a");
        // A file where the destination directory should be.
        write(&tmp.path().join("assets"), "not a dir");

        let report = run_group(&group(tmp.path(), &["index.html"], "assets"), &Options::default());
        assert!(report.destination_error.is_some());
        assert_eq!(report.diagnostics().relocation_failures, 1);
        assert!(tmp.path().join("a.png").exists());
    }

    #[test]
    fn dry_run_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        let html = r#"<img src="img/a.png">"#;
        write(&tmp.path().join("index.html"), html);
        write(&tmp.path().join("img/a.png"), "a");

        let options = Options {
            dry_run: true,
            ..Options::default()
        };
        let report = run_group(&group(tmp.path(), &["index.html"], "assets"), &options);
        assert_eq!(report.diagnostics().images_moved, 1);
        assert_eq!(std::fs::read_to_string(tmp.path().join("index.html")).unwrap(), html);
        assert!(tmp.path().join("img/a.png").exists());
        assert!(!tmp.path().join("assets").exists());
    }
}
