//! Image relocation.
//!
//! Moves each discovered image into the destination directory under its
//! basename, one at a time. A source directory emptied by a move is removed.
//! Every image gets its own status; one failure never stops the rest.

use crate::error::Error;
use crate::resolver::{absolute, normalize};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What happened to one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RelocationStatus {
    Moved {
        /// Source directory removed because the move left it empty.
        removed_dir: Option<PathBuf>,
        /// Set when the emptied directory could not be removed.
        cleanup_error: Option<String>,
    },
    /// Dry run: the image exists and would be moved.
    WouldMove,
    /// Source and target are the same location.
    AlreadyInPlace,
    NotFound,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
    pub source: PathBuf,
    pub target: PathBuf,
    #[serde(flatten)]
    pub status: RelocationStatus,
}

/// Target location of `image` inside `destination`.
pub fn target_for(image: &Path, destination: &Path) -> PathBuf {
    match image.file_name() {
        Some(name) => normalize(&destination.join(name)),
        None => normalize(destination),
    }
}

/// Moves every image into `destination`, in order.
pub fn relocate(images: &[PathBuf], destination: &Path, dry_run: bool) -> Vec<Relocation> {
    images
        .iter()
        .map(|image| relocate_one(image, destination, dry_run))
        .collect()
}

fn relocate_one(source: &Path, destination: &Path, dry_run: bool) -> Relocation {
    let target = target_for(source, destination);
    let status = if absolute(&target) == absolute(source) {
        debug!(image = %source.display(), "already in destination");
        RelocationStatus::AlreadyInPlace
    } else if !source.exists() {
        warn!(image = %source.display(), "image not found");
        RelocationStatus::NotFound
    } else if dry_run {
        RelocationStatus::WouldMove
    } else {
        match move_image(source, &target) {
            Ok(status) => status,
            Err(err) => {
                warn!(image = %source.display(), "{err}");
                RelocationStatus::Failed {
                    reason: err.to_string(),
                }
            }
        }
    };

    Relocation {
        source: source.to_path_buf(),
        target,
        status,
    }
}

fn move_image(source: &Path, target: &Path) -> Result<RelocationStatus, Error> {
    std::fs::rename(source, target).map_err(|err| Error::Rename {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
        source: err,
    })?;
    info!(from = %source.display(), to = %target.display(), "moved image");

    let Some(dir) = source.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(RelocationStatus::Moved {
            removed_dir: None,
            cleanup_error: None,
        });
    };

    Ok(match remove_if_empty(dir) {
        Ok(true) => RelocationStatus::Moved {
            removed_dir: Some(dir.to_path_buf()),
            cleanup_error: None,
        },
        Ok(false) => RelocationStatus::Moved {
            removed_dir: None,
            cleanup_error: None,
        },
        Err(err) => {
            warn!(dir = %dir.display(), "{err}");
            RelocationStatus::Moved {
                removed_dir: None,
                cleanup_error: Some(err.to_string()),
            }
        }
    })
}

/// Removes `dir` if it has no entries. Returns whether it was removed.
fn remove_if_empty(dir: &Path) -> Result<bool, Error> {
    let remove_err = |source: std::io::Error| Error::RemoveDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = std::fs::read_dir(dir).map_err(remove_err)?;
    if entries.next().is_some() {
        return Ok(false);
    }
    std::fs::remove_dir(dir).map_err(remove_err)?;
    debug!(dir = %dir.display(), "removed empty directory");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"img").unwrap();
    }

    #[test]
    fn target_is_basename_under_destination() {
        assert_eq!(
            target_for(Path::new("site/img/a.png"), Path::new("site/assets")),
            PathBuf::from("site/assets/a.png")
        );
        assert_eq!(
            target_for(Path::new("a.png"), Path::new("./out/../assets")),
            PathBuf::from("assets/a.png")
        );
    }

    #[test]
    fn moves_image_and_removes_emptied_dir() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site/img/a.png");
        let dest = tmp.path().join("site/assets");
        touch(&source);
        std::fs::create_dir_all(&dest).unwrap();

        let results = relocate(std::slice::from_ref(&source), &dest, false);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].status,
            RelocationStatus::Moved {
                removed_dir: Some(tmp.path().join("site/img")),
                cleanup_error: None,
            }
        );
        assert!(dest.join("a.png").exists());
        assert!(!source.exists());
        assert!(!tmp.path().join("site/img").exists());
    }

    #[test]
    fn keeps_dir_that_still_has_entries() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("img/a.png");
        touch(&source);
        touch(&tmp.path().join("img/keep.txt"));
        let dest = tmp.path().join("assets");
        std::fs::create_dir_all(&dest).unwrap();

        let results = relocate(&[source], &dest, false);
        assert_eq!(
            results[0].status,
            RelocationStatus::Moved {
                removed_dir: None,
                cleanup_error: None,
            }
        );
        assert!(tmp.path().join("img").is_dir());
    }

    #[test]
    fn image_already_in_destination_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("assets");
        let image = dest.join("a.png");
        touch(&image);

        let results = relocate(&[dest.join("../assets/a.png")], &dest, false);
        assert_eq!(results[0].status, RelocationStatus::AlreadyInPlace);
        assert!(image.exists());
    }

    #[test]
    fn missing_image_does_not_stop_the_batch() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("assets");
        std::fs::create_dir_all(&dest).unwrap();
        let present = tmp.path().join("img/b.gif");
        touch(&present);

        let results = relocate(&[tmp.path().join("img/missing.png"), present], &dest, false);
        assert_eq!(results[0].status, RelocationStatus::NotFound);
        assert!(matches!(results[1].status, RelocationStatus::Moved { .. }));
        assert!(dest.join("b.gif").exists());
    }

    #[test]
    fn rename_failure_is_recorded() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("img/a.png");
        touch(&source);
        let dest = tmp.path().join("does-not-exist");

        let results = relocate(std::slice::from_ref(&source), &dest, false);
        match &results[0].status {
            RelocationStatus::Failed { reason } => assert!(reason.contains("failed to move")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(source.exists());
    }

    #[test]
    fn dry_run_moves_nothing() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("img/a.png");
        touch(&source);
        let dest = tmp.path().join("assets");

        let results = relocate(std::slice::from_ref(&source), &dest, true);
        assert_eq!(results[0].status, RelocationStatus::WouldMove);
        assert!(source.exists());
        assert!(!dest.exists());
    }
}
