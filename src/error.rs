//! Error types.
//!
//! Per-file and per-image failures never abort a batch; they are converted
//! into status values carrying the error's message. These variants exist so
//! that message is precise about which path and which operation failed.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove directory {}: {source}", .path.display())]
    RemoveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot build substitution for '{reference}': {source}")]
    Substitution {
        reference: String,
        #[source]
        source: regex::Error,
    },

    #[error("unrecognized extension for {} (recognized: {recognized})", .path.display())]
    UnsupportedFormat { path: PathBuf, recognized: String },

    #[error("invalid source pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}
