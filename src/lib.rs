//! image-consolidate library for gathering referenced images into one directory.
//!
//! Scans HTML and CSS files for image references, rewrites each reference to
//! point into a single destination directory, and moves the image files
//! there. The workflow for one file group has three phases:
//!
//! 1. **Extraction**: find `<img src>` values and CSS background `url(...)`
//!    values, drop ignored extensions and duplicates
//! 2. **Rewriting**: replace every occurrence of each reference with its
//!    basename under the target URI, and write the file back
//! 3. **Relocation**: move every discovered image into the destination and
//!    remove source directories left empty
//!
//! # Example
//!
//! ```no_run
//! use image_consolidate::{config::{GroupSpec, Options}, orchestrator};
//! use std::path::PathBuf;
//!
//! let spec = GroupSpec {
//!     cwd: Some(PathBuf::from("site")),
//!     src: vec!["**/*.html".into(), "**/*.css".into()],
//!     dest: PathBuf::from("assets"),
//! };
//! let group = spec.expand().unwrap();
//! let report = orchestrator::run_group(&group, &Options::default());
//!
//! let d = report.diagnostics();
//! println!("{} source files scanned, {} images found", d.files_scanned, d.images_found);
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod orchestrator;
pub mod relocator;
pub mod resolver;
pub mod rewriter;

// Re-export commonly used types at crate root
pub use config::{FileGroup, GroupSpec, Options, TaskConfig};
pub use error::{Error, Result};
pub use extractor::Format;
pub use orchestrator::{Diagnostics, GroupReport, run_group};
pub use relocator::{Relocation, RelocationStatus};
pub use rewriter::{FileScan, FileStatus};
