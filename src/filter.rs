//! Reference filtering.
//!
//! Drops blank references, splits the rest by whether their extension is an
//! accepted image format, and deduplicates the accepted side.

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Image extensions accepted when no `validformats` option is given.
pub const DEFAULT_VALID_FORMATS: &[&str] = &["png", "gif", "jpg", "jpeg", "bmp"];

/// Outcome of filtering one file's references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filtered {
    /// Accepted references, unique, in first-seen order.
    pub accepted: Vec<String>,
    /// References whose extension is not accepted, as found.
    pub rejected: Vec<String>,
}

/// Returns the extension of a raw reference, without the dot.
///
/// Query strings or fragments are not stripped, so `a.png?v=2` has the
/// extension `png?v=2`.
pub fn reference_extension(reference: &str) -> &str {
    Path::new(reference)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
}

/// Partitions `refs` into accepted and rejected references.
///
/// Extensions are compared case-sensitively against `valid_formats`.
pub fn filter_references<S: AsRef<str>>(refs: &[String], valid_formats: &[S]) -> Filtered {
    let mut filtered = Filtered::default();
    let mut seen = HashSet::new();

    for reference in refs {
        if reference.trim().is_empty() {
            continue;
        }
        let ext = reference_extension(reference);
        if valid_formats.iter().any(|f| f.as_ref() == ext) {
            if seen.insert(reference.as_str()) {
                filtered.accepted.push(reference.clone());
            }
        } else {
            filtered.rejected.push(reference.clone());
        }
    }

    filtered
}
