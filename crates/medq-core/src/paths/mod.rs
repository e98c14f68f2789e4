//! Where a finished job lands on disk.

mod sanitize;

pub use sanitize::sanitize_component;

use std::path::{Path, PathBuf};

use crate::job::JobDescriptor;

/// Name used when sanitizing leaves nothing usable.
const FALLBACK_NAME: &str = "untitled";

/// Final output path: the job's destination override (or `download_root`),
/// then each sanitized extra path segment, then the sanitized file name.
/// Segments that sanitize to nothing are skipped.
///
/// With `extra_path_as_root`, the first extra path is taken verbatim as the
/// root in place of both the override and `download_root`.
pub fn output_path(download_root: &Path, job: &JobDescriptor, file_name: &str) -> PathBuf {
    let mut segments = job.extra_paths.iter();
    let explicit_root = if job.extra_path_as_root {
        segments.next().filter(|root| !root.is_empty()).map(PathBuf::from)
    } else {
        None
    };
    let mut path = explicit_root
        .or_else(|| job.destination_override.clone())
        .unwrap_or_else(|| download_root.to_path_buf());
    for segment in segments {
        let clean = sanitize_component(segment);
        if !clean.is_empty() {
            path.push(clean);
        }
    }
    let name = sanitize_component(file_name);
    if name.is_empty() {
        path.push(format!("{}-{}", FALLBACK_NAME, sanitize_component(&job.media_id)));
    } else {
        path.push(name);
    }
    path
}
