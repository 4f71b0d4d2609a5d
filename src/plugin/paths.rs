//! Mapping a component namespace onto the output directory tree.
//!
//! The output directory stands for one segment of the namespace (its
//! *anchor*):
//!
//! 1. When the namespace's last segment names the output directory, files go
//!    straight into it.
//! 2. Otherwise the segments are walked for the first one naming the output
//!    directory, and the segments after it become subdirectories.
//! 3. Without an anchor the first segment is taken to be the crate root and
//!    the remaining segments become subdirectories.
//!
//! Directory names are compared case-insensitively and appended segments are
//! snake_cased.

use std::path::{Path, PathBuf};

use crate::components::naming::{namespace_segments, to_snake_case};

/// Directory a component of `namespace` is written to under `output`.
pub fn component_dir(output: &Path, namespace: &str) -> PathBuf {
    let segments = namespace_segments(namespace);
    let anchor = output
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_ascii_lowercase);

    let rest: &[&str] = match anchor {
        Some(anchor) => {
            if segments.last().is_some_and(|s| s.eq_ignore_ascii_case(&anchor)) {
                &[]
            } else if let Some(i) = segments.iter().position(|s| s.eq_ignore_ascii_case(&anchor)) {
                &segments[i + 1..]
            } else {
                segments.get(1..).unwrap_or(&[])
            }
        }
        None => segments.get(1..).unwrap_or(&[]),
    };

    rest.iter()
        .fold(output.to_path_buf(), |dir, segment| dir.join(to_snake_case(segment)))
}

/// Source file for `class` in `namespace` under `output`.
pub fn component_path(output: &Path, namespace: &str, class: &str) -> PathBuf {
    component_dir(output, namespace).join(format!("{}.rs", to_snake_case(class)))
}
