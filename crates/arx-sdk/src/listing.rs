//! Discovering and checking artifacts under a directory tree.

use std::path::{Path, PathBuf};

use arx_meta::{is_object_dir, read_metadata};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{ArxError, ArxResult};
use crate::session::Arx;

/// One artifact found by [`list_objects`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Location relative to the listed directory (`.` for the directory itself).
    pub path: PathBuf,
    pub object_type: String,
    /// Nested inside another artifact.
    pub child: bool,
}

/// List every artifact under `dir`, in file-name order.
///
/// Artifact directories are only descended into when `include_children` is
/// set; plain directories are always searched.
pub fn list_objects(dir: &Path, include_children: bool) -> ArxResult<Vec<ObjectEntry>> {
    let mut found = Vec::new();
    let mut walker = WalkDir::new(dir).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
            ArxError::file(path, e.into())
        })?;
        let path = entry.path();
        if !entry.file_type().is_dir() || !is_object_dir(path) {
            continue;
        }

        let meta = read_metadata(path)?;
        let child = path
            .ancestors()
            .skip(1)
            .take_while(|a| a.starts_with(dir))
            .any(is_object_dir);
        let relative = path.strip_prefix(dir).unwrap_or(path);
        found.push(ObjectEntry {
            path: if relative.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                relative.to_path_buf()
            },
            object_type: meta.object_type().to_string(),
            child,
        });

        if !include_children {
            walker.skip_current_dir();
        }
    }
    Ok(found)
}

/// Validate every top-level artifact under `dir` against its schema and
/// content hash. Failures are collected per artifact, not propagated.
pub fn validate_directory(arx: &Arx, dir: &Path) -> ArxResult<Vec<(ObjectEntry, ArxResult<()>)>> {
    let entries = list_objects(dir, false)?;
    Ok(entries
        .into_iter()
        .map(|entry| {
            let result = arx.validate(&dir.join(&entry.path)).map(|_| ());
            if let Err(e) = &result {
                warn!(path = %entry.path.display(), error = %e, "artifact failed validation");
            }
            (entry, result)
        })
        .collect())
}
