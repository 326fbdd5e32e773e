use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Where a referenced resource lives. Only local paths exist today.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Local,
}

/// Relative pointer from a parent artifact's metadata to a child artifact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub path: String,
}

impl ResourceRef {
    /// A local reference. The path must be relative and must not climb out of
    /// the parent directory.
    pub fn local(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        let p = Path::new(&path);
        let escapes = p
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(TypeError::InvalidResourcePath(path));
        }
        Ok(Self {
            kind: ResourceKind::Local,
            path,
        })
    }

    /// Absolute location of the referenced resource under `base`.
    pub fn resolve(&self, base: &Path) -> PathBuf {
        base.join(&self.path)
    }
}
