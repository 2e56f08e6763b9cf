//! Run-scoped workspace shared between components.
//!
//! The workspace is a base directory with one subdirectory per component
//! identifier:
//!
//! ```text
//! <base>/
//! ├── sample_params_helper/
//! │   └── sample_params.json
//! └── findings/
//!     └── ...
//! ```
//!
//! A component writes only inside its own subdirectory, which is created on
//! first write. Reading another component's files is how helpers hand data to
//! plugins, so [`ComponentWorkspace::read_json_from`] and
//! [`ComponentWorkspace::has_file_from`] allow it.
//!
//! File names are plain relative names; absolute paths and `..` are rejected.
//! A workspace can be a persistent directory (left in place after the run for
//! inspection) or a temporary directory removed once the last handle drops.

use crate::core::error::{MosaicError, Result};
use crate::core::file_error::{FileOperation, FileResultExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Workspace {
    base: PathBuf,
    // Keeps a temporary base alive for as long as any handle exists.
    _temp: Option<Arc<TempDir>>,
}

impl Workspace {
    /// Use an existing directory, which must be a writable directory.
    pub fn open(base: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(base).with_file_context(
            FileOperation::Metadata,
            base,
            "workspace",
        )?;
        if !metadata.is_dir() {
            return Err(MosaicError::InvalidWorkspacePath {
                path: base.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }
        if metadata.permissions().readonly() {
            return Err(MosaicError::InvalidWorkspacePath {
                path: base.display().to_string(),
                reason: "directory is read-only".to_string(),
            });
        }
        Ok(Self {
            base: base.to_path_buf(),
            _temp: None,
        })
    }

    /// Create `base` (and parents) if needed, then open it.
    pub fn create(base: &Path) -> Result<Self> {
        std::fs::create_dir_all(base).with_file_context(
            FileOperation::CreateDir,
            base,
            "workspace",
        )?;
        Self::open(base)
    }

    /// A fresh temporary directory, deleted when the last handle is dropped.
    pub fn temporary() -> Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix("mosaic-")
            .tempdir()
            .with_file_context(FileOperation::CreateDir, std::env::temp_dir(), "workspace")?;
        debug!("Created temporary workspace {}", temp.path().display());
        Ok(Self {
            base: temp.path().to_path_buf(),
            _temp: Some(Arc::new(temp)),
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn is_temporary(&self) -> bool {
        self._temp.is_some()
    }

    /// The subdirectory handle for `identifier`. The directory itself is
    /// created lazily on first write.
    pub fn for_component(&self, identifier: &str) -> ComponentWorkspace {
        ComponentWorkspace {
            workspace: self.clone(),
            owner: identifier.to_string(),
        }
    }
}

/// One component's view of the workspace.
#[derive(Debug, Clone)]
pub struct ComponentWorkspace {
    workspace: Workspace,
    owner: String,
}

impl ComponentWorkspace {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// This component's subdirectory.
    pub fn dir(&self) -> PathBuf {
        self.workspace.base.join(&self.owner)
    }

    /// Absolute path of `name` inside this component's subdirectory.
    pub fn abs_path(&self, name: &str) -> Result<PathBuf> {
        resolve(&self.workspace.base, &self.owner, name)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.abs_path(name).is_ok_and(|path| path.is_file())
    }

    pub fn has_file_from(&self, owner: &str, name: &str) -> bool {
        resolve(&self.workspace.base, owner, name).is_ok_and(|path| path.is_file())
    }

    pub fn read_string(&self, name: &str) -> Result<String> {
        self.read_string_from(&self.owner, name)
    }

    /// Read a file from another component's subdirectory.
    pub fn read_string_from(&self, owner: &str, name: &str) -> Result<String> {
        let path = resolve(&self.workspace.base, owner, name)?;
        let text = std::fs::read_to_string(&path).with_file_context(
            FileOperation::Read,
            &path,
            &self.owner,
        )?;
        Ok(text)
    }

    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.read_json_from(&self.owner, name)
    }

    pub fn read_json_from<T: DeserializeOwned>(&self, owner: &str, name: &str) -> Result<T> {
        let text = self.read_string_from(owner, name)?;
        serde_json::from_str(&text).map_err(|e| {
            MosaicError::other(format!("Invalid JSON in workspace file {owner}/{name}: {e}"))
        })
    }

    pub fn write_string(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.abs_path(name)?;
        let dir = path.parent().map_or_else(|| self.dir(), Path::to_path_buf);
        std::fs::create_dir_all(&dir).with_file_context(FileOperation::CreateDir, &dir, &self.owner)?;
        std::fs::write(&path, content).with_file_context(FileOperation::Write, &path, &self.owner)?;
        debug!("Wrote workspace file {}", path.display());
        Ok(path)
    }

    /// Write `value` as pretty-printed JSON.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let text = serde_json::to_string_pretty(value)?;
        self.write_string(name, &text)
    }

    pub fn remove_file(&self, name: &str) -> Result<()> {
        let path = self.abs_path(name)?;
        std::fs::remove_file(&path).with_file_context(FileOperation::Remove, &path, &self.owner)?;
        Ok(())
    }
}

fn resolve(base: &Path, owner: &str, name: &str) -> Result<PathBuf> {
    let invalid = |reason: &str| MosaicError::InvalidWorkspacePath {
        path: format!("{owner}/{name}"),
        reason: reason.to_string(),
    };

    for part in [owner, name] {
        if part.is_empty() {
            return Err(invalid("empty path component"));
        }
        let path = Path::new(part);
        if path.is_absolute() {
            return Err(invalid("absolute paths are not allowed"));
        }
        if path.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(invalid("path must not contain '..' or '.' components"));
        }
    }
    if Path::new(owner).components().count() != 1 {
        return Err(invalid("component directory must be a single name"));
    }

    Ok(base.join(owner).join(name))
}
