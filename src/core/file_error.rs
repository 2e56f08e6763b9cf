//! Structured file system errors for workspace and report I/O.
//!
//! Context is captured at the operation site (what was being done, to which
//! path, on behalf of which component) instead of being reconstructed from
//! `std::io::Error` messages later.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The kind of file system operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Write,
    Remove,
    Metadata,
    CreateDir,
    Validate,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Remove => write!(f, "removing"),
            FileOperation::Metadata => write!(f, "getting metadata for"),
            FileOperation::CreateDir => write!(f, "creating directory"),
            FileOperation::Validate => write!(f, "validating"),
        }
    }
}

/// A failed file operation together with the component that requested it.
#[derive(Error, Debug)]
#[error("Failed {operation} '{}' for {owner}", path.display())]
pub struct FileOperationError {
    pub operation: FileOperation,
    pub path: PathBuf,
    /// Component identifier, or a short description of the caller.
    pub owner: String,
    #[source]
    pub source: std::io::Error,
}

impl FileOperationError {
    pub fn new(
        operation: FileOperation,
        path: impl Into<PathBuf>,
        owner: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self {
            operation,
            path: path.into(),
            owner: owner.into(),
            source,
        }
    }

    /// Human readable explanation with a hint keyed on the I/O error kind.
    pub fn user_message(&self) -> String {
        let mut message = self.to_string();
        match self.source.kind() {
            std::io::ErrorKind::NotFound => {
                message.push_str("\n\nThe path does not exist.");
            }
            std::io::ErrorKind::PermissionDenied => {
                message.push_str(&format!(
                    "\n\nPermission denied. Check permissions for: {}",
                    self.path.display()
                ));
            }
            std::io::ErrorKind::InvalidData => {
                message.push_str("\n\nThe file contains invalid data (expected UTF-8 text).");
            }
            _ => {
                message.push_str(&format!("\n\n{}", self.source));
            }
        }
        message
    }
}

/// Attach [`FileOperationError`] context to `std::io::Result` values.
pub trait FileResultExt<T> {
    fn with_file_context(
        self,
        operation: FileOperation,
        path: impl AsRef<Path>,
        owner: &str,
    ) -> Result<T, FileOperationError>;
}

impl<T> FileResultExt<T> for std::io::Result<T> {
    fn with_file_context(
        self,
        operation: FileOperation,
        path: impl AsRef<Path>,
        owner: &str,
    ) -> Result<T, FileOperationError> {
        self.map_err(|source| {
            FileOperationError::new(operation, path.as_ref().to_path_buf(), owner, source)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_context_is_attached() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result
            .with_file_context(FileOperation::Read, "/tmp/missing.json", "case_overview")
            .unwrap_err();

        assert_eq!(err.operation, FileOperation::Read);
        assert_eq!(err.owner, "case_overview");
        assert!(err.to_string().contains("Failed reading '/tmp/missing.json'"));
        assert!(err.user_message().contains("does not exist"));
    }

    #[test]
    fn test_permission_denied_message() {
        let err = FileOperationError::new(
            FileOperation::Write,
            "/readonly/out.json",
            "workspace",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.user_message().contains("Permission denied"));
    }
}
