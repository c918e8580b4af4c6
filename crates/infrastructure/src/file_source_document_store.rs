//! Source document store backed by the local file system.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use prcard_application::SourceDocumentStore;
use prcard_core::{AppError, AppResult};

/// Reads the source form from a fixed path on every call.
#[derive(Debug, Clone)]
pub struct FileSourceDocumentStore {
    path: PathBuf,
}

impl FileSourceDocumentStore {
    /// Creates a store for the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SourceDocumentStore for FileSourceDocumentStore {
    async fn load(&self) -> AppResult<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => AppError::NotFound(format!(
                    "source document '{}' does not exist",
                    self.path.display()
                )),
                _ => AppError::Internal(format!(
                    "failed to read source document '{}': {error}",
                    self.path.display()
                )),
            })
    }
}
