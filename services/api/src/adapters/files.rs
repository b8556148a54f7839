//! services/api/src/adapters/files.rs
//!
//! This module contains the upload-storage adapter, which is the concrete
//! implementation of the `FileStorageService` port from the `core` crate.
//! It writes doubt images and assignment submissions under a single upload
//! root on the local filesystem.

use async_trait::async_trait;
use learnmatrix_core::ports::{FileStorageService, PortError, PortResult};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `FileStorageService` port on local disk.
#[derive(Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Creates a new `LocalFileStorage` rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    async fn write(&self, relative: &Path, bytes: &[u8]) -> PortResult<()> {
        let absolute = self.root.join(relative);
        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        tokio::fs::write(&absolute, bytes)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `FileStorageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl FileStorageService for LocalFileStorage {
    async fn save_doubt_image(&self, stored_name: &str, bytes: &[u8]) -> PortResult<String> {
        let relative = Path::new("doubts").join(stored_name);
        self.write(&relative, bytes).await?;
        Ok(relative.to_string_lossy().into_owned())
    }

    async fn save_submission(
        &self,
        assignment_id: Uuid,
        stored_name: &str,
        bytes: &[u8],
    ) -> PortResult<(String, i64)> {
        let relative = Path::new("submissions")
            .join(assignment_id.to_string())
            .join(stored_name);
        self.write(&relative, bytes).await?;
        Ok((relative.to_string_lossy().into_owned(), bytes.len() as i64))
    }

    fn resolve(&self, relative_path: &str) -> PortResult<PathBuf> {
        let relative = Path::new(relative_path);
        // Stored paths are always plain `dir/file` fragments; anything
        // absolute or containing `..` is not one of ours.
        let escapes = relative.components().any(|c| {
            !matches!(c, Component::Normal(_))
        });
        if escapes {
            return Err(PortError::NotFound(relative_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_traversal() {
        let storage = LocalFileStorage::new(PathBuf::from("/srv/uploads"));
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        let ok = storage.resolve("doubts/1700000000_graph.png").unwrap();
        assert_eq!(ok, PathBuf::from("/srv/uploads/doubts/1700000000_graph.png"));
    }
}
