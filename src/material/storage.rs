// src/material/storage.rs
// Local-directory file storage for uploaded materials

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::{OakError, Result};

#[derive(Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `bytes` under a fresh unique name that keeps the original extension.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.root).await?;

        let file_name = match Path::new(original_name).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
            None => Uuid::new_v4().to_string(),
        };

        fs::write(self.path_for(&file_name)?, bytes).await?;
        debug!("Stored {} ({} bytes) as {}", original_name, bytes.len(), file_name);
        Ok(file_name)
    }

    pub async fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.path_for(file_name)?).await?)
    }

    pub async fn delete(&self, file_name: &str) -> Result<()> {
        fs::remove_file(self.path_for(file_name)?).await?;
        Ok(())
    }

    pub async fn exists(&self, file_name: &str) -> bool {
        match self.path_for(file_name) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Stored names are flat; anything that could escape the root is rejected.
    fn path_for(&self, file_name: &str) -> Result<PathBuf> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return Err(OakError::Storage(format!("invalid file name '{file_name}'")));
        }
        Ok(self.root.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let name = storage.save("Notes.TXT", b"cells").await.unwrap();
        assert!(name.ends_with(".txt"));
        assert!(storage.exists(&name).await);
        assert_eq!(storage.read(&name).await.unwrap(), b"cells");

        storage.delete(&name).await.unwrap();
        assert!(!storage.exists(&name).await);
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.read("../secret").await.is_err());
    }
}
