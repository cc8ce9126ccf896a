//! Filesystem blob store

use crate::storage::BlobStore;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Stores each blob in the file named by its id.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBlobStore;

impl FsBlobStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn read(&self, id: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(id).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write to a sibling temp file, then rename it over `id`, so a crash
    /// mid-write leaves the previous contents in place.
    async fn write(&self, id: &str, bytes: &[u8]) -> io::Result<()> {
        let temp_path = temp_path(id);
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .await?;

        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, id).await?;
        sync_parent_dir(Path::new(id)).await;

        Ok(())
    }

    async fn ensure_exists(&self, id: &str) -> io::Result<()> {
        match Path::new(id).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
            _ => Ok(()),
        }
    }

    /// Relative paths resolve against the current directory.
    fn resolve(&self, id: &str) -> io::Result<String> {
        let path = Path::new(id);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(absolute.to_string_lossy().into_owned())
    }
}

fn temp_path(id: &str) -> String {
    format!("{}.tmp", id)
}

/// Persist the rename itself. Best effort: not every platform can open a
/// directory for syncing.
async fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && let Ok(dir) = fs::File::open(parent).await
    {
        let _ = dir.sync_all().await;
    }
}
