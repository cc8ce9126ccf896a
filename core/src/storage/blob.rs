use async_trait::async_trait;
use std::io;

/// Durable storage for whole-file blobs.
///
/// Implementations must provide read-after-write consistency for a single id.
/// `write` replaces the previous contents entirely.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob, or `None` if nothing is stored under `id`.
    async fn read(&self, id: &str) -> io::Result<Option<Vec<u8>>>;

    async fn write(&self, id: &str, bytes: &[u8]) -> io::Result<()>;

    /// Prepare `id` to accept a write, e.g. by creating parent directories.
    async fn ensure_exists(&self, id: &str) -> io::Result<()>;

    /// Canonical form of an id, computed once when a database is opened.
    fn resolve(&self, id: &str) -> io::Result<String> {
        Ok(id.to_string())
    }
}
