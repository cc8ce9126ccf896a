//! In-process blob store for tests and ephemeral databases

use crate::storage::BlobStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
struct Inner {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

/// Blob store kept in memory. Clones share the same contents.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Inner>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob without counting it as a write
    pub fn with_blob(self, id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.inner.blobs.lock().insert(id.into(), bytes.into());
        self
    }

    pub fn contents(&self, id: &str) -> Option<Vec<u8>> {
        self.inner.blobs.lock().get(id).cloned()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Make every following write fail until switched back
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, id: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.contents(id))
    }

    async fn write(&self, id: &str, bytes: &[u8]) -> io::Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "writes are disabled",
            ));
        }

        self.inner.blobs.lock().insert(id.to_string(), bytes.to_vec());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ensure_exists(&self, _id: &str) -> io::Result<()> {
        Ok(())
    }
}
