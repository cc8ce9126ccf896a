//! Database handle
//!
//! Mutations update the in-memory store synchronously, re-arm the debounced
//! flush, then notify listeners. Reads never touch the blob store.

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::events::{Event, EventBus, EventKind, Listener, ListenerId};
use crate::persistence::{FlushScheduler, codec};
use crate::query::{self, FindOptions, Query};
use crate::storage::{BlobStore, FsBlobStore};
use crate::store::DocumentStore;
use crate::value::{Document, Value};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error, info};

struct Shared {
    location: String,
    config: Config,
    blob: Arc<dyn BlobStore>,
    store: Mutex<DocumentStore>,
    events: EventBus,
    scheduler: Arc<FlushScheduler>,
    // Serializes flushes so a slower, older snapshot never lands last
    write_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    async fn flush(&self) -> StoreResult<()> {
        {
            let _guard = self.write_lock.lock().await;
            let snapshot = self.store.lock().snapshot();
            let bytes = codec::encode(&snapshot, self.config.pretty)?;

            self.write(&bytes).await.map_err(|source| StoreError::Save {
                location: self.location.clone(),
                source,
            })?;

            debug!(location = %self.location, keys = snapshot.len(), bytes = bytes.len(), "Flushed database");
        }

        self.events.emit(&Event::Saved)
    }

    async fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        self.blob.ensure_exists(&self.location).await?;
        self.blob.write(&self.location, bytes).await
    }

    /// Flush fired by the scheduler. Nobody awaits it, so failures are logged
    /// and broadcast as [`Event::SaveFailed`].
    async fn flush_in_background(&self) {
        match self.flush().await {
            Ok(()) => {}
            Err(err @ StoreError::Listener { .. }) => {
                error!(location = %self.location, error = %err, "Listener failed after background save");
            }
            Err(err) => {
                error!(location = %self.location, error = %err, "Background save failed");
                let event = Event::SaveFailed {
                    message: err.to_string(),
                };
                if let Err(listener_err) = self.events.emit(&event) {
                    error!(location = %self.location, error = %listener_err, "Listener failed while reporting save failure");
                }
            }
        }
    }
}

/// Handle to an open database. Clones share the same store.
#[derive(Clone)]
pub struct Database {
    shared: Arc<Shared>,
}

impl Database {
    /// Open the database at `path` with the default configuration
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::builder(path).open().await
    }

    pub async fn open_with(path: impl AsRef<Path>, config: Config) -> StoreResult<Self> {
        Self::builder(path).config(config).open().await
    }

    pub fn builder(path: impl AsRef<Path>) -> DatabaseBuilder {
        DatabaseBuilder::new(path)
    }

    /// Bootstrap: adopt stored contents, or create the location when absent.
    async fn load(&self) -> StoreResult<()> {
        let shared = &self.shared;
        let contents = shared
            .blob
            .read(&shared.location)
            .await
            .map_err(|source| StoreError::Load {
                location: shared.location.clone(),
                source,
            })?;

        match contents {
            Some(bytes) => {
                let documents = codec::decode(&shared.location, &bytes)?;
                info!(location = %shared.location, keys = documents.len(), "Loaded database");
                *shared.store.lock() = DocumentStore::from(documents);
            }
            None => {
                info!(location = %shared.location, "Creating database");
                shared.flush().await?;
            }
        }

        shared.events.emit(&Event::Loaded)
    }

    fn schedule_flush(&self) {
        let shared = Arc::clone(&self.shared);
        self.shared
            .scheduler
            .schedule(move || async move { shared.flush_in_background().await });
    }

    /// Insert or overwrite a key
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> StoreResult<()> {
        let key = key.into();
        let value = value.into();

        self.shared.store.lock().set(key.clone(), value.clone());
        self.schedule_flush();
        self.shared.events.emit(&Event::Updated { key, value })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.shared.store.lock().get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.shared.store.lock().has(key)
    }

    /// Remove a key. Returns false, without scheduling a flush or notifying
    /// listeners, when the key is absent.
    pub fn delete(&self, key: &str) -> StoreResult<bool> {
        if self.shared.store.lock().delete(key).is_none() {
            return Ok(false);
        }

        self.schedule_flush();
        self.shared.events.emit(&Event::Deleted {
            key: key.to_string(),
        })?;
        Ok(true)
    }

    /// Remove every key. Always schedules a flush and notifies, even when the
    /// store was already empty.
    pub fn clear(&self) -> StoreResult<()> {
        self.shared.store.lock().clear();
        self.schedule_flush();
        self.shared.events.emit(&Event::Cleared)
    }

    pub fn find(&self, query: &Query, options: &FindOptions) -> Vec<Value> {
        let store = self.shared.store.lock();
        query::find(store.values(), query, options)
    }

    pub fn count(&self, query: &Query) -> usize {
        let store = self.shared.store.lock();
        query::count(store.values(), query)
    }

    pub fn len(&self) -> usize {
        self.shared.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.store.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.shared.store.lock().keys().cloned().collect()
    }

    /// Independent copy of the full mapping
    pub fn snapshot(&self) -> Document {
        self.shared.store.lock().snapshot()
    }

    /// Flush now, whether or not autosave is enabled.
    ///
    /// An armed timer stays armed; its later flush writes the same or newer
    /// state.
    pub async fn save(&self) -> StoreResult<()> {
        self.shared.flush().await
    }

    /// Flush any pending debounced write and release this handle.
    ///
    /// Returns only once no flush is still writing, including one whose timer
    /// fired before the call.
    pub async fn close(self) -> StoreResult<()> {
        let pending = self.shared.scheduler.cancel();
        self.shared.scheduler.wait_idle().await;
        if pending {
            self.shared.flush().await?;
        }
        info!(location = %self.shared.location, "Closed database");
        Ok(())
    }

    /// Whether a debounced flush is waiting to fire
    pub fn is_save_pending(&self) -> bool {
        self.shared.scheduler.is_armed()
    }

    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.shared.events.subscribe(kind, listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.events.unsubscribe(id)
    }

    /// Resolved identifier of the backing blob
    pub fn location(&self) -> &str {
        &self.shared.location
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }
}

/// Configures and opens a [`Database`].
pub struct DatabaseBuilder {
    path: PathBuf,
    config: Config,
    blob: Option<Arc<dyn BlobStore>>,
    listeners: Vec<(EventKind, Listener)>,
}

impl DatabaseBuilder {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config: Config::default(),
            blob: None,
            listeners: Vec::new(),
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn auto_save(mut self, enabled: bool) -> Self {
        self.config.auto_save = enabled;
        self
    }

    pub fn save_timeout_ms(mut self, millis: u64) -> Self {
        self.config.save_timeout_ms = millis;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.config.pretty = pretty;
        self
    }

    /// Use a custom blob store instead of the filesystem
    pub fn blob_store(mut self, blob: impl BlobStore + 'static) -> Self {
        let blob: Arc<dyn BlobStore> = Arc::new(blob);
        self.blob = Some(blob);
        self
    }

    /// Register a listener before the bootstrap load, so it sees `Loaded` and
    /// the `Saved` of a newly created database.
    pub fn on<F>(mut self, kind: EventKind, listener: F) -> Self
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.listeners.push((kind, listener));
        self
    }

    /// Open the database, loading or creating its backing blob.
    ///
    /// Must be called from within a tokio runtime; debounced flushes are
    /// spawned onto that runtime.
    pub async fn open(self) -> StoreResult<Database> {
        let runtime = Handle::try_current().map_err(|e| StoreError::Runtime(e.to_string()))?;
        let blob = self.blob.unwrap_or_else(|| Arc::new(FsBlobStore::new()));
        let location = blob.resolve(&self.path.to_string_lossy())?;

        let events = EventBus::new();
        for (kind, listener) in self.listeners {
            events.subscribe_shared(kind, listener);
        }

        let scheduler = Arc::new(FlushScheduler::new(
            self.config.auto_save,
            self.config.save_timeout(),
            runtime,
        ));

        let database = Database {
            shared: Arc::new(Shared {
                location,
                config: self.config,
                blob,
                store: Mutex::new(DocumentStore::new()),
                events,
                scheduler,
                write_lock: tokio::sync::Mutex::new(()),
            }),
        };

        database.load().await?;
        Ok(database)
    }
}
