#![allow(dead_code)]

use filedb_core::{DatabaseBuilder, Event, EventKind, MemoryBlobStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub const MEMORY_ID: &str = "memory.json";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Collects every event of the given kinds, in dispatch order.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn attach(&self, mut builder: DatabaseBuilder, kinds: &[EventKind]) -> DatabaseBuilder {
        for kind in kinds {
            let recorder = self.clone();
            builder = builder.on(*kind, move |event| {
                recorder.record(event);
                Ok(())
            });
        }
        builder
    }

    pub fn record(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(Event::kind).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

pub const ALL_EVENTS: &[EventKind] = &[
    EventKind::Loaded,
    EventKind::Updated,
    EventKind::Deleted,
    EventKind::Cleared,
    EventKind::Saved,
    EventKind::SaveFailed,
];

/// Parsed contents of the in-memory blob.
pub fn stored_json(blob: &MemoryBlobStore) -> serde_json::Value {
    let bytes = blob.contents(MEMORY_ID).expect("blob should exist");
    serde_json::from_slice(&bytes).expect("blob should be valid JSON")
}
