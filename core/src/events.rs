//! Lifecycle notifications
//!
//! Listeners subscribe to one [`EventKind`] each and are called synchronously,
//! in registration order, on the thread that triggered the event. A listener
//! returning an error stops the dispatch and the error reaches the caller of
//! the operation that emitted the event.

use crate::error::{StoreError, StoreResult};
use crate::value::Value;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Names of the events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
	Loaded,
	Updated,
	Deleted,
	Cleared,
	Saved,
	SaveFailed,
}

impl EventKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			EventKind::Loaded => "loaded",
			EventKind::Updated => "updated",
			EventKind::Deleted => "deleted",
			EventKind::Cleared => "cleared",
			EventKind::Saved => "saved",
			EventKind::SaveFailed => "save_failed",
		}
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An emitted event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	/// The store finished its bootstrap load
	Loaded,
	/// A key was inserted or overwritten
	Updated { key: String, value: Value },
	/// A present key was removed
	Deleted { key: String },
	/// Every key was removed
	Cleared,
	/// The durable location now holds the flushed snapshot
	Saved,
	/// A debounced flush failed; nobody awaited it, so this is its only report
	SaveFailed { message: String },
}

impl Event {
	pub fn kind(&self) -> EventKind {
		match self {
			Event::Loaded => EventKind::Loaded,
			Event::Updated { .. } => EventKind::Updated,
			Event::Deleted { .. } => EventKind::Deleted,
			Event::Cleared => EventKind::Cleared,
			Event::Saved => EventKind::Saved,
			Event::SaveFailed { .. } => EventKind::SaveFailed,
		}
	}
}

/// Callback invoked for each matching event.
pub type Listener = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
	id: ListenerId,
	kind: EventKind,
	listener: Listener,
}

/// Observer registry.
#[derive(Default)]
pub struct EventBus {
	registrations: RwLock<Vec<Registration>>,
	next_id: AtomicU64,
}

impl EventBus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a listener for one kind of event
	pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> ListenerId
	where
		F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.subscribe_shared(kind, Arc::new(listener))
	}

	pub(crate) fn subscribe_shared(&self, kind: EventKind, listener: Listener) -> ListenerId {
		let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.registrations.write().push(Registration { id, kind, listener });
		id
	}

	/// Remove a listener. Returns false if it was not registered.
	pub fn unsubscribe(&self, id: ListenerId) -> bool {
		let mut registrations = self.registrations.write();
		let before = registrations.len();
		registrations.retain(|r| r.id != id);
		registrations.len() != before
	}

	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.registrations.read().iter().filter(|r| r.kind == kind).count()
	}

	/// Dispatch an event to its listeners.
	///
	/// The registry lock is released before any listener runs, so listeners may
	/// subscribe, unsubscribe, or mutate the database that emitted the event.
	pub fn emit(&self, event: &Event) -> StoreResult<()> {
		let kind = event.kind();
		let listeners: Vec<Listener> = self
			.registrations
			.read()
			.iter()
			.filter(|r| r.kind == kind)
			.map(|r| Arc::clone(&r.listener))
			.collect();

		for listener in listeners {
			listener(event).map_err(|source| StoreError::Listener { event: kind, source })?;
		}

		Ok(())
	}
}
