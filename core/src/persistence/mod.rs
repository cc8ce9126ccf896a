//! Persistence: serialized format and debounced write-back

pub mod codec;
pub mod scheduler;

pub use scheduler::FlushScheduler;
