//! In-memory document store

pub mod document;

pub use document::DocumentStore;
