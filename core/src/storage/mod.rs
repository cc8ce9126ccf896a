//! Durable blob storage backing a database file

pub mod blob;
pub mod disk;
pub mod memory;

pub use blob::BlobStore;
pub use disk::FsBlobStore;
pub use memory::MemoryBlobStore;
