//! Thesis Storage Library
//!
//! Client side of the remote storage endpoint that holds proposal documents.
//! It includes the `Storage` trait, an HTTP multipart backend and a local
//! filesystem backend for development.
//!
//! Backends report transfer progress as cumulative byte counts through a
//! [`ProgressSink`] and return an opaque [`DocumentReference`] on success.
//!
//! [`DocumentReference`]: thesis_core::models::DocumentReference

pub mod factory;
#[cfg(feature = "storage-http")]
pub mod http;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-http")]
pub use http::HttpStorage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use thesis_core::StorageBackend;
pub use traits::{ProgressSink, Storage, StorageError, StorageResult, StoredFile};

/// Chunk size used when streaming a file to a backend.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;
