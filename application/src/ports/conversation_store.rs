//! Conversation storage port
//!
//! A key → bytes blob interface. Object storage and a local directory both
//! implement it; the archive use case owns key derivation and JSON encoding.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a storage backend. A missing key is not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Transient: the backend could not be reached or asked us to back off.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid conversation name: {0:?}")]
    InvalidName(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Whether the operation may succeed if repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

/// Blob storage for persisted conversation records
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Short backend name for logs (e.g. "local", "s3")
    fn backend(&self) -> &str;

    /// Write `bytes` at `key`, overwriting any existing object
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Read the object at `key`; `Ok(None)` when it does not exist
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// List keys starting with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}
