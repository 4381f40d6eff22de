//! Client-side persistence for the Eventify session.
//!
//! Everything stored here is advisory: an identity hint shown before the
//! server confirms the session, the email awaiting OTP verification, and the
//! cookies carrying the server-issued credential between runs.
//!
//! Backends:
//! - [`FileStorage`]: a single JSON document on disk
//! - [`MemoryStorage`]: process-local, for tests and ephemeral sessions

mod file;
mod keys;
mod memory;
mod session_cache;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use session_cache::{PersistedHint, SessionCache};
pub use traits::KeyValueStorage;

use std::path::Path;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create a SessionCache backed by a JSON file at `path`.
pub fn create_session_cache(path: &Path) -> StorageResult<SessionCache> {
    let storage = FileStorage::open(path)?;
    Ok(SessionCache::new(Box::new(storage)))
}

/// Create a SessionCache that lives only as long as the process.
pub fn create_memory_session_cache() -> SessionCache {
    SessionCache::new(Box::new(MemoryStorage::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();

        storage.set("test_key", "test_value").unwrap();
        assert_eq!(storage.get("test_key").unwrap(), Some("test_value".to_string()));

        assert!(storage.has("test_key").unwrap());
        assert!(!storage.has("nonexistent").unwrap());

        assert!(storage.delete("test_key").unwrap());
        assert!(!storage.delete("test_key").unwrap());
        assert_eq!(storage.get("test_key").unwrap(), None);
    }

    #[test]
    fn test_create_session_cache_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let cache = create_session_cache(&path).unwrap();
        cache.set_pending_otp_email("a@example.com").unwrap();
        drop(cache);

        let reopened = create_session_cache(&path).unwrap();
        assert_eq!(
            reopened.pending_otp_email().unwrap(),
            Some("a@example.com".to_string())
        );
    }

    #[test]
    fn test_storage_keys_unique() {
        let keys = [
            StorageKeys::AUTH_STORAGE,
            StorageKeys::OTP_EMAIL,
            StorageKeys::SAVED_COOKIES,
        ];
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len(), "Storage keys must be unique");
    }
}
