//! High-level API over the session store.

use crate::{KeyValueStorage, StorageError, StorageKeys, StorageResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A persisted value plus the time it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedHint<T> {
    pub value: T,
    pub saved_at: DateTime<Utc>,
}

/// Typed accessors for everything the session client persists.
pub struct SessionCache {
    storage: Box<dyn KeyValueStorage>,
}

impl SessionCache {
    /// Create a new cache over the given storage backend
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    // ==========================================
    // Identity hint
    // ==========================================

    /// Persist the last known identity.
    pub fn set_identity_hint<T: Serialize>(&self, identity: &T) -> StorageResult<()> {
        let hint = PersistedHint {
            value: identity,
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string(&hint).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::AUTH_STORAGE, &json)
    }

    /// Read the last known identity, if one was persisted and still decodes.
    pub fn identity_hint<T: DeserializeOwned>(&self) -> StorageResult<Option<PersistedHint<T>>> {
        match self.storage.get(StorageKeys::AUTH_STORAGE)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(hint) => Ok(Some(hint)),
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring undecodable identity hint");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Drop the persisted identity.
    pub fn clear_identity_hint(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::AUTH_STORAGE)?;
        Ok(())
    }

    // ==========================================
    // Pending OTP
    // ==========================================

    /// Remember which email is waiting for OTP verification.
    pub fn set_pending_otp_email(&self, email: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::OTP_EMAIL, email)
    }

    /// Email waiting for OTP verification.
    pub fn pending_otp_email(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::OTP_EMAIL)
    }

    /// Forget the pending OTP email.
    pub fn clear_pending_otp_email(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::OTP_EMAIL)?;
        Ok(())
    }

    // ==========================================
    // Session cookies
    // ==========================================

    /// Persist the HTTP client's exported cookies. The format belongs to
    /// the transport; this cache stores it verbatim.
    pub fn set_saved_cookies(&self, cookies: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::SAVED_COOKIES, cookies)
    }

    pub fn saved_cookies(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::SAVED_COOKIES)
    }

    /// Drop the persisted cookies.
    pub fn clear_saved_cookies(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::SAVED_COOKIES)?;
        Ok(())
    }

    /// Clear everything this cache owns.
    ///
    /// Every key is attempted; the first failure is returned.
    pub fn clear_all(&self) -> StorageResult<()> {
        let mut first_error = None;
        for key in [
            StorageKeys::AUTH_STORAGE,
            StorageKeys::OTP_EMAIL,
            StorageKeys::SAVED_COOKIES,
        ] {
            if let Err(e) = self.storage.delete(key) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
