//! Optimistic profile edits.
//!
//! The edit is shown locally before the server confirms it. The server's
//! answer then replaces whatever the store holds for that account, including
//! an identity written by a session refresh mid-call. A failed call puts the
//! previous identity back only if the tentative value is still in place.
//! Neither step touches the store once a different account (or nobody) is
//! signed in.

use crate::endpoints;
use crate::error::{ApiError, ApiResult};
use crate::identity::Identity;
use crate::request::{ApiRequest, FormPart};
use crate::session::SessionService;
use crate::store::AuthStore;
use tracing::{debug, info, warn};

/// New avatar image.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Fields to change. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<AvatarUpload>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone.is_none() && self.avatar.is_none()
    }

    /// What the identity should look like once the server agrees.
    ///
    /// The avatar URL is only known after upload, so it is left unchanged.
    pub fn apply_to(&self, identity: &Identity) -> Identity {
        let mut updated = identity.clone();
        if let Some(name) = &self.full_name {
            updated.full_name = name.clone();
        }
        if let Some(phone) = &self.phone {
            updated.phone = phone.clone();
        }
        updated
    }

    fn form_parts(&self) -> Vec<FormPart> {
        let mut parts = Vec::new();
        if let Some(name) = &self.full_name {
            parts.push(FormPart::text("fullName", name));
        }
        if let Some(phone) = &self.phone {
            parts.push(FormPart::text("phone", phone));
        }
        if let Some(avatar) = &self.avatar {
            parts.push(FormPart::file(
                "avatarUrl",
                avatar.file_name.clone(),
                avatar.mime.clone(),
                avatar.bytes.clone(),
            ));
        }
        parts
    }
}

/// A tentative identity written to the store, waiting for the server.
#[must_use = "a tentative update must be committed or rolled back"]
pub struct ProfileUpdate<'a> {
    store: &'a AuthStore,
    previous: Identity,
    tentative: Identity,
}

impl<'a> ProfileUpdate<'a> {
    /// Show `changes` locally right away. `None` when nobody is signed in.
    pub fn begin(store: &'a AuthStore, changes: &ProfileChanges) -> Option<Self> {
        let previous = store.user()?;
        let tentative = changes.apply_to(&previous);
        store.replace_user_if(&Some(previous.clone()), Some(tentative.clone()));
        Some(Self {
            store,
            previous,
            tentative,
        })
    }

    pub fn tentative(&self) -> &Identity {
        &self.tentative
    }

    /// Replace the tentative value with what the server stored.
    pub fn commit(self, confirmed: Identity) -> bool {
        let applied = self.store.replace_same_user(&self.previous.id, confirmed);
        if !applied {
            debug!(user_id = %self.previous.id, "Account changed during profile update, keeping newer value");
        }
        applied
    }

    /// Put the previous identity back.
    pub fn rollback(self) -> bool {
        self.store
            .replace_user_if(&Some(self.tentative), Some(self.previous))
    }
}

impl SessionService {
    /// Update the signed-in user's profile, optimistically.
    pub async fn update_profile(&self, changes: &ProfileChanges) -> ApiResult<Identity> {
        if changes.is_empty() {
            return Err(ApiError::InvalidInput("no profile changes given".to_string()));
        }
        let user_id = self.current_user().ok_or(ApiError::NotLoggedIn)?.id;

        let update = ProfileUpdate::begin(self.store(), changes).ok_or(ApiError::NotLoggedIn)?;
        let request = ApiRequest::put(endpoints::profile(&user_id)).multipart(changes.form_parts());

        match self.client().send_data::<Identity>(request).await {
            Ok(confirmed) => {
                info!(user_id = %confirmed.id, "Profile updated");
                update.commit(confirmed.clone());
                Ok(confirmed)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Profile update failed, rolling back");
                update.rollback();
                Err(e)
            }
        }
    }
}
