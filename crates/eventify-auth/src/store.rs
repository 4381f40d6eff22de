//! In-memory auth session state shared by every component.

use crate::identity::{Identity, Role};
use eventify_storage::SessionCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<Identity>,
    pub is_loading: bool,
    pub refresh_in_progress: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Payload for auth state change events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStateChangedPayload {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Callback type for auth state change notifications.
pub type AuthStateCallback = Box<dyn Fn(AuthStateChangedPayload) + Send + Sync>;

/// Holds the current user plus the loading and refresh flags.
///
/// Every write goes through a `watch` channel, so subscribers always see the
/// latest value. Writes to `user` are last-writer-wins.
pub struct AuthStore {
    state: watch::Sender<SessionSnapshot>,
    cache: Option<SessionCache>,
    state_callback: Mutex<Option<AuthStateCallback>>,
}

impl AuthStore {
    /// Create an empty store.
    ///
    /// A persisted identity from an earlier run is never loaded into `user`;
    /// only a server round trip does that.
    pub fn new(cache: Option<SessionCache>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            state,
            cache,
            state_callback: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<Identity> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.borrow().refresh_in_progress
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn cache(&self) -> Option<&SessionCache> {
        self.cache.as_ref()
    }

    /// Identity persisted by an earlier run. Advisory only.
    pub fn persisted_hint(&self) -> Option<Identity> {
        let cache = self.cache.as_ref()?;
        match cache.identity_hint::<Identity>() {
            Ok(hint) => hint.map(|h| h.value),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted identity");
                None
            }
        }
    }

    /// Set a callback to be notified whenever the user changes.
    pub fn set_state_callback(&self, callback: AuthStateCallback) {
        *self.state_callback.lock() = Some(callback);
    }

    /// Overwrite the current user.
    pub fn set_user(&self, user: Option<Identity>) {
        self.write_user(user, None);
    }

    /// Overwrite the current user only if it still equals `expected`.
    ///
    /// Returns false, leaving the store untouched, when another writer got
    /// there first.
    pub fn replace_user_if(&self, expected: &Option<Identity>, user: Option<Identity>) -> bool {
        self.replace_user_when(|current| current == expected.as_ref(), user)
    }

    /// Overwrite the user if it is still the account with `user_id`,
    /// whatever its other fields hold by now.
    pub fn replace_same_user(&self, user_id: &str, user: Identity) -> bool {
        self.replace_user_when(|current| current.is_some_and(|u| u.id == user_id), Some(user))
    }

    fn replace_user_when<F>(&self, accept: F, user: Option<Identity>) -> bool
    where
        F: FnOnce(Option<&Identity>) -> bool,
    {
        let mut swapped = false;
        self.state.send_if_modified(|snapshot| {
            if !accept(snapshot.user.as_ref()) {
                return false;
            }
            swapped = true;
            let changed = snapshot.user != user;
            snapshot.user = user.clone();
            changed
        });
        if swapped {
            self.after_user_write(&user);
        }
        swapped
    }

    /// Drop the user and the persisted hint.
    pub fn clear_local(&self) {
        self.set_user(None);
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|snapshot| {
            let changed = snapshot.is_loading != loading;
            snapshot.is_loading = loading;
            changed
        });
    }

    /// Store the outcome of an identity fetch and clear the loading flag in
    /// one write.
    pub(crate) fn finish_loading(&self, user: Option<Identity>) {
        self.write_user(user, Some(false));
    }

    pub(crate) fn set_refresh_in_progress(&self, in_progress: bool) {
        self.state.send_if_modified(|snapshot| {
            let changed = snapshot.refresh_in_progress != in_progress;
            snapshot.refresh_in_progress = in_progress;
            changed
        });
    }

    fn write_user(&self, user: Option<Identity>, loading: Option<bool>) {
        self.state.send_if_modified(|snapshot| {
            let mut changed = snapshot.user != user;
            snapshot.user = user.clone();
            if let Some(loading) = loading {
                changed |= snapshot.is_loading != loading;
                snapshot.is_loading = loading;
            }
            changed
        });
        self.after_user_write(&user);
    }

    fn after_user_write(&self, user: &Option<Identity>) {
        self.persist(user);
        self.notify_state_change(user);
    }

    fn persist(&self, user: &Option<Identity>) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let result = match user {
            Some(identity) => cache.set_identity_hint(identity),
            None => cache.clear_identity_hint(),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist identity hint");
        }
    }

    fn notify_state_change(&self, user: &Option<Identity>) {
        debug!(
            authenticated = user.is_some(),
            user_id = user.as_ref().map(|u| u.id.as_str()).unwrap_or(""),
            "Session user updated"
        );
        let cb = self.state_callback.lock();
        if let Some(callback) = cb.as_ref() {
            callback(AuthStateChangedPayload {
                authenticated: user.is_some(),
                user_id: user.as_ref().map(|u| u.id.clone()),
                role: user.as_ref().map(|u| u.role),
            });
        }
    }
}

/// Raises `is_loading` for as long as it lives.
pub(crate) struct LoadingFlag<'a> {
    store: &'a AuthStore,
}

impl<'a> LoadingFlag<'a> {
    pub(crate) fn raise(store: &'a AuthStore) -> Self {
        store.set_loading(true);
        Self { store }
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}

/// Raises `refresh_in_progress` for as long as it lives.
pub(crate) struct RefreshFlag<'a> {
    store: &'a AuthStore,
}

impl<'a> RefreshFlag<'a> {
    pub(crate) fn raise(store: &'a AuthStore) -> Self {
        store.set_refresh_in_progress(true);
        Self { store }
    }
}

impl Drop for RefreshFlag<'_> {
    fn drop(&mut self) {
        self.store.set_refresh_in_progress(false);
    }
}
