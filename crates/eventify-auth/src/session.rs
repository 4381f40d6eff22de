//! The auth session service.
//!
//! One instance per process, shared via `Arc` by the API client, route
//! guards and commands.

use crate::client::ApiClient;
use crate::endpoints;
use crate::error::{ApiError, ApiResult, RefreshError};
use crate::identity::Identity;
use crate::navigation::Navigator;
use crate::refresh::RefreshCoordinator;
use crate::request::ApiRequest;
use crate::store::{AuthStateCallback, AuthStore, LoadingFlag, SessionSnapshot};
use crate::transport::Transport;
use eventify_storage::SessionCache;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct OtpVerification<'a> {
    email: &'a str,
    otp: &'a str,
}

pub struct SessionService {
    transport: Arc<dyn Transport>,
    store: Arc<AuthStore>,
    refresher: Arc<RefreshCoordinator>,
    client: ApiClient,
}

impl SessionService {
    /// Wire up store, refresh coordinator and client over one transport.
    pub fn new(transport: Arc<dyn Transport>, cache: Option<SessionCache>) -> Self {
        let store = Arc::new(AuthStore::new(cache));
        let refresher = Arc::new(RefreshCoordinator::new(
            Arc::clone(&transport),
            Arc::clone(&store),
        ));
        let client = ApiClient::new(
            Arc::clone(&transport),
            Arc::clone(&refresher),
            Arc::clone(&store),
        );
        Self {
            transport,
            store,
            refresher,
            client,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &Arc<AuthStore> {
        &self.store
    }

    pub fn refresher(&self) -> &Arc<RefreshCoordinator> {
        &self.refresher
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.store.user()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.store.subscribe()
    }

    pub fn persisted_hint(&self) -> Option<Identity> {
        self.store.persisted_hint()
    }

    pub fn set_state_callback(&self, callback: AuthStateCallback) {
        self.store.set_state_callback(callback);
    }

    /// Ask the backend who the session belongs to.
    ///
    /// Any failure, expired session included, leaves the store empty and
    /// returns `None`.
    pub async fn fetch_identity(&self) -> Option<Identity> {
        let _loading = LoadingFlag::raise(&self.store);
        match self
            .client
            .send_data::<Identity>(ApiRequest::get(endpoints::IDENTITY))
            .await
        {
            Ok(identity) => {
                debug!(user_id = %identity.id, role = %identity.role, "Identity fetched");
                self.store.finish_loading(Some(identity.clone()));
                Some(identity)
            }
            Err(e) => {
                debug!(error = %e, "No active session");
                self.store.finish_loading(None);
                None
            }
        }
    }

    pub async fn refresh(&self) -> Result<Identity, RefreshError> {
        self.refresher.refresh().await
    }

    /// Log out. The server call is best effort; the local session is
    /// always cleared.
    pub async fn clear(&self) {
        end_session(self.transport.as_ref(), &self.store).await;
        info!("Logged out");
    }

    /// Overwrite the current identity, e.g. after editing the profile.
    pub fn set_identity(&self, identity: Identity) {
        self.store.set_user(Some(identity));
    }

    /// Send the user to their role's dashboard. No-op without a user.
    pub fn redirect_by_role(&self, navigator: &dyn Navigator) -> Option<&'static str> {
        let user = self.store.user()?;
        let path = user.role.dashboard_path();
        navigator.push(path);
        Some(path)
    }

    /// Sign-in step 1: check the password and have an OTP emailed.
    ///
    /// Does not establish a session; the email is remembered for
    /// [`verify_otp`](Self::verify_otp).
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<()> {
        let request = ApiRequest::post(endpoints::SIGN_IN)
            .json(&Credentials { email, password })?
            .without_refresh();
        self.client.send(request).await?;

        if let Some(cache) = self.store.cache() {
            cache.set_pending_otp_email(email)?;
        }
        info!(email = %email, "OTP sent");
        Ok(())
    }

    /// Email waiting for OTP verification, if a sign-in was started.
    pub fn pending_otp_email(&self) -> ApiResult<Option<String>> {
        match self.store.cache() {
            Some(cache) => Ok(cache.pending_otp_email()?),
            None => Ok(None),
        }
    }

    /// Sign-in step 2 for the email remembered by [`sign_in`](Self::sign_in).
    pub async fn verify_otp(&self, otp: &str) -> ApiResult<Identity> {
        let email = self
            .pending_otp_email()?
            .ok_or(ApiError::MissingPendingOtp)?;
        self.verify_otp_for(&email, otp).await
    }

    /// Sign-in step 2: exchange the OTP for a session and load the identity.
    pub async fn verify_otp_for(&self, email: &str, otp: &str) -> ApiResult<Identity> {
        let request = ApiRequest::post(endpoints::VERIFY_OTP)
            .json(&OtpVerification { email, otp })?
            .without_refresh();
        self.client.send(request).await?;

        let identity = self.fetch_identity().await.ok_or(ApiError::NotLoggedIn)?;
        if let Some(cache) = self.store.cache() {
            cache.clear_pending_otp_email()?;
        }
        info!(user_id = %identity.id, role = %identity.role, "Login successful");
        Ok(identity)
    }
}

/// Best-effort server logout followed by an unconditional local clear.
pub(crate) async fn end_session(transport: &dyn Transport, store: &AuthStore) {
    match transport.send(&ApiRequest::post(endpoints::LOGOUT)).await {
        Ok(response) if response.is_success() => {}
        Ok(response) => {
            warn!(status = %response.status, "Server logout rejected, clearing local session");
        }
        Err(e) => {
            warn!(error = %e, "Server logout failed, clearing local session");
        }
    }
    store.clear_local();
}
