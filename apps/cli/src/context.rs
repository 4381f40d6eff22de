//! Wiring shared by every command: config, logging paths, transport and the
//! session service.

use anyhow::{Context, Result};
use eventify_auth::{ReqwestTransport, SessionService};
use eventify_config_and_utils::{Config, Paths};
use eventify_storage::create_session_cache;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AppContext {
    pub config: Config,
    pub transport: Arc<ReqwestTransport>,
    pub session: Arc<SessionService>,
}

impl AppContext {
    pub fn load(paths: &Paths, api_url: Option<String>) -> Result<Self> {
        paths.ensure_dirs()?;
        let mut config = Config::load(paths)?;
        if let Some(url) = api_url {
            config.api_base_url = url;
        }

        let transport = Arc::new(
            ReqwestTransport::from_config(&config).context("Failed to create HTTP client")?,
        );
        let cache = create_session_cache(&paths.session_file())
            .context("Failed to open session file")?;
        if let Some(saved) = cache.saved_cookies()? {
            transport.restore_cookies(&saved);
        }

        let session = Arc::new(SessionService::new(transport.clone(), Some(cache)));
        debug!(api = %config.api_base_url, "CLI context ready");

        Ok(Self {
            config,
            transport,
            session,
        })
    }

    /// Save the cookie jar so the next run continues the same session.
    pub fn save_cookies(&self) {
        let Some(cache) = self.session.store().cache() else {
            return;
        };
        let result = match self.transport.export_cookies() {
            Some(cookies) => cache.set_saved_cookies(&cookies),
            None => cache.clear_saved_cookies(),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to save session cookies");
        }
    }

    /// Forget everything persisted for this session: cookies, the identity
    /// hint and any sign-in waiting for its OTP.
    pub fn forget_session(&self) {
        if let Some(cache) = self.session.store().cache() {
            if let Err(e) = cache.clear_all() {
                warn!(error = %e, "Failed to clear persisted session");
            }
        }
    }
}
