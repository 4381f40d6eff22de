//! Single-flight session refresh.
//!
//! Any number of callers may ask for a refresh at once; only the first one
//! starts a network refresh and everyone else attaches to its shared handle.
//! The refresh runs on its own task so a caller going away never leaves the
//! refresh half done or the in-progress flag raised.

use crate::endpoints;
use crate::error::RefreshError;
use crate::identity::Identity;
use crate::request::ApiRequest;
use crate::session::end_session;
use crate::store::{AuthStore, RefreshFlag};
use crate::transport::Transport;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

type RefreshOutcome = Result<Identity, RefreshError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// In-flight refresh, tagged so a finished refresh only clears its own slot.
struct InFlight {
    generation: u64,
    handle: SharedRefresh,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Refreshes that actually went to the network.
    pub network_refreshes: u64,
    /// Callers that attached to a refresh someone else started.
    pub joined: u64,
}

#[derive(Default)]
struct Counters {
    network_refreshes: AtomicU64,
    joined: AtomicU64,
}

pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: Arc<AuthStore>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    generation: AtomicU64,
    counters: Arc<Counters>,
}

impl RefreshCoordinator {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<AuthStore>) -> Self {
        Self {
            transport,
            store,
            in_flight: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.store.is_refreshing()
    }

    pub fn stats(&self) -> RefreshStats {
        RefreshStats {
            network_refreshes: self.counters.network_refreshes.load(Ordering::SeqCst),
            joined: self.counters.joined.load(Ordering::SeqCst),
        }
    }

    /// Renew the session and re-fetch the identity.
    ///
    /// On failure the session has already been cleared when this returns.
    pub async fn refresh(&self) -> RefreshOutcome {
        let handle = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(in_flight) => {
                    self.counters.joined.fetch_add(1, Ordering::SeqCst);
                    debug!(
                        generation = in_flight.generation,
                        "Joining in-flight session refresh"
                    );
                    in_flight.handle.clone()
                }
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    let handle = self.start(generation);
                    *slot = Some(InFlight {
                        generation,
                        handle: handle.clone(),
                    });
                    handle
                }
            }
        };
        handle.await
    }

    // Called with the slot locked; the task clears the slot under the same
    // lock, so it cannot run ahead of the install.
    fn start(&self, generation: u64) -> SharedRefresh {
        let task = tokio::spawn(run_refresh(
            Arc::clone(&self.transport),
            Arc::clone(&self.store),
            Arc::clone(&self.in_flight),
            Arc::clone(&self.counters),
            generation,
        ));

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(RefreshError::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared()
    }
}

async fn run_refresh(
    transport: Arc<dyn Transport>,
    store: Arc<AuthStore>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    counters: Arc<Counters>,
    generation: u64,
) -> RefreshOutcome {
    let outcome = {
        let _flag = RefreshFlag::raise(&store);
        counters.network_refreshes.fetch_add(1, Ordering::SeqCst);
        debug!(generation, "Refreshing session");

        match renew(transport.as_ref()).await {
            Ok(identity) => {
                info!(user_id = %identity.id, role = %identity.role, "Session refreshed");
                store.set_user(Some(identity.clone()));
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed, clearing session");
                end_session(transport.as_ref(), &store).await;
                Err(e)
            }
        }
    };

    let mut slot = in_flight.lock();
    if slot.as_ref().is_some_and(|f| f.generation == generation) {
        *slot = None;
    }
    outcome
}

/// Renew the session cookie, then fetch who it belongs to.
///
/// Both calls go straight to the transport: a 401 here means the refresh
/// itself failed and must not trigger another refresh.
async fn renew(transport: &dyn Transport) -> RefreshOutcome {
    let response = transport
        .send(&ApiRequest::get(endpoints::REFRESH))
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;
    if !response.is_success() {
        return Err(RefreshError::Rejected {
            status: response.status.as_u16(),
        });
    }

    let response = transport
        .send(&ApiRequest::get(endpoints::IDENTITY))
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;
    if !response.is_success() {
        return Err(RefreshError::IdentityUnavailable {
            status: response.status.as_u16(),
        });
    }

    response
        .data::<Identity>()
        .map_err(|e| RefreshError::InvalidIdentity(e.to_string()))
}
