//! Intercepting API client.
//!
//! Every authenticated call goes through [`ApiClient::send`]. A 401 on the
//! first attempt triggers one shared session refresh and one replay of the
//! identical request; a 401 on the replay ends the session.

use crate::error::{ApiError, ApiResult};
use crate::fsm::{RequestMachine, RequestMachineInput};
use crate::refresh::RefreshCoordinator;
use crate::request::{ApiRequest, ApiResponse, PendingRequest};
use crate::store::AuthStore;
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    refresher: Arc<RefreshCoordinator>,
    store: Arc<AuthStore>,
}

/// Tracks one request through the replay protocol.
struct Lifecycle<'a> {
    path: &'a str,
    machine: RequestMachine,
}

impl<'a> Lifecycle<'a> {
    fn new(path: &'a str) -> Self {
        Self {
            path,
            machine: RequestMachine::new(),
        }
    }

    fn advance(&mut self, input: RequestMachineInput) -> ApiResult<()> {
        let from = self.machine.state().clone();
        self.machine.consume(&input).map_err(|_| {
            ApiError::InvalidStateTransition(format!(
                "Cannot apply {:?} to request {} in state {:?}",
                input, self.path, from
            ))
        })?;
        debug!(
            path = %self.path,
            old_state = ?from,
            new_state = ?self.machine.state(),
            "Request state transition"
        );
        Ok(())
    }
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        refresher: Arc<RefreshCoordinator>,
        store: Arc<AuthStore>,
    ) -> Self {
        Self {
            transport,
            refresher,
            store,
        }
    }

    /// Send a request, refreshing the session once if it has expired.
    ///
    /// Non-success statuses other than a recoverable 401 come back as
    /// [`ApiError::Status`].
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let path = request.path.clone();
        let mut lifecycle = Lifecycle::new(&path);
        let mut pending = PendingRequest::new(request);

        lifecycle.advance(RequestMachineInput::Dispatch)?;
        loop {
            let response = self.transport.send(&pending.request).await?;

            if !response.is_unauthorized() || !pending.request.refreshes_on_unauthorized() {
                lifecycle.advance(RequestMachineInput::Completed)?;
                return response.into_result();
            }

            lifecycle.advance(RequestMachineInput::Unauthorized)?;
            if pending.is_retry() {
                warn!(path = %path, "Request rejected after session refresh, clearing session");
                self.store.clear_local();
                return Err(ApiError::Unauthorized);
            }

            lifecycle.advance(RequestMachineInput::BeginRefresh)?;
            if let Err(e) = self.refresher.refresh().await {
                lifecycle.advance(RequestMachineInput::RefreshFailed)?;
                return Err(ApiError::RefreshFailed(e));
            }
            lifecycle.advance(RequestMachineInput::RefreshSucceeded)?;
            pending = pending.retried();
        }
    }

    /// Send and decode the `data` field of the response envelope.
    pub async fn send_data<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        self.send(request).await?.data()
    }

    pub fn refresher(&self) -> &Arc<RefreshCoordinator> {
        &self.refresher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints;
    use crate::identity::Role;
    use crate::test_support::{identity, identity_body, ScriptedTransport};
    use futures_util::future::join_all;
    use reqwest::Method;
    use serde_json::json;
    use std::time::Duration;

    const EVENTS: &str = "/api/event/all/me";

    fn client(transport: &Arc<ScriptedTransport>) -> (ApiClient, Arc<AuthStore>) {
        let store = Arc::new(AuthStore::new(None));
        let refresher = Arc::new(RefreshCoordinator::new(
            transport.clone(),
            Arc::clone(&store),
        ));
        (
            ApiClient::new(transport.clone(), refresher, Arc::clone(&store)),
            store,
        )
    }

    fn script_refresh_ok(transport: &ScriptedTransport) {
        transport.respond(Method::GET, endpoints::REFRESH, 200, "{}");
        transport.respond(
            Method::GET,
            endpoints::IDENTITY,
            200,
            identity_body("u1", Role::Organizer),
        );
    }

    #[tokio::test]
    async fn test_success_passes_through_without_refresh() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::GET, EVENTS, 200, r#"{"data":[]}"#);
        let (client, _store) = client(&transport);

        let events: Vec<serde_json::Value> = client.send_data(ApiRequest::get(EVENTS)).await.unwrap();
        assert!(events.is_empty());
        assert_eq!(transport.calls_to(Method::GET, endpoints::REFRESH), 0);
    }

    #[tokio::test]
    async fn test_single_401_is_recovered_by_refresh_and_replay() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::GET, EVENTS, 401, "{}");
        transport.respond(Method::GET, EVENTS, 200, r#"{"data":["e1"]}"#);
        script_refresh_ok(&transport);
        let (client, store) = client(&transport);

        let events: Vec<String> = client.send_data(ApiRequest::get(EVENTS)).await.unwrap();
        assert_eq!(events, vec!["e1".to_string()]);
        assert_eq!(transport.calls_to(Method::GET, endpoints::REFRESH), 1);
        assert_eq!(transport.calls_to(Method::GET, EVENTS), 2);
        assert_eq!(store.user().unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_replay_is_identical_to_original() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::PUT, "/api/event/e1", 401, "{}");
        transport.respond(Method::PUT, "/api/event/e1", 200, r#"{"data":null}"#);
        script_refresh_ok(&transport);
        let (client, _store) = client(&transport);

        let request = ApiRequest::put("/api/event/e1")
            .query("notify", "true")
            .header("x-request-id", "abc")
            .json(&json!({"title": "Launch"}))
            .unwrap();
        client.send(request.clone()).await.unwrap();

        let sent: Vec<ApiRequest> = transport
            .calls()
            .into_iter()
            .filter(|r| r.path == "/api/event/e1")
            .collect();
        assert_eq!(sent, vec![request.clone(), request]);
    }

    #[tokio::test]
    async fn test_second_401_is_terminal_without_another_refresh() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::GET, EVENTS, 401, "{}");
        script_refresh_ok(&transport);
        let (client, store) = client(&transport);

        let err = client.send(ApiRequest::get(EVENTS)).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(transport.calls_to(Method::GET, endpoints::REFRESH), 1);
        assert_eq!(transport.calls_to(Method::GET, EVENTS), 2);
        assert!(store.user().is_none());
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces_and_clears_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::GET, EVENTS, 401, "{}");
        transport.respond(Method::GET, endpoints::REFRESH, 403, r#"{"error":"revoked"}"#);
        let (client, store) = client(&transport);
        store.set_user(Some(identity("u1", Role::Organizer)));

        let err = client.send(ApiRequest::get(EVENTS)).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::RefreshFailed(crate::error::RefreshError::Rejected { status: 403 })
        ));
        assert!(store.user().is_none());
        // Not replayed
        assert_eq!(transport.calls_to(Method::GET, EVENTS), 1);
    }

    #[tokio::test]
    async fn test_other_statuses_do_not_trigger_refresh() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::GET, EVENTS, 403, r#"{"error":"Organizers only"}"#);
        let (client, _store) = client(&transport);

        match client.send(ApiRequest::get(EVENTS)).await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Organizers only");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(transport.calls_to(Method::GET, endpoints::REFRESH), 0);
    }

    #[tokio::test]
    async fn test_without_refresh_returns_401_as_status() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::POST,
            endpoints::SIGN_IN,
            401,
            r#"{"error":"Invalid credentials"}"#,
        );
        let (client, _store) = client(&transport);

        let err = client
            .send(ApiRequest::post(endpoints::SIGN_IN).without_refresh())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 401, .. }));
        assert_eq!(transport.calls_to(Method::GET, endpoints::REFRESH), 0);
    }

    #[tokio::test]
    async fn test_transport_error_is_returned_unchanged() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail(Method::GET, EVENTS);
        let (client, _store) = client(&transport);

        let err = client.send(ApiRequest::get(EVENTS)).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..5 {
            transport.respond(Method::GET, EVENTS, 401, "{}");
        }
        transport.respond(Method::GET, EVENTS, 200, r#"{"data":[]}"#);
        transport.respond_after(
            Method::GET,
            endpoints::REFRESH,
            200,
            "{}",
            Duration::from_millis(30),
        );
        transport.respond(
            Method::GET,
            endpoints::IDENTITY,
            200,
            identity_body("u1", Role::Organizer),
        );
        let (client, store) = client(&transport);

        let results = join_all((0..5).map(|_| client.send(ApiRequest::get(EVENTS)))).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(transport.calls_to(Method::GET, endpoints::REFRESH), 1);
        assert_eq!(transport.calls_to(Method::GET, EVENTS), 10);
        assert_eq!(client.refresher().stats().joined, 4);
        assert!(!store.is_refreshing());
    }
}
