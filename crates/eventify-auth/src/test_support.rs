//! Scripted in-memory transport for unit tests.

use crate::error::{ApiError, ApiResult};
use crate::identity::{Identity, Role};
use crate::request::{ApiRequest, ApiResponse};
use crate::transport::Transport;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

#[derive(Clone)]
enum Scripted {
    Respond {
        status: u16,
        body: String,
        delay: Option<Duration>,
    },
    Fail,
}

type Observer = Box<dyn Fn(&ApiRequest) + Send + Sync>;

/// Answers requests from per-route queues.
///
/// Each route pops its queue in order; the last entry repeats forever.
/// Unscripted routes answer 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    calls: Mutex<Vec<ApiRequest>>,
    observer: Mutex<Option<Observer>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        self.push(
            method,
            path,
            Scripted::Respond {
                status,
                body: body.into(),
                delay: None,
            },
        );
    }

    pub(crate) fn respond_after(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: impl Into<String>,
        delay: Duration,
    ) {
        self.push(
            method,
            path,
            Scripted::Respond {
                status,
                body: body.into(),
                delay: Some(delay),
            },
        );
    }

    pub(crate) fn fail(&self, method: Method, path: &str) {
        self.push(method, path, Scripted::Fail);
    }

    pub(crate) fn observe(&self, observer: impl Fn(&ApiRequest) + Send + Sync + 'static) {
        *self.observer.lock() = Some(Box::new(observer));
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }

    pub(crate) fn calls_to(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(scripted);
    }

    fn next(&self, request: &ApiRequest) -> Option<Scripted> {
        let mut routes = self.routes.lock();
        let queue = routes.get_mut(&(request.method.clone(), request.path.clone()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        self.calls.lock().push(request.clone());
        if let Some(observer) = self.observer.lock().as_ref() {
            observer(request);
        }

        match self.next(request) {
            Some(Scripted::Respond {
                status,
                body,
                delay,
            }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                let status = StatusCode::from_u16(status).unwrap();
                Ok(ApiResponse::new(status, body))
            }
            Some(Scripted::Fail) => Err(ApiError::NetworkUnavailable(format!(
                "scripted failure for {}",
                request.path
            ))),
            None => Ok(ApiResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}

pub(crate) fn identity(id: &str, role: Role) -> Identity {
    Identity {
        id: id.to_string(),
        full_name: format!("User {id}"),
        email: format!("{id}@example.com"),
        phone: "+15550100".to_string(),
        avatar_url: None,
        role,
        created_at: None,
    }
}

pub(crate) fn identity_body(id: &str, role: Role) -> String {
    serde_json::json!({ "data": identity(id, role) }).to_string()
}
