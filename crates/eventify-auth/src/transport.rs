//! HTTP transport.
//!
//! The backend keeps the session in HTTP-only cookies, so the transport owns
//! a cookie jar and sends it with every request, replays included.

use crate::endpoints;
use crate::error::{ApiError, ApiResult};
use crate::request::{ApiRequest, ApiResponse, FormValue, RequestBody};
use async_trait::async_trait;
use eventify_config_and_utils::Config;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Sends one request and returns the raw response.
///
/// Non-success statuses are responses, not errors; only failures to get a
/// response at all are reported as `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse>;
}

/// [`Transport`] over `reqwest` with a shared cookie jar.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    pub fn new(base_url: Url, timeout: Duration) -> ApiResult<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            jar,
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(config.api_base_url()?, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Load cookies written by [`export_cookies`](Self::export_cookies).
    ///
    /// A bare `name=value; name2=value2` header is accepted too and scoped
    /// to the base URL.
    pub fn restore_cookies(&self, saved: &str) {
        let cookies: Vec<SavedCookie> = match serde_json::from_str(saved) {
            Ok(cookies) => cookies,
            Err(_) => cookie_pairs(saved)
                .map(|pair| SavedCookie {
                    path: "/".to_string(),
                    pair: pair.to_string(),
                })
                .collect(),
        };

        let mut restored = 0;
        for cookie in &cookies {
            let Ok(url) = self.base_url.join(&cookie.path) else {
                warn!(path = %cookie.path, "Skipping saved cookie with unusable path");
                continue;
            };
            self.jar
                .add_cookie_str(&format!("{}; Path={}", cookie.pair, cookie.path), &url);
            restored += 1;
        }
        debug!(count = restored, "Restored session cookies");
    }

    /// Snapshot of the session cookies, for [`restore_cookies`](Self::restore_cookies)
    /// in a later run.
    ///
    /// The jar does not expose cookie attributes, so each persisted scope
    /// (root first, then the refresh endpoint) is read separately and every
    /// cookie is saved under the first scope that sends it.
    pub fn export_cookies(&self) -> Option<String> {
        let mut saved: Vec<SavedCookie> = Vec::new();
        for scope in PERSISTED_SCOPES {
            let Ok(url) = self.base_url.join(scope) else {
                continue;
            };
            let Some(header) = self.cookies_for(&url) else {
                continue;
            };
            for pair in cookie_pairs(&header) {
                if saved.iter().any(|c| c.pair == pair) {
                    continue;
                }
                saved.push(SavedCookie {
                    path: scope.to_string(),
                    pair: pair.to_string(),
                });
            }
        }
        if saved.is_empty() {
            return None;
        }
        serde_json::to_string(&saved).ok()
    }

    /// Cookies the jar would currently send to the backend root.
    pub fn cookie_header(&self) -> Option<String> {
        self.cookies_for(&self.base_url)
    }

    fn cookies_for(&self, url: &Url) -> Option<String> {
        let value = self.jar.cookies(url)?;
        value.to_str().ok().map(str::to_string)
    }

    fn url_for(&self, request: &ApiRequest) -> ApiResult<Url> {
        let mut url = self.base_url.join(&request.path)?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Paths whose cookies survive between runs. Root first, so a cookie
/// visible everywhere is saved with `Path=/`.
const PERSISTED_SCOPES: [&str; 2] = ["/", endpoints::REFRESH];

#[derive(Debug, Serialize, Deserialize)]
struct SavedCookie {
    path: String,
    pair: String,
}

fn cookie_pairs(header: &str) -> impl Iterator<Item = &str> {
    header.split(';').map(str::trim).filter(|p| !p.is_empty())
}

fn multipart_form(parts: &[crate::request::FormPart]) -> ApiResult<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match &part.value {
            FormValue::Text(text) => form.text(part.name.clone(), text.clone()),
            FormValue::File {
                file_name,
                mime,
                bytes,
            } => {
                let file = Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)?;
                form.part(part.name.clone(), file)
            }
        };
    }
    Ok(form)
}

fn map_send_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_connect() {
        ApiError::NetworkUnavailable(err.to_string())
    } else {
        ApiError::Http(err)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let url = self.url_for(request)?;
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            // Rebuilt per send; a multipart stream cannot be replayed.
            Some(RequestBody::Multipart(parts)) => builder.multipart(multipart_form(parts)?),
            None => builder,
        };

        let response = builder.send().await.map_err(map_send_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_send_error)?;

        if !status.is_success() {
            warn!(status = %status, path = %request.path, body = %body, "Request failed");
        }

        Ok(ApiResponse::new(status, body))
    }
}
