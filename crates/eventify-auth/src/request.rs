//! Request and response values passed through the transport.

use crate::error::{ApiError, ApiResult};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Body of an outgoing request.
///
/// Kept as plain data rather than a `reqwest` body so the exact same request
/// can be sent again after a session refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

/// A single multipart field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                mime: mime.into(),
                bytes,
            },
        }
    }
}

/// An API call relative to the backend base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    refresh_on_unauthorized: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            refresh_on_unauthorized: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Attach a multipart form body.
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }

    /// Treat a 401 as a final answer instead of an expired session.
    ///
    /// Used by the credential endpoints (sign-in, OTP, sign-up, password
    /// reset), where a 401 means the credentials were wrong.
    pub fn without_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }

    pub fn refreshes_on_unauthorized(&self) -> bool {
        self.refresh_on_unauthorized
    }
}

/// Which send of a request this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retry,
}

/// A request together with its retry marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub request: ApiRequest,
    pub attempt: Attempt,
}

impl PendingRequest {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            attempt: Attempt::First,
        }
    }

    /// The same request, marked as the one allowed replay.
    pub fn retried(self) -> Self {
        Self {
            request: self.request,
            attempt: Attempt::Retry,
        }
    }

    pub fn is_retry(&self) -> bool {
        self.attempt == Attempt::Retry
    }
}

/// Standard success envelope of the backend.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Error body of the backend. Either field may be used.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// A response as received from the backend.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Decode the whole body.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Decode the `data` field of the success envelope.
    pub fn data<T: DeserializeOwned>(&self) -> ApiResult<T> {
        let envelope: Envelope<T> = serde_json::from_str(&self.body)?;
        Ok(envelope.data)
    }

    /// Human-readable failure message.
    ///
    /// Prefers the backend's `error` field, then `message`, then the
    /// canonical reason phrase of the status.
    pub fn error_message(&self) -> String {
        if let Ok(body) = serde_json::from_str::<ErrorBody>(&self.body) {
            if let Some(message) = body.error.or(body.message) {
                if !message.trim().is_empty() {
                    return message;
                }
            }
        }
        self.status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    }

    /// Turn a non-success status into [`ApiError::Status`].
    pub fn into_result(self) -> ApiResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Status {
                status: self.status.as_u16(),
                message: self.error_message(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_retried_keeps_request_identical() {
        let request = ApiRequest::put("/api/user/profile/u1")
            .query("page", "2")
            .header("x-trace", "abc")
            .json(&json!({"fullName": "Ada"}))
            .unwrap();
        let pending = PendingRequest::new(request.clone());
        assert!(!pending.is_retry());

        let replay = pending.retried();
        assert!(replay.is_retry());
        assert_eq!(replay.request, request);
    }

    #[test]
    fn test_without_refresh_flag() {
        let request = ApiRequest::post("/api/auth/signin");
        assert!(request.refreshes_on_unauthorized());
        assert!(!request.without_refresh().refreshes_on_unauthorized());
    }

    #[test]
    fn test_data_unwraps_envelope() {
        let response = ApiResponse::new(StatusCode::OK, r#"{"data":{"id":"u1"},"success":true}"#);
        let value: serde_json::Value = response.data().unwrap();
        assert_eq!(value, json!({"id": "u1"}));
    }

    #[test]
    fn test_error_message_prefers_error_field() {
        let response = ApiResponse::new(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Invalid OTP","message":"Bad Request"}"#,
        );
        assert_eq!(response.error_message(), "Invalid OTP");
    }

    #[test]
    fn test_error_message_falls_back_to_message_then_reason() {
        let response = ApiResponse::new(StatusCode::FORBIDDEN, r#"{"message":"Admins only"}"#);
        assert_eq!(response.error_message(), "Admins only");

        let response = ApiResponse::new(StatusCode::NOT_FOUND, "<html>not found</html>");
        assert_eq!(response.error_message(), "Not Found");
    }

    #[test]
    fn test_into_result_maps_status() {
        let response = ApiResponse::new(StatusCode::CONFLICT, r#"{"error":"Email taken"}"#);
        match response.into_result() {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 409);
                assert_eq!(message, "Email taken");
            }
            other => panic!("unexpected: {other:?}"),
        }

        assert!(ApiResponse::new(StatusCode::CREATED, "{}").into_result().is_ok());
    }
}
