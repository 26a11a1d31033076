//! Wire envelope and the request-executor boundary.
//!
//! Stores and the session manager speak to the backend exclusively
//! through [`RequestExecutor`]; the concrete transport lives in
//! [`HttpExecutor`] and a scripted in-memory fake backs the tests.

mod error;
mod http;

pub use error::ApiError;
pub use http::HttpExecutor;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::PageInfo;

/// HTTP verb subset used by the backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
}

impl Method {
    /// Uppercase wire name of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// Binary upload attached to a multipart request.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Original file name reported to the backend.
    pub filename: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// Optional MIME type hint.
    pub mime: Option<String>,
}

/// One field of a multipart payload.
#[derive(Debug, Clone)]
pub struct MultipartField {
    pub(crate) name: String,
    pub(crate) value: FieldValue,
}

#[derive(Debug, Clone)]
pub(crate) enum FieldValue {
    Text(String),
    File(FileUpload),
}

impl MultipartField {
    /// Plain text form field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Text(value.into()),
        }
    }

    /// Binary file form field.
    pub fn file(name: impl Into<String>, upload: FileUpload) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::File(upload),
        }
    }
}

/// Body variants a request may carry.
#[derive(Debug, Clone)]
pub enum Payload {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// Multipart form, used by registration and photo upload.
    Multipart(Vec<MultipartField>),
}

/// A single call against the backend, expressed independently of the
/// transport that will execute it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP verb.
    pub method: Method,
    /// Path relative to the API base URL.
    pub path: String,
    /// Query string pairs.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub payload: Payload,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            payload: Payload::Empty,
        }
    }

    /// `GET` request for the given path.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// `POST` request for the given path.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// `PUT` request for the given path.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// Append one query pair.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.payload = Payload::Json(body);
        self
    }

    /// Attach a multipart form body.
    pub fn multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.payload = Payload::Multipart(fields);
        self
    }
}

/// Decoded `{success, message?, ...}` response envelope.
///
/// The auth endpoints place `token`, `user` and `profile_photo` at the
/// top level rather than under `data`, so all remaining keys are kept
/// for extraction via [`Envelope::take`].
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Application-level success flag; absence counts as failure.
    #[serde(default)]
    pub success: bool,
    /// Backend-provided human readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Remaining top-level fields of the response body.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Envelope {
    /// Deserialize one top-level field of the envelope.
    pub fn take<T: DeserializeOwned>(&self, key: &str) -> Result<T, ApiError> {
        let value = self.rest.get(key).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|err| ApiError::Shape(format!("field `{key}`: {err}")))
    }

    /// Convert `success != true` into [`ApiError::Rejected`].
    pub fn into_success(self) -> Result<Self, ApiError> {
        if self.success {
            Ok(self)
        } else {
            Err(ApiError::Rejected {
                message: self.message,
            })
        }
    }
}

/// List payload that is either a bare array or a paginator object with
/// the items nested under `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    /// Paginator object.
    Paged(Page<T>),
    /// Plain array.
    Plain(Vec<T>),
}

/// Paginator object as the backend serialises it.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    /// Items of the current page.
    #[serde(rename = "data", default = "Vec::new")]
    pub items: Vec<T>,
    /// Remaining paginator fields.
    #[serde(flatten)]
    pub info: PageInfo,
}

impl<T> ListPayload<T> {
    /// Split into items and the pagination the backend reported, if any.
    pub fn into_parts(self) -> (Vec<T>, Option<PageInfo>) {
        match self {
            Self::Paged(page) => (page.items, Some(page.info)),
            Self::Plain(items) => (items, None),
        }
    }
}

/// Opaque request executor boundary.
///
/// An `Ok` return implies the backend reported `success: true`; every
/// failure class is normalised into [`ApiError`]. Implementations own
/// bearer attachment and the wire format.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Execute one request to settlement.
    async fn execute(&self, request: ApiRequest) -> Result<Envelope, ApiError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Executor fake that replays scripted responses and records every
    /// request it receives.
    pub struct ScriptedExecutor {
        responses: Mutex<Vec<(String, Result<Value, ApiError>)>>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
                seen: Mutex::new(Vec::new()),
            }
        }

        /// Script a JSON body for the next matching call.
        pub fn respond(self, method: Method, path: &str, body: Value) -> Self {
            self.responses
                .lock()
                .push((format!("{} {path}", method.as_str()), Ok(body)));
            self
        }

        /// Script an error for the next matching call.
        pub fn fail_with(self, method: Method, path: &str, error: ApiError) -> Self {
            self.responses
                .lock()
                .push((format!("{} {path}", method.as_str()), Err(error)));
            self
        }

        /// Requests executed so far, in order.
        pub fn requests(&self) -> Vec<ApiRequest> {
            self.seen.lock().clone()
        }
    }

    #[async_trait]
    impl RequestExecutor for ScriptedExecutor {
        async fn execute(&self, request: ApiRequest) -> Result<Envelope, ApiError> {
            let key = format!("{} {}", request.method.as_str(), request.path);
            self.seen.lock().push(request);
            let mut responses = self.responses.lock();
            let position = responses
                .iter()
                .position(|(candidate, _)| candidate == &key)
                .ok_or_else(|| ApiError::Network(format!("no scripted response for {key}")))?;
            let (_, result) = responses.remove(position);
            let body = result?;
            let envelope: Envelope = serde_json::from_value(body)
                .map_err(|err| ApiError::Shape(err.to_string()))?;
            envelope.into_success()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_extracts_top_level_fields() {
        let envelope: Envelope = serde_json::from_value(json!({
            "success": true,
            "token": "abc123",
            "data": {"id": 1}
        }))
        .unwrap();
        let token: String = envelope.take("token").unwrap();
        assert_eq!(token, "abc123");
        assert!(envelope.take::<String>("missing").is_err());
    }

    #[test]
    fn missing_success_flag_counts_as_failure() {
        let envelope: Envelope =
            serde_json::from_value(json!({"message": "nope"})).unwrap();
        match envelope.into_success() {
            Err(ApiError::Rejected { message }) => assert_eq!(message.as_deref(), Some("nope")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn list_payload_handles_both_shapes() {
        let plain: ListPayload<i64> = serde_json::from_value(json!([1, 2, 3])).unwrap();
        let (items, info) = plain.into_parts();
        assert_eq!(items, vec![1, 2, 3]);
        assert!(info.is_none());

        let paged: ListPayload<i64> = serde_json::from_value(json!({
            "data": [4, 5],
            "current_page": 2,
            "last_page": 3,
            "total": 15,
            "per_page": 6
        }))
        .unwrap();
        let (items, info) = paged.into_parts();
        let info = info.expect("pagination");
        assert_eq!(items, vec![4, 5]);
        assert_eq!(info.current_page, 2);
        assert_eq!(info.total, 15);
    }
}
