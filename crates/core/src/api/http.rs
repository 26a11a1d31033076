//! Concrete request executor backed by `reqwest`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

use crate::config::AppConfig;
use crate::credentials::TokenCell;

use super::{ApiError, ApiRequest, Envelope, FieldValue, Method, MultipartField, Payload, RequestExecutor};

/// Executes [`ApiRequest`]s against the backend over HTTP, attaching
/// the bearer credential held in the shared [`TokenCell`].
pub struct HttpExecutor {
    base_url: String,
    client: reqwest::Client,
    token: TokenCell,
}

impl HttpExecutor {
    /// Build an executor for the given base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration, token: TokenCell) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            token,
        })
    }

    /// Build an executor from application configuration.
    pub fn from_config(config: &AppConfig, token: TokenCell) -> Result<Self> {
        Self::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
            token,
        )
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn build_form(fields: Vec<MultipartField>) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for field in fields {
        form = match field.value {
            FieldValue::Text(text) => form.text(field.name, text),
            FieldValue::File(upload) => {
                let mut part = Part::bytes(upload.bytes).file_name(upload.filename);
                if let Some(mime) = upload.mime {
                    part = part
                        .mime_str(&mime)
                        .map_err(|err| ApiError::Shape(format!("invalid MIME type: {err}")))?;
                }
                form.part(field.name, part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: ApiRequest) -> Result<Envelope, ApiError> {
        let url = self.url_for(&request.path);
        debug!(method = request.method.as_str(), %url, "executing API request");

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = self.token.get() {
            builder = builder.bearer_auth(token);
        }
        builder = match request.payload {
            Payload::Empty => builder,
            Payload::Json(body) => builder.json(&body),
            Payload::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            let message = body
                .as_ref()
                .and_then(|value| value.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string);
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
                message,
            });
        }

        // Non-JSON bodies only occur on transport-level breakage; the
        // application envelope decides success for everything else.
        let body = body.ok_or_else(|| ApiError::Network(format!("HTTP {status}: body was not JSON")))?;
        let envelope: Envelope =
            serde_json::from_value(body).map_err(|err| ApiError::Shape(err.to_string()))?;
        envelope.into_success()
    }
}
