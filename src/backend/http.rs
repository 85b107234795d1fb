//! HTTP implementation of the assistant backend

use super::types::{
    AssistantReply, AssistantRequest, ErrorBody, ReschedulePayload, RescheduleReply,
};
use super::{ApiError, AssistantBackend};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

pub const ASSISTANT_PATH: &str = "/ai/role-assistant";
pub const RESCHEDULE_PATH: &str = "/ai/chatbot/reschedule";

/// Source of the bearer token attached to every request
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token, or none
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.is_empty()))
    }
}

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Role assistant backend over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Arc<dyn TokenSource>,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: Arc<dyn TokenSource>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url, token))
    }

    pub fn with_client(client: Client, base_url: &str, token: Arc<dyn TokenSource>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST `body` and return the raw text of a success response
    async fn post_json<T>(&self, path: &str, body: &T) -> Result<String, ApiError>
    where
        T: Serialize + Sync,
    {
        let mut request = self.client.post(self.endpoint(path)).json(body);
        if let Some(token) = self.token.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::transport(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                ApiError::transport(format!("Connection failed: {e}"))
            } else {
                ApiError::transport(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }
        Ok(body)
    }
}

fn parse_body<R: DeserializeOwned>(body: &str) -> Result<R, ApiError> {
    serde_json::from_str(body)
        .map_err(|e| ApiError::transport(format!("Malformed response body: {e}")))
}

/// The reschedule endpoint may accept with no body at all (204) or `null`
fn parse_reschedule_body(body: &str) -> Result<RescheduleReply, ApiError> {
    if body.trim().is_empty() {
        return Ok(RescheduleReply::default());
    }
    parse_body::<Option<RescheduleReply>>(body).map(Option::unwrap_or_default)
}

/// Turn a non-success response into an application error
fn classify_error(status: StatusCode, body: &str) -> ApiError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_detail);
    ApiError::application(status.as_u16(), detail)
}

#[async_trait]
impl AssistantBackend for HttpBackend {
    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply, ApiError> {
        parse_body(&self.post_json(ASSISTANT_PATH, request).await?)
    }

    async fn reschedule(&self, payload: &ReschedulePayload) -> Result<RescheduleReply, ApiError> {
        parse_reschedule_body(&self.post_json(RESCHEDULE_PATH, payload).await?)
    }
}
