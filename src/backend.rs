//! Backend abstraction
//!
//! The two assistant endpoints the widget talks to, behind one trait so the
//! runtime can be driven by the HTTP client or by test doubles.

mod error;
mod http;
mod types;

pub use error::{ApiError, ApiErrorKind};
pub use http::{HttpBackend, StaticToken, TokenSource, ASSISTANT_PATH, RESCHEDULE_PATH};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Common interface for the role assistant backend
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Send a free-text query to the role assistant
    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply, ApiError>;

    /// Submit a structured reschedule request
    async fn reschedule(&self, payload: &ReschedulePayload) -> Result<RescheduleReply, ApiError>;
}

#[async_trait]
impl<T: AssistantBackend + ?Sized> AssistantBackend for Arc<T> {
    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply, ApiError> {
        (**self).ask(request).await
    }

    async fn reschedule(&self, payload: &ReschedulePayload) -> Result<RescheduleReply, ApiError> {
        (**self).reschedule(payload).await
    }
}

/// Logging wrapper for backends
pub struct LoggingBackend<B> {
    inner: B,
}

impl<B: AssistantBackend> LoggingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(endpoint: &str, start: Instant, result: &Result<T, ApiError>) {
    let duration = start.elapsed();
    match result {
        Ok(_) => {
            tracing::info!(
                endpoint,
                duration_ms = %duration.as_millis(),
                "Backend request completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                endpoint,
                duration_ms = %duration.as_millis(),
                status = ?e.status(),
                error = %e.message,
                "Backend request failed"
            );
        }
    }
}

#[async_trait]
impl<B: AssistantBackend> AssistantBackend for LoggingBackend<B> {
    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply, ApiError> {
        let start = Instant::now();
        let result = self.inner.ask(request).await;
        log_outcome(ASSISTANT_PATH, start, &result);
        if let Ok(reply) = &result {
            tracing::debug!(
                role = %request.role,
                actions = reply.actions.len(),
                new_session = reply.session_id.is_some(),
                "Assistant replied"
            );
        }
        result
    }

    async fn reschedule(&self, payload: &ReschedulePayload) -> Result<RescheduleReply, ApiError> {
        let start = Instant::now();
        let result = self.inner.reschedule(payload).await;
        log_outcome(RESCHEDULE_PATH, start, &result);
        result
    }
}
