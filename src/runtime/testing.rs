//! Mock implementations for testing
//!
//! These mocks enable widget tests without a real backend.

use super::traits::{OpenError, UrlOpener};
use crate::backend::{
    ApiError, AssistantBackend, AssistantReply, AssistantRequest, ReschedulePayload,
    RescheduleReply,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Backend
// ============================================================================

/// Mock backend that returns queued responses
#[derive(Default)]
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<AssistantReply, ApiError>>>,
    /// Replies for specific query texts, taking precedence over the queue
    scripted: Mutex<HashMap<String, (Duration, Result<AssistantReply, ApiError>)>>,
    reschedules: Mutex<VecDeque<Result<RescheduleReply, ApiError>>>,
    /// Record of all assistant requests made
    pub asked: Mutex<Vec<AssistantRequest>>,
    /// Record of all reschedule payloads sent
    pub rescheduled: Mutex<Vec<ReschedulePayload>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful assistant reply
    pub fn queue_reply(&self, reply: AssistantReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    /// Queue an assistant error
    pub fn queue_error(&self, error: ApiError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Answer `message` after `delay`
    pub fn script(&self, message: &str, delay: Duration, reply: Result<AssistantReply, ApiError>) {
        self.scripted
            .lock()
            .unwrap()
            .insert(message.to_string(), (delay, reply));
    }

    /// Queue a reschedule result
    pub fn queue_reschedule(&self, result: Result<RescheduleReply, ApiError>) {
        self.reschedules.lock().unwrap().push_back(result);
    }

    pub fn recorded_asks(&self) -> Vec<AssistantRequest> {
        self.asked.lock().unwrap().clone()
    }

    pub fn recorded_reschedules(&self) -> Vec<ReschedulePayload> {
        self.rescheduled.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssistantBackend for MockBackend {
    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply, ApiError> {
        self.asked.lock().unwrap().push(request.clone());

        let scripted = self.scripted.lock().unwrap().remove(&request.message);
        if let Some((delay, reply)) = scripted {
            tokio::time::sleep(delay).await;
            return reply;
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::transport("No mock reply queued")))
    }

    async fn reschedule(&self, payload: &ReschedulePayload) -> Result<RescheduleReply, ApiError> {
        self.rescheduled.lock().unwrap().push(payload.clone());
        self.reschedules
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::transport("No mock reschedule queued")))
    }
}

// ============================================================================
// Delayed Mock Backend (for teardown testing)
// ============================================================================

/// Mock backend with a fixed delay on every call
pub struct DelayedMockBackend {
    inner: MockBackend,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockBackend::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: AssistantReply) {
        self.inner.queue_reply(reply);
    }

    pub fn recorded_asks(&self) -> Vec<AssistantRequest> {
        self.inner.recorded_asks()
    }
}

#[async_trait]
impl AssistantBackend for DelayedMockBackend {
    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply, ApiError> {
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.ask(request).await
    }

    async fn reschedule(&self, payload: &ReschedulePayload) -> Result<RescheduleReply, ApiError> {
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.reschedule(payload).await
    }
}

// ============================================================================
// Recording Opener
// ============================================================================

/// Opener that remembers what it was asked to open
#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), OpenError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
