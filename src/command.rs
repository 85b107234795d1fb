//! Command routing
//!
//! Classifies raw widget input into a structured command or a free-text
//! query, and maps each classification onto its backend endpoint. Holds no
//! state of its own.

use crate::backend::{AssistantBackend, AssistantRequest, ReschedulePayload};
use crate::state_machine::{ConvContext, ExchangeOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Literal prefix of the structured reschedule command
pub const RESCHEDULE_PREFIX: &str = "/reschedule";

/// Shown when the reschedule payload cannot be read
pub const RESCHEDULE_USAGE: &str = "I couldn't read those reschedule details. Usage: \
/reschedule {\"ticket_id\": 123, \"preferred_date\": \"YYYY-MM-DD\", \
\"reason\": \"...\", \"service_address\": \"...\"}";

/// Reschedule fields with a typed slot in the payload
const RESCHEDULE_FIELDS: [&str; 4] = ["ticket_id", "preferred_date", "reason", "service_address"];

/// Parsed user input, alive for one dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum PendingCommand {
    /// Structured reschedule request
    Reschedule(ReschedulePayload),
    /// Natural-language query, trimmed
    Query(String),
}

impl PendingCommand {
    pub fn query(text: impl Into<String>) -> Self {
        PendingCommand::Query(text.into())
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            PendingCommand::Reschedule(_) => CommandKind::Reschedule,
            PendingCommand::Query(_) => CommandKind::Query,
        }
    }
}

/// Which endpoint a command is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Reschedule,
    Query,
}

/// Input that cannot be dispatched
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// Nothing but whitespace; dropped without a message
    #[error("Empty input")]
    Empty,
    /// Text after `/reschedule` is not a reschedule object
    #[error("Malformed reschedule command: {reason}")]
    MalformedReschedule { reason: String },
}

/// Classify raw input text
pub fn classify(input: &str) -> Result<PendingCommand, ClassifyError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(ClassifyError::Empty);
    }

    match text.strip_prefix(RESCHEDULE_PREFIX) {
        Some(rest) => parse_reschedule(rest.trim()).map(PendingCommand::Reschedule),
        None => Ok(PendingCommand::Query(text.to_string())),
    }
}

fn parse_reschedule(rest: &str) -> Result<ReschedulePayload, ClassifyError> {
    if rest.is_empty() {
        return Ok(ReschedulePayload::default());
    }

    let malformed = |reason: String| ClassifyError::MalformedReschedule { reason };

    let value: Value = serde_json::from_str(rest).map_err(|e| malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string()));
    }
    // An omitted field is not sent, so a null one can't be forwarded as written
    if let Some(field) = RESCHEDULE_FIELDS
        .iter()
        .find(|field| value.get(**field).is_some_and(Value::is_null))
    {
        return Err(malformed(format!("{field} must not be null")));
    }
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

/// A backend call ready to be made
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Assistant(AssistantRequest),
    Reschedule(ReschedulePayload),
}

/// Map a command onto its endpoint
///
/// Queries carry the conversation's current session id; reschedules are
/// stateless and carry none.
pub fn route(command: PendingCommand, context: &ConvContext, session_id: &str) -> BackendCall {
    match command {
        PendingCommand::Reschedule(payload) => BackendCall::Reschedule(payload),
        PendingCommand::Query(message) => BackendCall::Assistant(AssistantRequest {
            message,
            role: context.role.clone(),
            page: context.page.clone(),
            session_id: session_id.to_string(),
        }),
    }
}

/// Perform a routed call
pub async fn dispatch<B: AssistantBackend + ?Sized>(backend: &B, call: BackendCall) -> ExchangeOutcome {
    match call {
        BackendCall::Assistant(request) => ExchangeOutcome::Assistant(backend.ask(&request).await),
        BackendCall::Reschedule(payload) => {
            ExchangeOutcome::Reschedule(backend.reschedule(&payload).await)
        }
    }
}
