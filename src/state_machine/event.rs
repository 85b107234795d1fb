//! Events that can occur in a conversation

use super::state::ExchangeId;
use crate::backend::{ActionSuggestion, ApiError, AssistantReply, RescheduleReply};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Widget mounted (or re-rendered)
    Mounted,

    /// User submitted input text
    UserInput { text: String },

    /// A dispatched backend call resolved
    ExchangeCompleted {
        exchange: ExchangeId,
        outcome: ExchangeOutcome,
    },

    /// User selected a suggested action
    ActionActivated { action: ActionSuggestion },
}

/// Result of a backend call, tagged by endpoint
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    Assistant(Result<AssistantReply, ApiError>),
    Reschedule(Result<RescheduleReply, ApiError>),
}
