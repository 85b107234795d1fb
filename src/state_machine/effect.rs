//! Effects produced by state transitions

use super::state::{ExchangeId, Message};
use crate::backend::ActionSuggestion;
use crate::command::PendingCommand;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message to the conversation
    AppendMessage(Message),

    /// Send a command to the backend (spawns as background task)
    Dispatch {
        exchange: ExchangeId,
        command: PendingCommand,
    },

    /// Store a session id issued by the backend
    PersistSession { session_id: String },

    /// Open a suggested action's URL
    OpenAction { action: ActionSuggestion },
}

impl Effect {
    pub fn user_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage(Message::user(text))
    }

    pub fn assistant_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage(Message::assistant(text))
    }
}
