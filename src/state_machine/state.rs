//! Conversation state types

use crate::backend::ActionSuggestion;
use crate::command::CommandKind;
use serde::{Deserialize, Serialize};

/// Identifies one dispatched backend call within a widget
pub type ExchangeId = u64;

// ============================================================================
// Messages
// ============================================================================

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One entry of the rendered conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: MessageRole,
    pub text: String,
    #[serde(default)]
    pub actions: Vec<ActionSuggestion>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: MessageRole::User,
            text: text.into(),
            actions: vec![],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: MessageRole::Assistant,
            text: text.into(),
            actions: vec![],
        }
    }

    pub fn assistant_with_actions(text: impl Into<String>, actions: Vec<ActionSuggestion>) -> Self {
        Self {
            sender: MessageRole::Assistant,
            text: text.into(),
            actions,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.sender == MessageRole::Assistant
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// A backend call that has been dispatched and not yet resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingExchange {
    pub id: ExchangeId,
    pub kind: CommandKind,
}

/// Observable phase of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvPhase {
    /// Nothing in flight
    #[default]
    Idle,
    /// At least one exchange awaiting its reply
    Sending { in_flight: usize },
}

/// Conversation state
///
/// Messages are not part of the state; they are emitted as effects and
/// owned by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConvState {
    /// Exchanges in dispatch order
    pub pending: Vec<PendingExchange>,
    /// Whether the greeting `help` query has gone out
    pub help_dispatched: bool,
    /// Next id to hand out
    pub next_exchange_id: ExchangeId,
}

impl ConvState {
    pub fn phase(&self) -> ConvPhase {
        if self.pending.is_empty() {
            ConvPhase::Idle
        } else {
            ConvPhase::Sending {
                in_flight: self.pending.len(),
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Kind of a pending exchange, if it is still pending
    pub fn pending_kind(&self, id: ExchangeId) -> Option<CommandKind> {
        self.pending.iter().find(|p| p.id == id).map(|p| p.kind)
    }
}

/// Context for a conversation (immutable configuration)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvContext {
    /// Acting user's role; also keys the persisted session
    pub role: String,
    /// Page the widget is embedded in, reported with each query
    pub page: String,
}

impl ConvContext {
    pub fn new(role: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            page: page.into(),
        }
    }
}
