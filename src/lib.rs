//! Role Assistant - client for the embedded role assistant widget
//!
//! Keeps a durable conversation session per role, routes structured
//! commands and free-text queries to the backend, and reconciles the
//! conversation with asynchronous replies through a pure state machine.

pub mod backend;
pub mod command;
pub mod config;
pub mod runtime;
pub mod session;
pub mod state_machine;

pub use backend::{
    ActionSuggestion, ApiError, ApiErrorKind, AssistantBackend, AssistantReply, AssistantRequest,
    HttpBackend, LoggingBackend, ReschedulePayload, RescheduleReply, StaticToken, TokenSource,
};
pub use command::{classify, ClassifyError, PendingCommand};
pub use config::AssistantConfig;
pub use runtime::{AssistantWidget, ConversationSnapshot, WidgetError, WidgetUpdate};
pub use session::{MemorySessionStore, SessionManager, SessionStore, SqliteSessionStore};
pub use state_machine::{ConvContext, ConvPhase, ConvState, Message, MessageRole};
