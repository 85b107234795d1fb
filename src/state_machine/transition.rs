//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! new state and effects. All I/O happens in the runtime.

use super::state::{ExchangeId, Message, PendingExchange};
use super::{ConvContext, ConvState, Effect, Event, ExchangeOutcome};
use crate::backend::{ApiError, AssistantReply, RescheduleReply};
use crate::command::{classify, ClassifyError, CommandKind, PendingCommand, RESCHEDULE_USAGE};
use thiserror::Error;

/// Query sent once on mount to seed the conversation
pub const HELP_QUERY: &str = "help";

/// Backend refused a query without saying why
pub const ASSISTANT_ERROR_FALLBACK: &str = "Sorry, I couldn't process that request.";

/// No response reached the widget
pub const ASSISTANT_UNAVAILABLE: &str =
    "The assistant is unavailable right now. Please try again in a moment.";

/// Reschedule accepted without a server message
pub const RESCHEDULE_CONFIRMED: &str = "Your ticket has been rescheduled.";

/// Reschedule rejected without a server detail
pub const RESCHEDULE_FAILED: &str = "Sorry, the ticket could not be rescheduled.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("No pending exchange with id {0}")]
    UnknownExchange(ExchangeId),
    #[error("Exchange {0} resolved with an outcome for the other endpoint")]
    MismatchedOutcome(ExchangeId),
}

/// Pure transition function
pub fn transition(
    state: &ConvState,
    _context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // Greeting goes out once per widget, however often it mounts
        Event::Mounted => {
            if state.help_dispatched {
                return Ok(TransitionResult::new(state.clone()));
            }
            let mut new_state = state.clone();
            new_state.help_dispatched = true;
            let effect = begin_exchange(&mut new_state, PendingCommand::query(HELP_QUERY));
            Ok(TransitionResult::new(new_state).with_effect(effect))
        }

        Event::UserInput { text } => match classify(&text) {
            Err(ClassifyError::Empty) => Ok(TransitionResult::new(state.clone())),

            // Never reaches the network
            Err(ClassifyError::MalformedReschedule { .. }) => {
                Ok(TransitionResult::new(state.clone())
                    .with_effect(Effect::user_message(text))
                    .with_effect(Effect::assistant_message(RESCHEDULE_USAGE)))
            }

            Ok(command) => {
                let mut new_state = state.clone();
                let dispatch = begin_exchange(&mut new_state, command);
                Ok(TransitionResult::new(new_state)
                    .with_effect(Effect::user_message(text))
                    .with_effect(dispatch))
            }
        },

        Event::ExchangeCompleted { exchange, outcome } => {
            let Some(kind) = state.pending_kind(exchange) else {
                return Err(TransitionError::UnknownExchange(exchange));
            };
            if kind != outcome_kind(&outcome) {
                return Err(TransitionError::MismatchedOutcome(exchange));
            }

            let mut new_state = state.clone();
            new_state.pending.retain(|p| p.id != exchange);

            let effects = match outcome {
                ExchangeOutcome::Assistant(result) => assistant_effects(result),
                ExchangeOutcome::Reschedule(result) => vec![reschedule_effect(result)],
            };
            Ok(TransitionResult::new(new_state).with_effects(effects))
        }

        Event::ActionActivated { action } => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::OpenAction { action }))
        }
    }
}

/// Allocate an exchange id and record it as pending
fn begin_exchange(state: &mut ConvState, command: PendingCommand) -> Effect {
    let exchange = state.next_exchange_id;
    state.next_exchange_id += 1;
    state.pending.push(PendingExchange {
        id: exchange,
        kind: command.kind(),
    });
    Effect::Dispatch { exchange, command }
}

fn outcome_kind(outcome: &ExchangeOutcome) -> CommandKind {
    match outcome {
        ExchangeOutcome::Assistant(_) => CommandKind::Query,
        ExchangeOutcome::Reschedule(_) => CommandKind::Reschedule,
    }
}

fn assistant_effects(result: Result<AssistantReply, ApiError>) -> Vec<Effect> {
    match result {
        Ok(reply) => {
            let mut effects = Vec::with_capacity(2);
            // An omitted session id keeps the current one
            if let Some(session_id) = reply.issued_session_id() {
                effects.push(Effect::PersistSession {
                    session_id: session_id.to_string(),
                });
            }
            effects.push(Effect::AppendMessage(Message::assistant_with_actions(
                reply.reply,
                reply.actions,
            )));
            effects
        }
        Err(e) if e.kind.is_transport() => vec![Effect::assistant_message(ASSISTANT_UNAVAILABLE)],
        Err(e) => vec![Effect::assistant_message(
            e.user_detail().unwrap_or(ASSISTANT_ERROR_FALLBACK),
        )],
    }
}

fn reschedule_effect(result: Result<RescheduleReply, ApiError>) -> Effect {
    match result {
        Ok(reply) => Effect::assistant_message(reply.confirmation().unwrap_or(RESCHEDULE_CONFIRMED)),
        Err(e) => Effect::assistant_message(e.user_detail().unwrap_or(RESCHEDULE_FAILED)),
    }
}
