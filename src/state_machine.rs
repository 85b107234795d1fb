//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Event, ExchangeOutcome};
pub use state::{ConvContext, ConvPhase, ConvState, ExchangeId, Message, MessageRole};
pub use transition::{
    transition, TransitionError, TransitionResult, ASSISTANT_ERROR_FALLBACK,
    ASSISTANT_UNAVAILABLE, HELP_QUERY, RESCHEDULE_CONFIRMED, RESCHEDULE_FAILED,
};
