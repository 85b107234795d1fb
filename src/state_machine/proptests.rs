//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::state::*;
use super::transition::*;
use super::*;
use crate::backend::{ActionSuggestion, ApiError, AssistantReply, RescheduleReply};
use crate::command::{CommandKind, PendingCommand};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new("customer", "dashboard")
}

/// Abstract operation, resolved against the current state when applied
#[derive(Debug, Clone)]
enum Op {
    Mount,
    Input(String),
    /// Resolve the n-th pending exchange (modulo pending count)
    Resolve { slot: usize, result: ResultShape },
    /// Resolve an id that was never handed out
    ResolveStale,
    Activate,
}

#[derive(Debug, Clone, Copy)]
enum ResultShape {
    Success { with_session: bool },
    Application { with_detail: bool },
    Transport,
}

fn outcome_for(kind: CommandKind, shape: ResultShape) -> ExchangeOutcome {
    match kind {
        CommandKind::Query => ExchangeOutcome::Assistant(match shape {
            ResultShape::Success { with_session } => {
                let reply = AssistantReply::text("reply");
                Ok(if with_session {
                    reply.with_session("sess")
                } else {
                    reply
                })
            }
            ResultShape::Application { with_detail } => Err(ApiError::application(
                500,
                with_detail.then(|| "detail".to_string()),
            )),
            ResultShape::Transport => Err(ApiError::transport("down")),
        }),
        CommandKind::Reschedule => ExchangeOutcome::Reschedule(match shape {
            ResultShape::Success { .. } => Ok(RescheduleReply::default()),
            ResultShape::Application { with_detail } => Err(ApiError::application(
                400,
                with_detail.then(|| "detail".to_string()),
            )),
            ResultShape::Transport => Err(ApiError::transport("down")),
        }),
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_input() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{1,20}",
        "[ \t\n]{0,5}",
        Just(r#"/reschedule {"ticket_id": 1}"#.to_string()),
        Just("/reschedule".to_string()),
        Just("/reschedule not json".to_string()),
    ]
}

fn arb_shape() -> impl Strategy<Value = ResultShape> {
    prop_oneof![
        any::<bool>().prop_map(|with_session| ResultShape::Success { with_session }),
        any::<bool>().prop_map(|with_detail| ResultShape::Application { with_detail }),
        Just(ResultShape::Transport),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::Mount),
        4 => arb_input().prop_map(Op::Input),
        4 => (any::<usize>(), arb_shape()).prop_map(|(slot, result)| Op::Resolve { slot, result }),
        1 => Just(Op::ResolveStale),
        1 => Just(Op::Activate),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_exchange_bookkeeping(ops in prop::collection::vec(arb_op(), 0..40)) {
        let ctx = test_context();
        let mut state = ConvState::default();
        let mut issued: HashSet<ExchangeId> = HashSet::new();
        let mut help_dispatches = 0;

        for op in ops {
            let event = match op {
                Op::Mount => Event::Mounted,
                Op::Input(text) => Event::UserInput { text },
                Op::Resolve { slot, result } => {
                    if state.pending.is_empty() {
                        continue;
                    }
                    let target = &state.pending[slot % state.pending.len()];
                    Event::ExchangeCompleted {
                        exchange: target.id,
                        outcome: outcome_for(target.kind, result),
                    }
                }
                Op::ResolveStale => {
                    let stale = state.next_exchange_id + 100;
                    let result = transition(&state, &ctx, Event::ExchangeCompleted {
                        exchange: stale,
                        outcome: outcome_for(CommandKind::Query, ResultShape::Transport),
                    });
                    prop_assert_eq!(result.unwrap_err(), TransitionError::UnknownExchange(stale));
                    continue;
                }
                Op::Activate => Event::ActionActivated {
                    action: ActionSuggestion::new("Go", "/go"),
                },
            };

            let completes = matches!(event, Event::ExchangeCompleted { .. });
            let empty_input = matches!(&event, Event::UserInput { text } if text.trim().is_empty());
            let before = state.pending.len();

            let result = transition(&state, &ctx, event).unwrap();

            let dispatched: Vec<ExchangeId> = result.effects.iter().filter_map(|e| match e {
                Effect::Dispatch { exchange, command } => {
                    if *command == PendingCommand::query(HELP_QUERY) && result.new_state.help_dispatched && !state.help_dispatched {
                        help_dispatches += 1;
                    }
                    Some(*exchange)
                }
                _ => None,
            }).collect();

            // Exchange ids are never reused
            for id in &dispatched {
                prop_assert!(issued.insert(*id));
            }

            // Pending count moves by exactly the dispatched/resolved amount
            let resolved = usize::from(completes);
            prop_assert_eq!(result.new_state.pending.len(), before + dispatched.len() - resolved);

            // Phase mirrors the pending set
            prop_assert_eq!(result.new_state.is_idle(), result.new_state.phase() == ConvPhase::Idle);

            if empty_input {
                prop_assert!(result.effects.is_empty());
                prop_assert_eq!(&result.new_state, &state);
            }

            if completes {
                let assistant_appends = result.effects.iter().filter(|e| matches!(
                    e,
                    Effect::AppendMessage(m) if m.sender == MessageRole::Assistant
                )).count();
                prop_assert_eq!(assistant_appends, 1);
            }

            state = result.new_state;
        }

        prop_assert!(help_dispatches <= 1);
    }

    #[test]
    fn prop_session_only_persisted_when_issued(with_session in any::<bool>(), sid in "[a-z0-9]{0,12}") {
        let mut state = ConvState::default();
        state.pending.push(super::state::PendingExchange { id: 0, kind: CommandKind::Query });
        state.next_exchange_id = 1;

        let reply = if with_session {
            AssistantReply::text("hi").with_session(sid.clone())
        } else {
            AssistantReply::text("hi")
        };
        let result = transition(&state, &test_context(), Event::ExchangeCompleted {
            exchange: 0,
            outcome: ExchangeOutcome::Assistant(Ok(reply)),
        }).unwrap();

        let persisted: Vec<&String> = result.effects.iter().filter_map(|e| match e {
            Effect::PersistSession { session_id } => Some(session_id),
            _ => None,
        }).collect();

        if with_session && !sid.is_empty() {
            prop_assert_eq!(persisted, vec![&sid]);
        } else {
            prop_assert!(persisted.is_empty());
        }
    }
}
