//! Conversation runtime executor

use super::traits::{resolve_action_url, UrlOpener};
use super::{ConversationSnapshot, WidgetUpdate};

use crate::backend::{ActionSuggestion, AssistantBackend};
use crate::command::{self, PendingCommand};
use crate::session::SessionManager;
use crate::state_machine::{
    transition, ConvContext, ConvState, Effect, Event, ExchangeId, Message,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Runtime for one widget instance
///
/// Events are processed one at a time; backend calls run as spawned tasks
/// that report back over the event channel.
pub struct ConversationRuntime<B, O>
where
    B: AssistantBackend + 'static,
    O: UrlOpener + 'static,
{
    context: ConvContext,
    state: ConvState,
    messages: Vec<Message>,
    session: SessionManager,
    backend: Arc<B>,
    opener: O,
    /// Base for relative action URLs
    app_url: Option<String>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so in-flight calls don't keep a closed widget alive
    event_tx: mpsc::WeakSender<Event>,
    updates_tx: broadcast::Sender<WidgetUpdate>,
    snapshot_tx: watch::Sender<ConversationSnapshot>,
}

impl<B, O> ConversationRuntime<B, O>
where
    B: AssistantBackend + 'static,
    O: UrlOpener + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: ConvContext,
        session: SessionManager,
        backend: B,
        opener: O,
        app_url: Option<String>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        updates_tx: broadcast::Sender<WidgetUpdate>,
        snapshot_tx: watch::Sender<ConversationSnapshot>,
    ) -> Self {
        Self {
            context,
            state: ConvState::default(),
            messages: Vec::new(),
            session,
            backend: Arc::new(backend),
            opener,
            app_url,
            event_rx,
            event_tx,
            updates_tx,
            snapshot_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(role = %self.context.role, page = %self.context.page, "Starting assistant widget");
        self.publish_snapshot();

        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        tracing::info!(
            role = %self.context.role,
            abandoned = self.state.pending.len(),
            "Assistant widget closed"
        );
    }

    fn process_event(&mut self, event: Event) {
        // Pure state transition
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring event");
                return;
            }
        };

        let old_phase = self.state.phase();
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }

        let phase = self.state.phase();
        if phase != old_phase {
            let _ = self.updates_tx.send(WidgetUpdate::PhaseChanged(phase));
        }
        self.publish_snapshot();
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage(message) => {
                self.messages.push(message.clone());
                let _ = self.updates_tx.send(WidgetUpdate::MessageAppended(message));
            }

            Effect::Dispatch { exchange, command } => self.spawn_exchange(exchange, command),

            Effect::PersistSession { session_id } => {
                if self.session.accept_reply_session(Some(&session_id)) {
                    let _ = self.updates_tx.send(WidgetUpdate::SessionChanged { session_id });
                }
            }

            Effect::OpenAction { action } => self.open_action(&action),
        }
    }

    /// Route the command and run the call in the background
    fn spawn_exchange(&self, exchange: ExchangeId, command: PendingCommand) {
        let kind = command.kind();
        let call = command::route(command, &self.context, self.session.current_session_id());
        let backend = Arc::clone(&self.backend);
        let event_tx = self.event_tx.clone();

        tracing::debug!(exchange, ?kind, "Dispatching exchange");

        tokio::spawn(async move {
            let outcome = command::dispatch(backend.as_ref(), call).await;

            // The widget may have been closed while the call was in flight
            let Some(tx) = event_tx.upgrade() else {
                tracing::debug!(exchange, "Widget closed, dropping reply");
                return;
            };
            if tx
                .send(Event::ExchangeCompleted { exchange, outcome })
                .await
                .is_err()
            {
                tracing::debug!(exchange, "Widget closed, dropping reply");
            }
        });
    }

    fn open_action(&self, action: &ActionSuggestion) {
        let url = match resolve_action_url(self.app_url.as_deref(), &action.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(title = %action.title, error = %e, "Refusing to open action");
                return;
            }
        };
        match self.opener.open(&url) {
            Ok(()) => tracing::info!(title = %action.title, url = %url, "Opened action"),
            Err(e) => tracing::warn!(title = %action.title, error = %e, "Failed to open action"),
        }
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(ConversationSnapshot {
            messages: self.messages.clone(),
            phase: self.state.phase(),
            session_id: self.session.current_session_id().to_string(),
        });
    }
}
