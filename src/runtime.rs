//! Runtime hosting assistant widgets
//!
//! A widget is one event loop task plus a handle. The handle feeds user
//! events in and observes the conversation through a snapshot channel and
//! an update stream.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use traits::*;

use crate::backend::{ActionSuggestion, AssistantBackend};
use crate::session::SessionManager;
use crate::state_machine::{ConvContext, ConvPhase, Event, Message, MessageRole};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

const EVENT_CHANNEL_CAPACITY: usize = 32;
const UPDATE_CHANNEL_CAPACITY: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WidgetError {
    #[error("Assistant widget is closed")]
    Closed,
}

/// What a view renders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub phase: ConvPhase,
    pub session_id: String,
}

impl ConversationSnapshot {
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn assistant_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.sender == MessageRole::Assistant)
    }

    /// Actions of the most recent assistant message
    pub fn latest_actions(&self) -> &[ActionSuggestion] {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(|m| m.actions.as_slice())
            .unwrap_or_default()
    }
}

/// Incremental changes, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetUpdate {
    MessageAppended(Message),
    PhaseChanged(ConvPhase),
    SessionChanged { session_id: String },
}

/// Handle to a mounted widget
pub struct AssistantWidget {
    event_tx: mpsc::Sender<Event>,
    updates_tx: broadcast::Sender<WidgetUpdate>,
    snapshot_rx: watch::Receiver<ConversationSnapshot>,
    task: JoinHandle<()>,
}

impl AssistantWidget {
    /// Start a widget and mount it
    ///
    /// Mounting sends the greeting query once. Must be called within a
    /// tokio runtime.
    pub async fn mount<B, O>(
        context: ConvContext,
        session: SessionManager,
        backend: B,
        opener: O,
        app_url: Option<String>,
    ) -> Result<Self, WidgetError>
    where
        B: AssistantBackend + 'static,
        O: UrlOpener + 'static,
    {
        let widget = Self::start(context, session, backend, opener, app_url);
        widget.remount().await?;
        Ok(widget)
    }

    /// Start a widget without mounting it
    ///
    /// Lets a host subscribe before the greeting goes out; call
    /// [`remount`](Self::remount) afterwards.
    pub fn start<B, O>(
        context: ConvContext,
        session: SessionManager,
        backend: B,
        opener: O,
        app_url: Option<String>,
    ) -> Self
    where
        B: AssistantBackend + 'static,
        O: UrlOpener + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (updates_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(ConversationSnapshot::default());

        let runtime = ConversationRuntime::new(
            context,
            session,
            backend,
            opener,
            app_url,
            event_rx,
            event_tx.downgrade(),
            updates_tx.clone(),
            snapshot_tx,
        );
        let task = tokio::spawn(runtime.run());

        Self {
            event_tx,
            updates_tx,
            snapshot_rx,
            task,
        }
    }

    /// Post a mount event, as a render would; only the first sends `help`
    pub async fn remount(&self) -> Result<(), WidgetError> {
        self.post(Event::Mounted).await
    }

    /// Submit user input
    pub async fn send(&self, text: impl Into<String>) -> Result<(), WidgetError> {
        self.post(Event::UserInput { text: text.into() }).await
    }

    /// Activate a suggested action
    pub async fn activate(&self, action: ActionSuggestion) -> Result<(), WidgetError> {
        self.post(Event::ActionActivated { action }).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WidgetUpdate> {
        self.updates_tx.subscribe()
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Wait until the conversation satisfies `predicate`
    pub async fn wait_until<F>(&self, predicate: F) -> Result<ConversationSnapshot, WidgetError>
    where
        F: FnMut(&ConversationSnapshot) -> bool,
    {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx.wait_for(predicate).await.map_err(|_| WidgetError::Closed)?;
        Ok(snapshot.clone())
    }

    /// Tear the widget down; replies still in flight are dropped
    pub async fn close(self) {
        let Self { event_tx, task, .. } = self;
        drop(event_tx);
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Assistant widget task failed");
        }
    }

    async fn post(&self, event: Event) -> Result<(), WidgetError> {
        self.event_tx.send(event).await.map_err(|_| WidgetError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_views() {
        let snapshot = ConversationSnapshot {
            messages: vec![
                Message::assistant_with_actions(
                    "Hi",
                    vec![ActionSuggestion::new("Tickets", "/tickets")],
                ),
                Message::user("reschedule please"),
                Message::assistant("Sure"),
                Message::user("thanks"),
            ],
            phase: ConvPhase::Idle,
            session_id: String::new(),
        };

        let texts: Vec<&str> = snapshot.assistant_messages().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Hi", "Sure"]);
        // Actions come from the latest assistant message only
        assert!(snapshot.latest_actions().is_empty());
        assert_eq!(snapshot.last_message(), Some(&Message::user("thanks")));
        assert!(ConversationSnapshot::default().latest_actions().is_empty());
    }
}
