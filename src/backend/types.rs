//! Wire types for the assistant endpoints

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /ai/role-assistant`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
    pub role: String,
    pub page: String,
    /// Empty until the backend has issued one
    pub session_id: String,
}

/// Successful reply from the role assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub actions: Vec<ActionSuggestion>,
}

impl AssistantReply {
    pub fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            session_id: None,
            actions: vec![],
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_action(mut self, action: ActionSuggestion) -> Self {
        self.actions.push(action);
        self
    }

    /// Session id issued with this reply, ignoring empty strings
    pub fn issued_session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Clickable shortcut attached to an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSuggestion {
    pub title: String,
    pub url: String,
}

impl ActionSuggestion {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Body of `POST /ai/chatbot/reschedule`
///
/// Every field is optional; the backend owns validation. Fields other than
/// the four known ones are forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReschedulePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Successful reply from the reschedule endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleReply {
    #[serde(default)]
    pub message: Option<String>,
}

impl RescheduleReply {
    pub fn confirmation(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

/// Error body returned with non-success statuses
///
/// `detail` is usually a string but validation failures may carry a list
/// of objects, which is not user-facing.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    pub fn into_detail(self) -> Option<String> {
        match self.detail {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
