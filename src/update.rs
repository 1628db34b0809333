use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WebhookError;

/// A validated Telegram update carrying a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingUpdate {
    pub update_id: i64,
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<Chat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Everything else Telegram sent (entities, photos, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

impl IncomingUpdate {
    /// Check the decoded body has the fields the gate relies on, then decode it.
    ///
    /// Stops at the first missing field, in order: update id, message id,
    /// sender, sender id.
    pub fn from_value(body: &Value) -> Result<Self, WebhookError> {
        if is_missing(body.get("update_id")) {
            return Err(WebhookError::MalformedUpdate("update_id"));
        }

        let message = body.get("message");
        if is_missing(message.and_then(|m| m.get("message_id"))) {
            return Err(WebhookError::MalformedUpdate("message.message_id"));
        }

        let from = message.and_then(|m| m.get("from"));
        if is_missing(from) {
            return Err(WebhookError::MalformedUpdate("message.from"));
        }
        if is_missing(from.and_then(|f| f.get("id"))) {
            return Err(WebhookError::MalformedUpdate("message.from.id"));
        }

        Self::deserialize(body).map_err(|e| WebhookError::InvalidUpdate(e.to_string()))
    }
}
