use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::Value;
use tracing::debug;

use crate::bot::BotConfig;
use crate::error::{SendError, WebhookError};
use crate::sender::{ChatId, Sender};
use crate::update::{IncomingUpdate, Message};

/// Per-request view of a validated webhook call, handed to the caller's handler.
///
/// Handlers take it as an extractor:
///
/// ```ignore
/// async fn echo(ctx: RequestContext) -> StatusCode {
///     let _ = ctx.reply(json!({ "text": "pong" })).await;
///     StatusCode::NO_CONTENT
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    bot: Arc<BotConfig>,
    update_id: i64,
    message: Message,
    sender: Sender,
}

impl RequestContext {
    pub fn new(bot: Arc<BotConfig>, update: IncomingUpdate, sender: Sender) -> Self {
        Self {
            bot,
            update_id: update.update_id,
            message: update.message,
            sender,
        }
    }

    pub fn bot(&self) -> &BotConfig {
        &self.bot
    }

    pub fn update_id(&self) -> i64 {
        self.update_id
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Answer the sender with `sendMessage`.
    pub async fn reply(&self, fields: Value) -> Result<Value, SendError> {
        self.reply_with("sendMessage", fields).await
    }

    /// Call `method` on the sender's chat, quoting the incoming message.
    pub async fn reply_with(&self, method: &str, mut fields: Value) -> Result<Value, SendError> {
        if let Value::Object(map) = &mut fields {
            map.insert(
                "reply_to_message_id".to_string(),
                Value::from(self.message.message_id),
            );
        }

        debug!(
            "Replying to message {} from {} via bot {}",
            self.message.message_id, self.message.from.id, self.bot.slug
        );

        self.sender
            .send(
                Some(&self.bot.token),
                ChatId::Id(self.message.from.id),
                method,
                fields,
            )
            .await
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = WebhookError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(WebhookError::MissingContext)
    }
}
