use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::error::WebhookError;
use crate::update::Message;

/// Handler that returns its reply (or error) directly.
#[async_trait]
pub trait DirectHandler: Send + Sync {
    async fn handle(&self, message: Message) -> Result<Option<Value>>;
}

#[async_trait]
impl<F, Fut> DirectHandler for F
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Value>>> + Send + 'static,
{
    async fn handle(&self, message: Message) -> Result<Option<Value>> {
        (self)(message).await
    }
}

/// Handler that signals the outcome through a [`Completion`] and may keep
/// working afterwards.
#[async_trait]
pub trait CallbackHandler: Send + Sync {
    async fn handle(&self, message: Message, done: Completion);
}

#[async_trait]
impl<F, Fut> CallbackHandler for F
where
    F: Fn(Message, Completion) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, message: Message, done: Completion) {
        (self)(message, done).await
    }
}

/// One-shot completion signal for a [`CallbackHandler`].
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Result<Option<Value>>>,
}

impl Completion {
    pub fn complete(self, outcome: Result<Option<Value>>) {
        // The request may already be gone; nothing left to tell.
        let _ = self.tx.send(outcome);
    }

    /// Finish with a JSON reply (answered with 200).
    pub fn reply(self, reply: Value) {
        self.complete(Ok(Some(reply)));
    }

    /// Finish without a reply (answered with 204).
    pub fn done(self) {
        self.complete(Ok(None));
    }

    pub fn fail(self, err: impl Into<anyhow::Error>) {
        self.complete(Err(err.into()));
    }
}

type FireAndForgetFn = dyn Fn(Message) -> BoxFuture<'static, ()> + Send + Sync;

/// How the single-bot gate calls into business logic. Picked explicitly at
/// setup.
#[derive(Clone)]
pub enum IncomingHandler {
    Callback(Arc<dyn CallbackHandler>),
    Direct(Arc<dyn DirectHandler>),
    FireAndForget(Arc<FireAndForgetFn>),
}

impl IncomingHandler {
    pub fn callback<F, Fut>(f: F) -> Self
    where
        F: Fn(Message, Completion) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        IncomingHandler::Callback(Arc::new(f))
    }

    pub fn direct<F, Fut>(f: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Value>>> + Send + 'static,
    {
        IncomingHandler::Direct(Arc::new(f))
    }

    pub fn fire_and_forget<F, Fut>(f: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        IncomingHandler::FireAndForget(Arc::new(
            move |message: Message| -> BoxFuture<'static, ()> { Box::pin(f(message)) },
        ))
    }

    /// Fallback used when no handler is configured: log every message.
    pub fn log_messages() -> Self {
        Self::fire_and_forget(|message: Message| async move {
            info!(
                "Message {}",
                serde_json::to_string_pretty(&message).unwrap_or_default()
            );
        })
    }

    /// Run the handler. `Ok(Some(_))` is a reply, `Ok(None)` an empty ack.
    pub async fn dispatch(&self, message: Message) -> Result<Option<Value>, WebhookError> {
        match self {
            IncomingHandler::Callback(handler) => {
                let (tx, rx) = oneshot::channel();
                let handler = handler.clone();
                tokio::spawn(async move { handler.handle(message, Completion { tx }).await });

                match rx.await {
                    Ok(Ok(reply)) => Ok(reply),
                    Ok(Err(e)) => Err(WebhookError::Handler(e)),
                    Err(_) => Err(WebhookError::HandlerAbandoned),
                }
            }
            IncomingHandler::Direct(handler) => {
                let handler = handler.clone();
                // Spawned so a panicking handler becomes an error result.
                match tokio::spawn(async move { handler.handle(message).await }).await {
                    Ok(Ok(reply)) => Ok(reply),
                    Ok(Err(e)) => Err(WebhookError::Handler(e)),
                    Err(join_err) => {
                        error!("Incoming handler panicked: {}", join_err);
                        Err(WebhookError::Handler(anyhow::anyhow!(
                            "handler panicked: {}",
                            join_err
                        )))
                    }
                }
            }
            IncomingHandler::FireAndForget(f) => {
                tokio::spawn(f(message));
                Ok(None)
            }
        }
    }
}

impl Default for IncomingHandler {
    fn default() -> Self {
        Self::log_messages()
    }
}

impl std::fmt::Debug for IncomingHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncomingHandler::Callback(_) => f.write_str("Callback"),
            IncomingHandler::Direct(_) => f.write_str("Direct"),
            IncomingHandler::FireAndForget(_) => f.write_str("FireAndForget"),
        }
    }
}
