//! Telegram webhook gate and Bot API sender.
//!
//! - [`Sender`] posts one Bot API call per (chat, message) and folds transport
//!   and API failures into [`SendError`].
//! - [`WebhookGate`] authenticates and validates inbound webhook requests for a
//!   table of bots and hands handlers a [`RequestContext`] with a bound `reply`.
//! - [`SingleBotGate`] serves one implicit bot and turns an
//!   [`IncomingHandler`]'s return value into the HTTP response.

pub mod auth;
pub mod bot;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod sender;
pub mod update;
pub mod webhook;

pub use auth::{AuthCarrier, AuthRule, RequestParams};
pub use bot::{BotConfig, BotRegistry};
pub use config::{AuthSpec, BotEntry, CarrierKind, Config};
pub use context::RequestContext;
pub use error::{ConfigError, SendError, WebhookError};
pub use handler::{CallbackHandler, Completion, DirectHandler, IncomingHandler};
pub use sender::{ChatId, OutgoingMessage, SendRequest, Sender, Settings, SettingsOptions};
pub use update::{IncomingUpdate, Message, User};
pub use webhook::{parse_json_body, ParsedBody, SingleBotGate, WebhookGate};
