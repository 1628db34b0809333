use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Setup-time failures. Returned from gate and settings constructors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing token for bot `{0}`")]
    MissingBotToken(String),

    #[error("Missing token")]
    MissingToken,

    #[error("Auth object cannot have a query and param property")]
    ConflictingAuthCarrier,

    #[error("Missing auth key")]
    MissingAuthKey,

    #[error("Auth object needs a query or param property")]
    MissingAuthCarrier,
}

/// Failures of a single outbound Bot API call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("Missing `token` property")]
    MissingToken,

    #[error("Missing `to` property")]
    MissingRecipient,

    #[error("Missing `method`{}", message_suffix(.multi))]
    MissingMethod { multi: bool },

    #[error("Missing `data`{}", message_suffix(.multi))]
    MissingData { multi: bool },

    /// Reported by Telegram in the response body, prefix stripped.
    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    Transport(String),

    #[error("Failed to read upload {0}")]
    File(String),

    #[error("Something went wrong")]
    Unknown,
}

fn message_suffix(multi: &bool) -> &'static str {
    if *multi {
        " for multi message"
    } else {
        " for message"
    }
}

/// Per-request rejections produced by the webhook steps.
///
/// Each variant maps onto the HTTP status the caller's server answers with.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing bot name in path parameter `{0}`")]
    MissingBotName(String),

    #[error("Missing body - did you parse the JSON body?")]
    MissingBody,

    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("Unknown bot `{0}`")]
    UnknownBot(String),

    #[error("Missing {carrier} \"{name}\"")]
    MissingAuth { carrier: &'static str, name: String },

    #[error("Invalid authentication {carrier}")]
    InvalidAuth { carrier: &'static str },

    #[error("Request rejected by auth predicate")]
    Rejected,

    #[error("Malformed update: missing {0}")]
    MalformedUpdate(&'static str),

    #[error("Malformed update: {0}")]
    InvalidUpdate(String),

    #[error("Handler failed: {0:#}")]
    Handler(anyhow::Error),

    #[error("Handler finished without signalling completion")]
    HandlerAbandoned,

    #[error("No request context - is the handler mounted behind the webhook gate?")]
    MissingContext,
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingBotName(_) | Self::UnknownBot(_) => StatusCode::NOT_FOUND,
            Self::MissingBody
            | Self::Handler(_)
            | Self::HandlerAbandoned
            | Self::MissingContext => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MalformedBody(_) | Self::MalformedUpdate(_) | Self::InvalidUpdate(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::MissingAuth { .. } => StatusCode::UNAUTHORIZED,
            Self::InvalidAuth { .. } | Self::Rejected => StatusCode::FORBIDDEN,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingBotName(_) => "MISSING_BOT_NAME",
            Self::MissingBody | Self::MissingContext => "MISCONFIGURED",
            Self::MalformedBody(_) => "MALFORMED_BODY",
            Self::UnknownBot(_) => "UNKNOWN_BOT",
            Self::MissingAuth { .. } => "MISSING_AUTH",
            Self::InvalidAuth { .. } => "INVALID_AUTH",
            Self::Rejected => "FORBIDDEN",
            Self::MalformedUpdate(_) | Self::InvalidUpdate(_) => "MALFORMED_UPDATE",
            Self::Handler(_) | Self::HandlerAbandoned => "HANDLER_ERROR",
        }
    }
}

/// JSON body written for rejected webhook requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Webhook request failed: {}", self);
        } else {
            tracing::debug!("Webhook request rejected ({}): {}", status, self);
        }

        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
