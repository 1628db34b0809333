use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::{http::StatusCode, Router};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telegram_gate::{Config, IncomingHandler, RequestContext, Sender, SingleBotGate, WebhookGate};

/// Multi-bot handler: echo the text back as a quoted reply.
async fn echo(ctx: RequestContext) -> StatusCode {
    let text = ctx.message().text.clone().unwrap_or_default();
    info!(
        "Message {} for bot {} from {}: {}",
        ctx.message().message_id,
        ctx.bot().name,
        ctx.message().from.id,
        text
    );

    if let Err(e) = ctx.reply(json!({ "text": text })).await {
        warn!("Reply failed: {}", e);
    }
    StatusCode::NO_CONTENT
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,telegram_gate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Bots: {}", config.bots.len());
    info!("  Webhook URL: {}", config.webhook_url().unwrap_or("(not registered)"));

    let sender = Sender::new(config.settings());

    let webhook = if config.is_multi_bot() {
        WebhookGate::setup(&config, sender)
            .await
            .context("Invalid webhook configuration")?
            .router(echo)
    } else {
        let handler = IncomingHandler::direct(|message| async move {
            Ok(message.text.map(|text| {
                json!({
                    "method": "sendMessage",
                    "chat_id": message.from.id,
                    "reply_to_message_id": message.message_id,
                    "text": text,
                })
            }))
        });
        SingleBotGate::setup(&config, sender, Some(handler))
            .await
            .context("Invalid webhook configuration")?
            .router()
    };

    let app = Router::new().nest("/telegram", webhook);

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!("Listening on {}", config.listen);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
