use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    handler::Handler,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures::future::join_all;
use reqwest::Url;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::auth::{require_auth, AuthCarrier, AuthRule, RequestParams};
use crate::bot::{BotConfig, BotRegistry};
use crate::config::Config;
use crate::context::RequestContext;
use crate::error::{ConfigError, WebhookError};
use crate::handler::IncomingHandler;
use crate::sender::Sender;
use crate::update::IncomingUpdate;

/// Largest webhook body accepted by [`parse_json_body`].
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Decoded JSON body, placed in request extensions by [`parse_json_body`].
#[derive(Debug, Clone)]
pub struct ParsedBody(pub Value);

/// Body-parsing step: decodes the request body as JSON ahead of the gate.
pub async fn parse_json_body(request: Request, next: Next) -> Result<Response, WebhookError> {
    let (mut parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| WebhookError::MalformedBody(e.to_string()))?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| WebhookError::MalformedBody(e.to_string()))?;

    parts.extensions.insert(ParsedBody(value));
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

fn parsed_body(request: &Request) -> Option<&Value> {
    request.extensions().get::<ParsedBody>().map(|b| &b.0)
}

fn top_level_auth(config: &Config) -> Result<Option<AuthRule>, ConfigError> {
    config.auth.as_ref().map(AuthRule::from_spec).transpose()
}

/// Path segment capturing a named parameter, e.g. `{bot_name}`.
fn capture(name: &str) -> String {
    format!("{{{}}}", name)
}

/// Build `base/segments...?query` with proper escaping.
fn webhook_url(base: &str, segments: &[&str], query: &[(&str, &str)]) -> Option<String> {
    let mut url = Url::parse(base).ok()?;
    {
        let mut path = url.path_segments_mut().ok()?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Some(url.into())
}

/// URL pieces contributed by the top-level auth rule.
fn auth_url_parts(auth: Option<&AuthRule>) -> (Vec<&str>, Vec<(&str, &str)>) {
    match auth {
        Some(AuthRule::StaticKey {
            carrier: AuthCarrier::Param(_),
            key,
        }) => (vec![key.as_str()], Vec::new()),
        Some(AuthRule::StaticKey {
            carrier: AuthCarrier::Query(name),
            key,
        }) => (Vec::new(), vec![(name.as_str(), key.as_str())]),
        _ => (Vec::new(), Vec::new()),
    }
}

/// Route prefix contributed by a param-carried top-level auth key.
fn auth_route_prefix(auth: Option<&AuthRule>) -> String {
    match auth {
        Some(AuthRule::StaticKey {
            carrier: AuthCarrier::Param(name),
            ..
        }) => format!("/{}", capture(name)),
        _ => String::new(),
    }
}

async fn set_webhook(sender: &Sender, bot: &BotConfig, url: &str, certificate: Option<&Path>) {
    let fields = json!({ "url": url });
    let result = match certificate {
        Some(path) => {
            sender
                .call_with_file(Some(&bot.token), "setWebhook", fields, "certificate", path)
                .await
        }
        None => sender.call(Some(&bot.token), "setWebhook", fields).await,
    };

    match result {
        Ok(_) => info!("Webhook registered for bot {}", bot.slug),
        Err(e) => {
            error!(
                "There was an error setting the webhook automatically for bot {}: {}",
                bot.slug, e
            );
        }
    }
}

#[derive(Clone)]
struct GateInner {
    bots: BotRegistry,
    bot_name_param: String,
    bot_auth: AuthCarrier,
    auth: Option<AuthRule>,
    url: Option<String>,
    certificate: Option<PathBuf>,
    sender: Sender,
}

/// Multi-bot webhook gate: resolves the bot named in the path, checks its
/// secret and the update shape, then hands a [`RequestContext`] to the
/// caller's handler.
#[derive(Clone)]
pub struct WebhookGate {
    inner: Arc<GateInner>,
}

impl WebhookGate {
    pub fn from_config(config: &Config, sender: Sender) -> Result<Self, ConfigError> {
        let bots = BotRegistry::from_entries(&config.bots)?;
        if bots.is_empty() {
            warn!("Webhook gate built with no bots; every request will be rejected");
        }

        Ok(Self {
            inner: Arc::new(GateInner {
                bots,
                bot_name_param: config.bot_name_param.clone(),
                bot_auth: AuthCarrier::new(config.bot_auth_carrier, config.bot_auth_param.clone()),
                auth: top_level_auth(config)?,
                url: config.webhook_url().map(str::to_string),
                certificate: config.webhook_certificate().map(Path::to_path_buf),
                sender,
            }),
        })
    }

    /// Build the gate and, when a public URL is configured, register every
    /// bot's webhook. Registration failures are logged, never returned.
    pub async fn setup(config: &Config, sender: Sender) -> Result<Self, ConfigError> {
        let gate = Self::from_config(config, sender)?;
        gate.register_webhooks().await;
        Ok(gate)
    }

    /// Replace the top-level auth rule, e.g. with a predicate.
    pub fn with_auth(mut self, rule: AuthRule) -> Self {
        Arc::make_mut(&mut self.inner).auth = Some(rule);
        self
    }

    pub fn bots(&self) -> &BotRegistry {
        &self.inner.bots
    }

    /// The public URL Telegram should call for `bot`.
    pub fn webhook_url_for(&self, bot: &BotConfig) -> Option<String> {
        let base = self.inner.url.as_deref()?;
        let (mut segments, mut query) = auth_url_parts(self.inner.auth.as_ref());
        segments.push(bot.slug.as_str());
        if let Some(secret) = &bot.auth {
            match &self.inner.bot_auth {
                AuthCarrier::Param(_) => segments.push(secret.as_str()),
                AuthCarrier::Query(name) => query.push((name.as_str(), secret.as_str())),
            }
        }
        webhook_url(base, &segments, &query)
    }

    pub async fn register_webhooks(&self) {
        if self.inner.url.is_none() {
            return;
        }

        let calls = self.inner.bots.iter().map(|bot| async move {
            match self.webhook_url_for(bot) {
                Some(url) => {
                    let certificate = self.inner.certificate.as_deref();
                    set_webhook(&self.inner.sender, bot, &url, certificate).await
                }
                None => error!(
                    "There was an error setting the webhook automatically for bot {}: invalid url",
                    bot.slug
                ),
            }
        });
        join_all(calls).await;
    }

    /// Run the per-request checks, first failure wins: bot name, body, bot
    /// lookup, bot secret, update shape.
    pub fn validate(
        &self,
        params: &RequestParams,
        body: Option<&Value>,
    ) -> Result<RequestContext, WebhookError> {
        let inner = &self.inner;

        let slug = params
            .path
            .get(&inner.bot_name_param)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| WebhookError::MissingBotName(inner.bot_name_param.clone()))?;

        let body = body.ok_or(WebhookError::MissingBody)?;

        let bot = inner
            .bots
            .get(slug)
            .ok_or_else(|| WebhookError::UnknownBot(slug.clone()))?;

        if let Some(secret) = &bot.auth {
            inner.bot_auth.check(params, secret)?;
        }

        let update = IncomingUpdate::from_value(body)?;
        Ok(RequestContext::new(bot.clone(), update, inner.sender.clone()))
    }

    fn route_paths(&self) -> Vec<String> {
        let prefix = auth_route_prefix(self.inner.auth.as_ref());
        let base = format!("{}/{}", prefix, capture(&self.inner.bot_name_param));
        match &self.inner.bot_auth {
            AuthCarrier::Param(name) => vec![base.clone(), format!("{}/{}", base, capture(name))],
            AuthCarrier::Query(_) => vec![base],
        }
    }

    /// Router serving the webhook: body parser, optional auth step, gate,
    /// then `handler`, which can extract [`RequestContext`].
    ///
    /// The body parser runs before the gate, so a body that is not JSON is
    /// answered with 400 even when the bot name is unknown.
    pub fn router<H, T>(self, handler: H) -> Router
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let mut router = Router::new();
        for path in self.route_paths() {
            debug!("Mounting webhook route POST {}", path);
            router = router.route(&path, post(handler.clone()));
        }

        let auth = self.inner.auth.clone();
        router = router.route_layer(middleware::from_fn_with_state(self, gate_step));
        if let Some(rule) = auth {
            router =
                router.route_layer(middleware::from_fn_with_state(Arc::new(rule), require_auth));
        }
        router.route_layer(middleware::from_fn(parse_json_body))
    }
}

async fn gate_step(
    State(gate): State<WebhookGate>,
    request: Request,
    next: Next,
) -> Result<Response, WebhookError> {
    let (mut parts, body) = request.into_parts();
    let params = RequestParams::from_parts(&mut parts).await;
    let mut request = Request::from_parts(parts, body);

    let context = gate.validate(&params, parsed_body(&request))?;
    debug!(
        "Update {} for bot {} passed the gate",
        context.update_id(),
        context.bot().slug
    );

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

struct SingleInner {
    bot: Arc<BotConfig>,
    auth: Option<AuthRule>,
    url: Option<String>,
    certificate: Option<PathBuf>,
    handler: IncomingHandler,
    sender: Sender,
}

/// Single-bot webhook gate: one implicit bot, the message goes straight to
/// an [`IncomingHandler`] and its reply becomes the HTTP response.
#[derive(Clone)]
pub struct SingleBotGate {
    inner: Arc<SingleInner>,
}

impl SingleBotGate {
    pub fn from_config(
        config: &Config,
        sender: Sender,
        handler: Option<IncomingHandler>,
    ) -> Result<Self, ConfigError> {
        let token = config
            .token
            .as_deref()
            .or(sender.settings().default_token())
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?
            .to_string();

        let handler = handler.unwrap_or_else(|| {
            warn!("Missing incoming handler - using a default logger instead");
            IncomingHandler::log_messages()
        });

        Ok(Self {
            inner: Arc::new(SingleInner {
                bot: Arc::new(BotConfig::new("default", token)),
                auth: top_level_auth(config)?,
                url: config.webhook_url().map(str::to_string),
                certificate: config.webhook_certificate().map(Path::to_path_buf),
                handler,
                sender,
            }),
        })
    }

    /// Build the gate and register its webhook if a URL is configured.
    pub async fn setup(
        config: &Config,
        sender: Sender,
        handler: Option<IncomingHandler>,
    ) -> Result<Self, ConfigError> {
        let gate = Self::from_config(config, sender, handler)?;
        gate.register_webhook().await;
        Ok(gate)
    }

    pub fn with_auth(self, rule: AuthRule) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(SingleInner {
                bot: inner.bot.clone(),
                auth: Some(rule),
                url: inner.url.clone(),
                certificate: inner.certificate.clone(),
                handler: inner.handler.clone(),
                sender: inner.sender.clone(),
            }),
        }
    }

    pub fn webhook_url(&self) -> Option<String> {
        let base = self.inner.url.as_deref()?;
        let (segments, query) = auth_url_parts(self.inner.auth.as_ref());
        webhook_url(base, &segments, &query)
    }

    pub async fn register_webhook(&self) {
        if self.inner.url.is_none() {
            return;
        }
        match self.webhook_url() {
            Some(url) => {
                let certificate = self.inner.certificate.as_deref();
                set_webhook(&self.inner.sender, &self.inner.bot, &url, certificate).await
            }
            None => error!("There was an error setting the webhook automatically: invalid url"),
        }
    }

    /// Validate the body and run the handler. A reply is answered with 200
    /// JSON, no reply with an empty 204.
    pub async fn handle(&self, body: Option<&Value>) -> Result<Response, WebhookError> {
        let body = body.ok_or(WebhookError::MissingBody)?;
        let update = IncomingUpdate::from_value(body)?;
        debug!("Update {} received", update.update_id);

        match self.inner.handler.dispatch(update.message).await? {
            Some(reply) => Ok((StatusCode::OK, Json(reply)).into_response()),
            None => Ok(StatusCode::NO_CONTENT.into_response()),
        }
    }

    pub fn router(self) -> Router {
        let path = match auth_route_prefix(self.inner.auth.as_ref()) {
            prefix if prefix.is_empty() => "/".to_string(),
            prefix => prefix,
        };
        let auth = self.inner.auth.clone();

        let mut router = Router::new().route(&path, post(single_bot_step));
        if let Some(rule) = auth {
            router =
                router.route_layer(middleware::from_fn_with_state(Arc::new(rule), require_auth));
        }
        router
            .route_layer(middleware::from_fn(parse_json_body))
            .with_state(self)
    }
}

async fn single_bot_step(
    State(gate): State<SingleBotGate>,
    request: Request,
) -> Result<Response, WebhookError> {
    gate.handle(parsed_body(&request)).await
}
