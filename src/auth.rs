use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::config::{AuthSpec, CarrierKind};
use crate::error::{ConfigError, WebhookError};

/// Query parameter used when `auth` is given as a bare key.
pub const DEFAULT_AUTH_QUERY: &str = "auth";

/// The parts of an inbound request that auth checks and bot lookup read.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pub path: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
}

impl RequestParams {
    /// Collect path and query parameters. Parameters that fail to parse are
    /// treated as absent so the gate reports them with its own status codes.
    pub async fn from_parts(parts: &mut Parts) -> Self {
        let path = Path::<HashMap<String, String>>::from_request_parts(parts, &())
            .await
            .map(|Path(path)| path)
            .unwrap_or_default();
        let query = Query::<HashMap<String, String>>::from_request_parts(parts, &())
            .await
            .map(|Query(query)| query)
            .unwrap_or_default();

        Self {
            path,
            query,
            headers: parts.headers.clone(),
        }
    }
}

/// Where a secret is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCarrier {
    Query(String),
    Param(String),
}

impl AuthCarrier {
    pub fn new(kind: CarrierKind, name: impl Into<String>) -> Self {
        match kind {
            CarrierKind::Query => AuthCarrier::Query(name.into()),
            CarrierKind::Param => AuthCarrier::Param(name.into()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuthCarrier::Query(_) => "query",
            AuthCarrier::Param(_) => "param",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AuthCarrier::Query(name) | AuthCarrier::Param(name) => name,
        }
    }

    /// The non-empty value this carrier holds on the request.
    pub fn extract<'a>(&self, params: &'a RequestParams) -> Option<&'a str> {
        let source = match self {
            AuthCarrier::Query(_) => &params.query,
            AuthCarrier::Param(_) => &params.path,
        };
        source
            .get(self.name())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Missing value is 401, a value that is not exactly `expected` is 403.
    pub fn check(&self, params: &RequestParams, expected: &str) -> Result<(), WebhookError> {
        match self.extract(params) {
            None => Err(WebhookError::MissingAuth {
                carrier: self.kind(),
                name: self.name().to_string(),
            }),
            Some(value) if value != expected => Err(WebhookError::InvalidAuth {
                carrier: self.kind(),
            }),
            Some(_) => Ok(()),
        }
    }
}

pub type AuthPredicate = Arc<dyn Fn(&RequestParams) -> bool + Send + Sync>;

/// Request-level authentication applied before the gate's core step.
#[derive(Clone)]
pub enum AuthRule {
    StaticKey { carrier: AuthCarrier, key: String },
    Predicate(AuthPredicate),
}

impl AuthRule {
    pub fn from_spec(spec: &AuthSpec) -> Result<Self, ConfigError> {
        match spec {
            AuthSpec::Key(key) => {
                if key.is_empty() {
                    return Err(ConfigError::MissingAuthKey);
                }
                Ok(AuthRule::StaticKey {
                    carrier: AuthCarrier::Query(DEFAULT_AUTH_QUERY.to_string()),
                    key: key.clone(),
                })
            }
            AuthSpec::Rule { key, query, param } => {
                let carrier = match (query, param) {
                    (Some(_), Some(_)) => return Err(ConfigError::ConflictingAuthCarrier),
                    (Some(query), None) => AuthCarrier::Query(query.clone()),
                    (None, Some(param)) => AuthCarrier::Param(param.clone()),
                    (None, None) => return Err(ConfigError::MissingAuthCarrier),
                };
                let key = key
                    .as_ref()
                    .filter(|k| !k.is_empty())
                    .ok_or(ConfigError::MissingAuthKey)?;
                Ok(AuthRule::StaticKey {
                    carrier,
                    key: key.clone(),
                })
            }
        }
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&RequestParams) -> bool + Send + Sync + 'static,
    {
        AuthRule::Predicate(Arc::new(f))
    }

    pub fn check(&self, params: &RequestParams) -> Result<(), WebhookError> {
        match self {
            AuthRule::StaticKey { carrier, key } => carrier.check(params, key),
            AuthRule::Predicate(predicate) => {
                if predicate(params) {
                    Ok(())
                } else {
                    Err(WebhookError::Rejected)
                }
            }
        }
    }
}

impl fmt::Debug for AuthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthRule::StaticKey { carrier, .. } => f
                .debug_struct("StaticKey")
                .field("carrier", carrier)
                .field("key", &"****")
                .finish(),
            AuthRule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Middleware running an [`AuthRule`] ahead of the webhook step.
///
/// ```ignore
/// Router::new()
///     .route("/{bot_name}", post(handler))
///     .route_layer(axum::middleware::from_fn_with_state(Arc::new(rule), require_auth))
/// ```
pub async fn require_auth(
    State(rule): State<Arc<AuthRule>>,
    request: Request,
    next: Next,
) -> Result<Response, WebhookError> {
    let (mut parts, body) = request.into_parts();
    let params = RequestParams::from_parts(&mut parts).await;

    rule.check(&params)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}
