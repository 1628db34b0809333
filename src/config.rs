use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::sender::{Settings, SettingsOptions};

/// Where a shared secret travels on an inbound webhook request.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CarrierKind {
    #[default]
    Query,
    Param,
}

impl std::fmt::Display for CarrierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CarrierKind::Query => write!(f, "query"),
            CarrierKind::Param => write!(f, "param"),
        }
    }
}

/// A bot entry under `[bots]`: either a bare token or a table.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum BotEntry {
    Token(String),
    Full {
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        auth: Option<String>,
    },
}

/// The `auth` setting: a bare key (sent as the `auth` query parameter) or a
/// table naming the key and exactly one carrier.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum AuthSpec {
    Key(String),
    Rule {
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        query: Option<String>,
        #[serde(default)]
        param: Option<String>,
    },
}

/// The `url` setting: a bare public URL, or a table adding a self-signed
/// certificate to upload with `setWebhook`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum WebhookTarget {
    Url(String),
    Full {
        url: String,
        #[serde(default)]
        certificate: Option<PathBuf>,
    },
}

impl WebhookTarget {
    pub fn url(&self) -> &str {
        match self {
            WebhookTarget::Url(url) | WebhookTarget::Full { url, .. } => url,
        }
    }

    pub fn certificate(&self) -> Option<&Path> {
        match self {
            WebhookTarget::Url(_) => None,
            WebhookTarget::Full { certificate, .. } => certificate.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Default token, used by the single-bot gate and whenever a send omits one.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub bots: BTreeMap<String, BotEntry>,
    #[serde(default = "default_bot_name_param")]
    pub bot_name_param: String,
    #[serde(default = "default_bot_auth_param")]
    pub bot_auth_param: String,
    #[serde(default)]
    pub bot_auth_carrier: CarrierKind,
    /// Public base URL; when set, webhooks are registered at setup.
    #[serde(default)]
    pub url: Option<WebhookTarget>,
    #[serde(default)]
    pub auth: Option<AuthSpec>,
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub api_base: String,
}

fn default_bot_name_param() -> String {
    "bot_name".to_string()
}

fn default_bot_auth_param() -> String {
    "bot_auth".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            bots: BTreeMap::new(),
            bot_name_param: default_bot_name_param(),
            bot_auth_param: default_bot_auth_param(),
            bot_auth_carrier: CarrierKind::default(),
            url: None,
            auth: None,
            listen: default_listen(),
            api_base: String::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// The configured public URL, if any and non-empty.
    pub fn webhook_url(&self) -> Option<&str> {
        self.url
            .as_ref()
            .map(WebhookTarget::url)
            .filter(|url| !url.is_empty())
    }

    pub fn webhook_certificate(&self) -> Option<&Path> {
        self.url.as_ref().and_then(WebhookTarget::certificate)
    }

    /// Whether the multi-bot gate should be used.
    pub fn is_multi_bot(&self) -> bool {
        !self.bots.is_empty()
    }

    /// Sender settings derived from this config. Built once at startup.
    pub fn settings(&self) -> Settings {
        Settings::configure(SettingsOptions {
            token: self.token.clone(),
            api_base: (!self.api_base.is_empty()).then(|| self.api_base.clone()),
        })
    }
}
