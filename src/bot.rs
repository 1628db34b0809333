use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::config::BotEntry;
use crate::error::ConfigError;
use crate::sender::mask_token;

/// One registered bot. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub slug: String,
    pub token: String,
    /// Display name, defaults to the slug.
    pub name: String,
    /// Shared secret the webhook request must carry, if any.
    pub auth: Option<String>,
}

impl BotConfig {
    pub fn new(slug: impl Into<String>, token: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            name: slug.clone(),
            slug,
            token: token.into(),
            auth: None,
        }
    }

    pub fn from_entry(slug: &str, entry: &BotEntry) -> Result<Self, ConfigError> {
        let (token, name, auth) = match entry {
            BotEntry::Token(token) => (Some(token), None, None),
            BotEntry::Full { token, name, auth } => {
                (token.as_ref(), name.as_ref(), auth.as_ref())
            }
        };

        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingBotToken(slug.to_string()))?;

        Ok(Self {
            slug: slug.to_string(),
            token: token.clone(),
            name: name
                .filter(|n| !n.is_empty())
                .cloned()
                .unwrap_or_else(|| slug.to_string()),
            auth: auth.filter(|a| !a.is_empty()).cloned(),
        })
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("slug", &self.slug)
            .field("token", &mask_token(&self.token))
            .field("name", &self.name)
            .field("auth", &self.auth.as_ref().map(|_| "****"))
            .finish()
    }
}

/// Registry of bots by slug. Filled at setup, read-only while serving.
#[derive(Debug, Clone, Default)]
pub struct BotRegistry {
    bots: HashMap<String, Arc<BotConfig>>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &BTreeMap<String, BotEntry>) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for (slug, entry) in entries {
            registry.register(BotConfig::from_entry(slug, entry)?);
        }
        Ok(registry)
    }

    pub fn register(&mut self, bot: BotConfig) {
        info!(
            "Registered bot: {} ({}){}",
            bot.slug,
            bot.name,
            if bot.auth.is_some() { " with auth" } else { "" }
        );
        self.bots.insert(bot.slug.clone(), Arc::new(bot));
    }

    pub fn get(&self, slug: &str) -> Option<&Arc<BotConfig>> {
        self.bots.get(slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BotConfig>> {
        self.bots.values()
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }
}
