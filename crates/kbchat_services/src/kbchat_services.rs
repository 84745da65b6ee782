use std::time::Duration;

use anyhow::Context as _;
use kbchat_app::Services;
use kbchat_config::AppConfig;
use reqwest::Client;

use crate::{DbpediaLookup, InMemorySessionStore, OpenAIProvider};

/// Production wiring of every service the orchestrator needs.
pub struct KbchatServices {
    provider: OpenAIProvider,
    lookup: DbpediaLookup,
    sessions: InMemorySessionStore,
}

impl KbchatServices {
    pub fn new(provider: OpenAIProvider, lookup: DbpediaLookup) -> Self {
        Self { provider, lookup, sessions: InMemorySessionStore::default() }
    }

    /// Builds the HTTP clients and endpoints described by `config`.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let api_key = config.provider.resolve_api_key()?;
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        let provider = OpenAIProvider::new(client.clone(), config.provider.endpoint()?, api_key);
        let lookup = DbpediaLookup::new(
            client,
            config.lookup.search_endpoint()?,
            config.lookup.sparql_endpoint()?,
        )
        .timeout(Duration::from_secs(config.lookup.timeout_secs));

        Ok(Self::new(provider, lookup))
    }
}

impl Services for KbchatServices {
    type CompletionService = OpenAIProvider;
    type EntityLookupService = DbpediaLookup;
    type SessionStore = InMemorySessionStore;

    fn completion_service(&self) -> &Self::CompletionService {
        &self.provider
    }

    fn lookup_service(&self) -> &Self::EntityLookupService {
        &self.lookup
    }

    fn session_store(&self) -> &Self::SessionStore {
        &self.sessions
    }
}
