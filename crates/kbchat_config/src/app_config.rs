use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use derive_setters::Setters;
use kbchat_domain::{DEFAULT_SYSTEM_PROMPT, ModelId, Preset, Treatment};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{Error, Result};

/// Prefix of environment variables overriding the configuration, e.g.
/// `KBCHAT__PROVIDER__BASE_URL`.
pub const ENV_PREFIX: &str = "KBCHAT";

/// Fallback environment variable holding the completion API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Setters, PartialEq)]
#[setters(into)]
#[serde(default)]
pub struct AppConfig {
    /// Model used for every completion request
    pub model: String,

    /// Sampling temperature; 0 keeps the answers deterministic
    pub temperature: f32,

    /// Upper bound on generated tokens per request
    pub max_completion_tokens: u32,

    pub provider: ProviderConfig,
    pub lookup: LookupConfig,
    pub treatment: TreatmentConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini-2025-04-14".to_string(),
            temperature: 0.0,
            max_completion_tokens: 525,
            provider: ProviderConfig::default(),
            lookup: LookupConfig::default(),
            treatment: TreatmentConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Setters, PartialEq)]
#[setters(into, strip_option)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of an OpenAI compatible API, `chat/completions` is appended
    pub base_url: String,

    pub api_key: Option<String>,

    /// File holding the API key, read when `api_key` is not set
    pub api_key_file: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1/".to_string(),
            api_key: None,
            api_key_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Setters, PartialEq)]
#[setters(into)]
#[serde(default)]
pub struct LookupConfig {
    /// DBpedia Lookup keyword search endpoint
    pub search_url: String,

    /// SPARQL endpoint used for abstracts and properties
    pub sparql_url: String,

    /// Timeout applied to each outbound lookup request
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            search_url: "https://lookup.dbpedia.org/api/search/KeywordSearch".to_string(),
            sparql_url: "https://dbpedia.org/sparql".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Setters, PartialEq)]
#[setters(into, strip_option)]
#[serde(default)]
pub struct TreatmentConfig {
    pub preset: Preset,
    pub system_prompt: Option<String>,
    pub system_prompt_file: Option<PathBuf>,

    /// Overrides the preset's history behaviour
    pub use_history: Option<bool>,

    /// Overrides the preset's tool behaviour
    pub tool_enabled: Option<bool>,
}

impl AppConfig {
    /// Loads defaults, then the optional TOML file, then `KBCHAT__*`
    /// environment variables. A `.env` file in the working directory is
    /// honoured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Ok(dotenv) = dotenvy::dotenv() {
            debug!(path = %dotenv.display(), "Loaded environment file");
        }

        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Reading configuration file");
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn model_id(&self) -> ModelId {
        ModelId::new(self.model.clone())
    }
}

impl ProviderConfig {
    pub fn endpoint(&self) -> Result<Url> {
        parse_url("provider.base_url", &self.base_url)
    }

    /// Resolves the API key from the configuration, the key file or
    /// `OPENAI_API_KEY`, in that order.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(&self, env_key: Option<String>) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|key| !key.trim().is_empty()) {
            return Ok(key.trim().to_string());
        }
        if let Some(path) = &self.api_key_file {
            let key = read_file(path)?;
            return Ok(key.trim().to_string());
        }
        env_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::MissingApiKey)
    }
}

impl LookupConfig {
    pub fn search_endpoint(&self) -> Result<Url> {
        parse_url("lookup.search_url", &self.search_url)
    }

    pub fn sparql_endpoint(&self) -> Result<Url> {
        parse_url("lookup.sparql_url", &self.sparql_url)
    }
}

impl TreatmentConfig {
    /// Builds the treatment, reading the system prompt from disk when it is
    /// configured as a file. Only the plain preset may omit a prompt.
    pub fn resolve(&self) -> Result<Treatment> {
        let system_prompt = match (&self.system_prompt, &self.system_prompt_file) {
            (Some(prompt), _) => prompt.clone(),
            (None, Some(path)) => read_file(path)?,
            (None, None) if self.preset == Preset::Plain => DEFAULT_SYSTEM_PROMPT.to_string(),
            (None, None) => {
                return Err(kbchat_domain::Error::MissingSystemPrompt(
                    self.preset.as_str().to_string(),
                )
                .into());
            }
        };

        let mut treatment = Treatment::from_preset(self.preset, system_prompt);
        if let Some(use_history) = self.use_history {
            treatment.use_history = use_history;
        }
        if let Some(tool_enabled) = self.tool_enabled {
            treatment.tool_enabled = tool_enabled;
        }
        Ok(treatment)
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|source| Error::Url { field, source })
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })
}
